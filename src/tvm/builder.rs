//! Cell builder
//!
//! [`CellBuilder`] is the mutable phase of a cell: data is appended to a
//! [`BitBuffer`] and references are collected until [`CellBuilder::build`]
//! seals everything into an immutable, shareable [`Cell`].

use crate::tvm::address::Address;
use crate::tvm::bits::BitBuffer;
use crate::tvm::cell::{Cell, CellKind, MAX_CELL_REFS};
use crate::tvm::error::{Result, TvmError};
use crate::tvm::slice::Slice;
use num_bigint::{BigInt, BigUint};
use std::sync::Arc;

/// Builder for creating cells
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    bits: BitBuffer,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Creates a new empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current bit length
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Returns the number of bits that can still be stored
    pub fn available_bits(&self) -> usize {
        self.bits.available()
    }

    /// Returns the number of whole bytes that can still be stored
    pub fn available_bytes(&self) -> usize {
        self.bits.available() / 8
    }

    pub fn ref_count(&self) -> usize {
        self.references.len()
    }

    pub fn available_refs(&self) -> usize {
        MAX_CELL_REFS - self.references.len()
    }

    /// Read access to the underlying bit buffer
    pub fn bits(&self) -> &BitBuffer {
        &self.bits
    }

    /// Direct access to the full [`BitBuffer`] write surface
    pub fn bits_mut(&mut self) -> &mut BitBuffer {
        &mut self.bits
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.bits.write_bit(bit)?;
        Ok(self)
    }

    /// Stores the first `bit_len` bits of `bits`
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> Result<&mut Self> {
        self.bits.write_bits(bits, bit_len)?;
        Ok(self)
    }

    pub fn store_u8(&mut self, value: u8) -> Result<&mut Self> {
        self.store_uint(value as u128, 8)
    }

    pub fn store_u32(&mut self, value: u32) -> Result<&mut Self> {
        self.store_uint(value as u128, 32)
    }

    pub fn store_u64(&mut self, value: u64) -> Result<&mut Self> {
        self.store_uint(value as u128, 64)
    }

    /// Stores an unsigned integer with the specified number of bits
    pub fn store_uint(&mut self, value: u128, bits: usize) -> Result<&mut Self> {
        self.bits.write_uint(value, bits)?;
        Ok(self)
    }

    /// Stores a signed integer with the specified number of bits
    pub fn store_int(&mut self, value: i128, bits: usize) -> Result<&mut Self> {
        self.bits.write_int(value, bits)?;
        Ok(self)
    }

    pub fn store_big_uint(&mut self, value: &BigUint, bits: usize) -> Result<&mut Self> {
        self.bits.write_big_uint(value, bits)?;
        Ok(self)
    }

    pub fn store_big_int(&mut self, value: &BigInt, bits: usize) -> Result<&mut Self> {
        self.bits.write_big_int(value, bits)?;
        Ok(self)
    }

    /// Stores a coins amount (4-bit length prefix + up to 15 bytes)
    pub fn store_coins(&mut self, amount: u128) -> Result<&mut Self> {
        self.bits.write_coins(amount)?;
        Ok(self)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.bits.write_bytes(bytes)?;
        Ok(self)
    }

    /// Stores string bytes inline; fails if they do not fit
    pub fn store_string(&mut self, s: &str) -> Result<&mut Self> {
        self.bits.write_string(s)?;
        Ok(self)
    }

    /// Stores an internal address, or the null address for `None`
    pub fn store_address(&mut self, address: Option<&Address>) -> Result<&mut Self> {
        self.bits.write_address(address)?;
        Ok(self)
    }

    pub fn store_reference(&mut self, cell: Arc<Cell>) -> Result<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(TvmError::TooManyReferences { max: MAX_CELL_REFS });
        }
        self.references.push(cell);
        Ok(self)
    }

    /// Stores a `Maybe ^Cell`: a presence bit and, if present, the reference
    pub fn store_maybe_ref(&mut self, cell: Option<Arc<Cell>>) -> Result<&mut Self> {
        match cell {
            Some(cell) => {
                if self.references.len() >= MAX_CELL_REFS {
                    return Err(TvmError::TooManyReferences { max: MAX_CELL_REFS });
                }
                self.store_bit(true)?;
                self.store_reference(cell)
            }
            None => self.store_bit(false),
        }
    }

    /// Appends all bits and references of `cell`
    pub fn store_cell(&mut self, cell: &Cell) -> Result<&mut Self> {
        if cell.reference_count() > self.available_refs() {
            return Err(TvmError::TooManyReferences { max: MAX_CELL_REFS });
        }
        self.bits.write_buffer(cell.bits())?;
        self.references.extend(cell.references().iter().cloned());
        Ok(self)
    }

    /// Appends the unread bits and references of `slice`
    pub fn store_slice(&mut self, slice: &Slice) -> Result<&mut Self> {
        let mut rest = slice.clone();
        if rest.remaining_refs() > self.available_refs() {
            return Err(TvmError::TooManyReferences { max: MAX_CELL_REFS });
        }
        let bit_len = rest.remaining_bits();
        let bits = rest.load_bits(bit_len)?;
        self.store_bits(&bits, bit_len)?;
        self.references.extend(rest.load_remaining_refs());
        Ok(self)
    }

    /// Stores bytes as a snake: what fits goes into this cell, the rest into a
    /// chain of child cells linked through their first reference
    pub fn store_snake_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        let available = self.available_bytes();
        if bytes.len() <= available {
            return self.store_bytes(bytes);
        }
        if self.available_refs() == 0 {
            return Err(TvmError::TooManyReferences { max: MAX_CELL_REFS });
        }

        let (head, tail) = bytes.split_at(available);
        let chunk_len = BitBuffer::new().available() / 8;

        // Build the chain from its last link so no recursion is needed
        let mut next: Option<Arc<Cell>> = None;
        for chunk in tail.chunks(chunk_len).rev() {
            let mut builder = CellBuilder::new();
            builder.store_bytes(chunk)?;
            if let Some(cell) = next.take() {
                builder.store_reference(cell)?;
            }
            next = Some(builder.build()?);
        }

        self.store_bytes(head)?;
        if let Some(cell) = next {
            self.store_reference(cell)?;
        }
        Ok(self)
    }

    pub fn store_snake_string(&mut self, s: &str) -> Result<&mut Self> {
        self.store_snake_bytes(s.as_bytes())
    }

    /// Seals the builder into an immutable cell
    pub fn build(self) -> Result<Arc<Cell>> {
        Ok(Arc::new(Cell::from_bits(
            self.bits,
            self.references,
            CellKind::Ordinary,
            0,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::MAX_CELL_BITS;

    #[test]
    fn test_builder_basic() {
        let mut builder = CellBuilder::new();
        builder.store_u8(0xFF).unwrap().store_u32(0x12345678).unwrap();
        let cell = builder.build().unwrap();

        assert_eq!(cell.bit_len(), 40);
        assert_eq!(cell.data(), &[0xFF, 0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_builder_matches_direct_cell() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0x0F, 32).unwrap();
        let built = builder.build().unwrap();

        let direct = Cell::with_data(vec![0, 0, 0, 0x0F], 32).unwrap();
        assert_eq!(built.hash(), direct.hash());
    }

    #[test]
    fn test_fifth_reference_rejected() {
        let child = Arc::new(Cell::default());
        let mut builder = CellBuilder::new();
        for _ in 0..4 {
            builder.store_reference(child.clone()).unwrap();
        }
        assert_eq!(
            builder.store_reference(child.clone()).unwrap_err(),
            TvmError::TooManyReferences { max: 4 }
        );
        assert_eq!(builder.ref_count(), 4);

        // the presence bit is not written when the reference cannot be stored
        assert!(builder.store_maybe_ref(Some(child)).is_err());
        assert_eq!(builder.bit_len(), 0);
    }

    #[test]
    fn test_maybe_ref() {
        let child = Arc::new(Cell::default());
        let mut builder = CellBuilder::new();
        builder.store_maybe_ref(None).unwrap();
        builder.store_maybe_ref(Some(child)).unwrap();
        let cell = builder.build().unwrap();

        assert_eq!(cell.bit_len(), 2);
        assert_eq!(cell.data(), &[0b0100_0000]);
        assert_eq!(cell.reference_count(), 1);
    }

    #[test]
    fn test_bits_mut_passthrough() {
        let mut builder = CellBuilder::new();
        builder.bits_mut().write_coins(5).unwrap();
        assert_eq!(builder.bit_len(), 12);
        assert_eq!(builder.available_bits(), MAX_CELL_BITS - 12);
    }

    #[test]
    fn test_store_cell_and_slice() {
        let mut inner = CellBuilder::new();
        inner.store_uint(0b101, 3).unwrap();
        inner.store_reference(Arc::new(Cell::default())).unwrap();
        let inner = inner.build().unwrap();

        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap();
        builder.store_cell(&inner).unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 4);
        assert_eq!(cell.data(), &[0b1101_0000]);
        assert_eq!(cell.reference_count(), 1);

        let mut slice = Slice::new(cell);
        slice.skip_bits(2).unwrap();
        let mut copy = CellBuilder::new();
        copy.store_slice(&slice).unwrap();
        let copy = copy.build().unwrap();
        assert_eq!(copy.bit_len(), 2);
        assert_eq!(copy.data(), &[0b0100_0000]);
        assert_eq!(copy.reference_count(), 1);
    }

    #[test]
    fn test_snake_bytes() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(300).collect();
        let mut builder = CellBuilder::new();
        builder.store_u32(0).unwrap();
        builder.store_snake_bytes(&payload).unwrap();
        let root = builder.build().unwrap();

        // 123 bytes after the 32-bit prefix, then 127 and 50
        assert_eq!(root.bit_len(), 32 + 123 * 8);
        let second = root.reference(0).unwrap();
        assert_eq!(second.bit_len(), 127 * 8);
        let third = second.reference(0).unwrap();
        assert_eq!(third.bit_len(), 50 * 8);
        assert_eq!(third.reference_count(), 0);

        let mut collected = root.data()[4..].to_vec();
        collected.extend_from_slice(second.data());
        collected.extend_from_slice(third.data());
        assert_eq!(collected, payload);
    }

    #[test]
    fn test_snake_string_fits_inline() {
        let mut builder = CellBuilder::new();
        builder.store_snake_string("hello").unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.data(), b"hello");
        assert_eq!(cell.reference_count(), 0);
    }
}
