//! Slice implementation for reading cell data
//!
//! A slice is a read cursor over a cell: its bits are consumed through the
//! [`BitBuffer`] read operations and its references one at a time.

use crate::tvm::address::Address;
use crate::tvm::bits::BitBuffer;
use crate::tvm::cell::Cell;
use crate::tvm::error::{Result, TvmError};
use num_bigint::{BigInt, BigUint};
use std::sync::Arc;

/// A slice for reading data from a cell
#[derive(Debug, Clone)]
pub struct Slice {
    cell: Arc<Cell>,
    bits: BitBuffer,
    ref_pos: usize,
}

impl From<Arc<Cell>> for Slice {
    fn from(cell: Arc<Cell>) -> Self {
        Self::new(cell)
    }
}

impl Slice {
    /// Creates a slice positioned at the start of `cell`
    pub fn new(cell: Arc<Cell>) -> Self {
        let bits = cell.bits().clone();
        Self {
            cell,
            bits,
            ref_pos: 0,
        }
    }

    pub fn remaining_bits(&self) -> usize {
        self.bits.remaining()
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.reference_count() - self.ref_pos
    }

    /// True when no bits and no references are left
    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    pub fn bit_position(&self) -> usize {
        self.bits.read_position()
    }

    pub fn ref_position(&self) -> usize {
        self.ref_pos
    }

    pub fn load_bit(&mut self) -> Result<bool> {
        self.bits.read_bit()
    }

    /// Loads `n` bits as MSB-first bytes
    pub fn load_bits(&mut self, n: usize) -> Result<Vec<u8>> {
        self.bits.read_bits(n)
    }

    pub fn load_u8(&mut self) -> Result<u8> {
        self.bits.read_u8()
    }

    pub fn load_u32(&mut self) -> Result<u32> {
        Ok(self.bits.read_uint(32)? as u32)
    }

    pub fn load_u64(&mut self) -> Result<u64> {
        Ok(self.bits.read_uint(64)? as u64)
    }

    pub fn load_uint(&mut self, bits: usize) -> Result<u128> {
        self.bits.read_uint(bits)
    }

    pub fn load_int(&mut self, bits: usize) -> Result<i128> {
        self.bits.read_int(bits)
    }

    pub fn load_big_uint(&mut self, bits: usize) -> Result<BigUint> {
        self.bits.read_big_uint(bits)
    }

    pub fn load_big_int(&mut self, bits: usize) -> Result<BigInt> {
        self.bits.read_big_int(bits)
    }

    pub fn load_coins(&mut self) -> Result<u128> {
        self.bits.read_coins()
    }

    pub fn load_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.bits.read_bytes(n)
    }

    pub fn load_string(&mut self, n: usize) -> Result<String> {
        self.bits.read_string(n)
    }

    pub fn load_address(&mut self) -> Result<Option<Address>> {
        self.bits.read_address()
    }

    /// Loads the next reference
    pub fn load_reference(&mut self) -> Result<Arc<Cell>> {
        let cell = self
            .cell
            .reference(self.ref_pos)
            .cloned()
            .ok_or(TvmError::BufferUnderrun {
                requested: 1,
                remaining: 0,
            })?;
        self.ref_pos += 1;
        Ok(cell)
    }

    /// Loads a `Maybe ^Cell`
    pub fn load_maybe_ref(&mut self) -> Result<Option<Arc<Cell>>> {
        let start = self.bits.clone();
        if !self.load_bit()? {
            return Ok(None);
        }
        match self.load_reference() {
            Ok(cell) => Ok(Some(cell)),
            Err(e) => {
                self.bits = start;
                Err(e)
            }
        }
    }

    /// Returns the reference at `index` without moving the cursor
    pub fn preload_reference(&self, index: usize) -> Result<Arc<Cell>> {
        self.cell.reference(index).cloned().ok_or_else(|| {
            TvmError::out_of_range(format!(
                "reference {} requested, cell has {}",
                index,
                self.cell.reference_count()
            ))
        })
    }

    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        self.bits.read_bits(n).map(|_| ())
    }

    pub fn skip_refs(&mut self, n: usize) -> Result<()> {
        if n > self.remaining_refs() {
            return Err(TvmError::BufferUnderrun {
                requested: n,
                remaining: self.remaining_refs(),
            });
        }
        self.ref_pos += n;
        Ok(())
    }

    /// Takes all references that have not been loaded yet
    pub fn load_remaining_refs(&mut self) -> Vec<Arc<Cell>> {
        let refs = self.cell.references()[self.ref_pos..].to_vec();
        self.ref_pos = self.cell.reference_count();
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::CellBuilder;

    #[test]
    fn test_slice_reads_builder_output() {
        let address = Address::new(0, [7u8; 32]).unwrap();
        let child = Arc::new(Cell::default());

        let mut builder = CellBuilder::new();
        builder
            .store_u32(0x5fcc3d14)
            .unwrap()
            .store_int(-5, 16)
            .unwrap()
            .store_coins(1_000)
            .unwrap()
            .store_address(Some(&address))
            .unwrap()
            .store_maybe_ref(Some(child.clone()))
            .unwrap();
        let cell = builder.build().unwrap();

        let mut slice = Slice::new(cell);
        assert_eq!(slice.load_u32().unwrap(), 0x5fcc3d14);
        assert_eq!(slice.load_int(16).unwrap(), -5);
        assert_eq!(slice.load_coins().unwrap(), 1_000);
        assert_eq!(slice.load_address().unwrap(), Some(address));
        assert_eq!(slice.load_maybe_ref().unwrap().unwrap().hash(), child.hash());
        assert!(slice.is_empty());
    }

    #[test]
    fn test_reference_underrun() {
        let mut slice = Slice::new(Arc::new(Cell::default()));
        assert!(matches!(
            slice.load_reference(),
            Err(TvmError::BufferUnderrun { .. })
        ));
        assert!(slice.preload_reference(0).is_err());
        assert!(slice.skip_refs(1).is_err());
    }

    #[test]
    fn test_maybe_ref_without_reference_is_atomic() {
        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap();
        let mut slice = Slice::new(builder.build().unwrap());

        assert!(slice.load_maybe_ref().is_err());
        assert_eq!(slice.bit_position(), 0);
    }

    #[test]
    fn test_skip_and_positions() {
        let mut builder = CellBuilder::new();
        builder.store_u64(u64::MAX).unwrap();
        builder.store_reference(Arc::new(Cell::default())).unwrap();
        let mut slice: Slice = builder.build().unwrap().into();

        slice.skip_bits(60).unwrap();
        assert_eq!(slice.bit_position(), 60);
        assert_eq!(slice.load_uint(4).unwrap(), 0xF);
        assert!(slice.skip_bits(1).is_err());

        assert_eq!(slice.remaining_refs(), 1);
        assert_eq!(slice.load_remaining_refs().len(), 1);
        assert_eq!(slice.ref_position(), 1);
    }
}
