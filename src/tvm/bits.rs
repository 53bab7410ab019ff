//! Bit-addressed buffer
//!
//! [`BitBuffer`] is the payload of every cell. Bits are stored MSB-first, the
//! write cursor only moves forward and the read cursor is independent of it,
//! so a buffer can be filled and then consumed without copying.
//!
//! Every operation is all-or-nothing: range and capacity are validated before
//! the first bit is touched, and a failed read leaves the read cursor where it
//! was.

use crate::tvm::address::Address;
use crate::tvm::cell::MAX_CELL_BITS;
use crate::tvm::error::{Result, TvmError};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};
use std::fmt;

/// Largest byte length a coins amount may use (4-bit length prefix)
pub const MAX_COINS_BYTES: usize = 15;

/// Width of a serialized standard internal address
pub const ADDRESS_BITS: usize = 2 + 1 + 8 + 256;

/// Growable bit buffer with a capacity limit and a read cursor
#[derive(Debug, Clone)]
pub struct BitBuffer {
    /// Storage, always exactly `ceil(len / 8)` bytes with unused bits zeroed
    data: Vec<u8>,
    /// Number of written bits
    len: usize,
    /// Maximum number of bits that may be written
    capacity: usize,
    /// Position of the next bit to read
    read_pos: usize,
}

impl Default for BitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for BitBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.data == other.data
    }
}

impl Eq for BitBuffer {}

impl BitBuffer {
    /// Creates an empty buffer limited to one cell (1023 bits)
    pub fn new() -> Self {
        Self::with_capacity(MAX_CELL_BITS)
    }

    /// Creates an empty buffer with a custom capacity in bits
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity.div_ceil(8)),
            len: 0,
            capacity,
            read_pos: 0,
        }
    }

    /// Wraps `bit_len` bits of `data` for reading.
    ///
    /// Bits past `bit_len` are cleared, so any padding present in `data` is
    /// discarded.
    pub fn from_bytes(data: &[u8], bit_len: usize) -> Result<Self> {
        if data.len() * 8 < bit_len {
            return Err(TvmError::out_of_range(format!(
                "{} bytes cannot hold {} bits",
                data.len(),
                bit_len
            )));
        }

        let mut bytes = data[..bit_len.div_ceil(8)].to_vec();
        if bit_len % 8 != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= 0xFFu8 << (8 - bit_len % 8);
            }
        }

        Ok(Self {
            data: bytes,
            len: bit_len,
            capacity: bit_len.max(MAX_CELL_BITS),
            read_pos: 0,
        })
    }

    /// Number of written bits
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bits that can still be written
    pub fn available(&self) -> usize {
        self.capacity - self.len
    }

    /// Bits that can still be read
    pub fn remaining(&self) -> usize {
        self.len - self.read_pos
    }

    pub fn read_position(&self) -> usize {
        self.read_pos
    }

    /// Written bytes; a partial last byte has its unused bits zeroed
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns bit `n` (0 is the most significant bit of the first byte)
    pub fn get_bit(&self, n: usize) -> Result<bool> {
        if n >= self.len {
            return Err(TvmError::out_of_range(format!(
                "bit index {} is outside written length {}",
                n, self.len
            )));
        }
        Ok(self.bit_at(n))
    }

    /// Written bytes with the completion tag applied: when the length is not
    /// a multiple of 8, a single `1` bit follows the data and the rest of the
    /// last byte stays zero.
    pub fn padded_bytes(&self) -> Vec<u8> {
        let mut bytes = self.data.clone();
        if self.len % 8 != 0 {
            if let Some(last) = bytes.last_mut() {
                *last |= 0x80 >> (self.len % 8);
            }
        }
        bytes
    }

    /// Uppercase hex in the `_`-terminated notation used by fift for
    /// lengths that are not a multiple of 4
    pub fn to_hex(&self) -> String {
        if self.len % 4 == 0 {
            let mut hex = hex::encode_upper(&self.data);
            hex.truncate(self.len / 4);
            hex
        } else {
            let mut hex = hex::encode_upper(self.padded_bytes());
            hex.truncate(self.len.div_ceil(4));
            hex.push('_');
            hex
        }
    }

    fn bit_at(&self, n: usize) -> bool {
        self.data[n / 8] & (0x80 >> (n % 8)) != 0
    }

    fn ensure_available(&self, bits: usize) -> Result<()> {
        if bits > self.available() {
            return Err(TvmError::CapacityExceeded {
                requested: bits,
                available: self.available(),
            });
        }
        Ok(())
    }

    fn ensure_remaining(&self, bits: usize) -> Result<()> {
        if bits > self.remaining() {
            return Err(TvmError::BufferUnderrun {
                requested: bits,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Appends one bit; capacity must already be checked
    fn push_bit(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            self.data[self.len / 8] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    /// Takes one bit; remaining length must already be checked
    fn next_bit(&mut self) -> bool {
        let bit = self.bit_at(self.read_pos);
        self.read_pos += 1;
        bit
    }

    /// Runs a multi-step read, restoring the read cursor if it fails
    fn atomically<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.read_pos;
        let result = read(self);
        if result.is_err() {
            self.read_pos = start;
        }
        result
    }

    // ---------------------------------------------------------------------
    // Writing
    // ---------------------------------------------------------------------

    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.ensure_available(1)?;
        self.push_bit(bit);
        Ok(())
    }

    /// Appends the first `bit_len` bits of `bytes`, MSB-first
    pub fn write_bits(&mut self, bytes: &[u8], bit_len: usize) -> Result<()> {
        if bytes.len() * 8 < bit_len {
            return Err(TvmError::out_of_range(format!(
                "{} bytes cannot provide {} bits",
                bytes.len(),
                bit_len
            )));
        }
        self.ensure_available(bit_len)?;

        let full = bit_len / 8;
        if self.len % 8 == 0 {
            self.data.extend_from_slice(&bytes[..full]);
            self.len += full * 8;
        } else {
            for byte in &bytes[..full] {
                for shift in (0..8).rev() {
                    self.push_bit((byte >> shift) & 1 == 1);
                }
            }
        }
        for i in full * 8..bit_len {
            self.push_bit(bytes[i / 8] & (0x80 >> (i % 8)) != 0);
        }
        Ok(())
    }

    /// Appends `value` as a big-endian unsigned integer of `bits` width.
    ///
    /// Widths above 128 are zero-extended.
    pub fn write_uint(&mut self, value: u128, bits: usize) -> Result<()> {
        if bits < 128 && value >> bits != 0 {
            return Err(TvmError::out_of_range(format!(
                "{} does not fit in {} unsigned bits",
                value, bits
            )));
        }
        self.ensure_available(bits)?;

        for i in (0..bits).rev() {
            self.push_bit(i < 128 && (value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Appends `value` as a two's complement integer of `bits` width
    pub fn write_int(&mut self, value: i128, bits: usize) -> Result<()> {
        let fits = match bits {
            0 => value == 0,
            1..=127 => {
                let bound = 1i128 << (bits - 1);
                (-bound..bound).contains(&value)
            }
            _ => true,
        };
        if !fits {
            return Err(TvmError::out_of_range(format!(
                "{} does not fit in {} signed bits",
                value, bits
            )));
        }
        self.ensure_available(bits)?;

        for i in (0..bits).rev() {
            self.push_bit((value >> i.min(127)) & 1 == 1);
        }
        Ok(())
    }

    pub fn write_big_uint(&mut self, value: &BigUint, bits: usize) -> Result<()> {
        if value.bits() > bits as u64 {
            return Err(TvmError::out_of_range(format!(
                "{} does not fit in {} unsigned bits",
                value, bits
            )));
        }
        self.ensure_available(bits)?;

        for i in (0..bits).rev() {
            self.push_bit(value.bit(i as u64));
        }
        Ok(())
    }

    pub fn write_big_int(&mut self, value: &BigInt, bits: usize) -> Result<()> {
        let fits = if bits == 0 {
            value.is_zero()
        } else {
            let bound = BigInt::one() << (bits - 1);
            *value >= -bound.clone() && *value < bound
        };
        if !fits {
            return Err(TvmError::out_of_range(format!(
                "{} does not fit in {} signed bits",
                value, bits
            )));
        }

        let unsigned = if value.sign() == Sign::Minus {
            (BigInt::one() << bits) + value
        } else {
            value.clone()
        };
        let magnitude = unsigned.magnitude();
        self.write_big_uint(magnitude, bits)
    }

    /// Appends a coins amount: a 4-bit byte length followed by the minimal
    /// big-endian bytes. Zero is written as a zero length.
    pub fn write_coins(&mut self, amount: u128) -> Result<()> {
        let byte_len = (128 - amount.leading_zeros() as usize).div_ceil(8);
        if byte_len > MAX_COINS_BYTES {
            return Err(TvmError::out_of_range(format!(
                "coins amount {} needs {} bytes, at most {} allowed",
                amount, byte_len, MAX_COINS_BYTES
            )));
        }
        self.ensure_available(4 + byte_len * 8)?;

        self.write_uint(byte_len as u128, 4)?;
        self.write_uint(amount, byte_len * 8)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_uint(value as u128, 8)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_bits(bytes, bytes.len() * 8)
    }

    /// Appends the UTF-8 bytes of `s` without a length prefix
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Appends an internal address (`10`, anycast `0`, int8 workchain,
    /// 256-bit hash) or the null address `00` for `None`
    pub fn write_address(&mut self, address: Option<&Address>) -> Result<()> {
        match address {
            None => self.write_uint(0, 2),
            Some(address) => {
                self.ensure_available(ADDRESS_BITS)?;
                self.write_uint(0b10, 2)?;
                self.write_bit(false)?;
                self.write_int(address.workchain() as i128, 8)?;
                self.write_bytes(address.hash_part())
            }
        }
    }

    /// Appends all written bits of `other`
    pub fn write_buffer(&mut self, other: &BitBuffer) -> Result<()> {
        self.write_bits(&other.data, other.len)
    }

    // ---------------------------------------------------------------------
    // Reading
    // ---------------------------------------------------------------------

    pub fn read_bit(&mut self) -> Result<bool> {
        self.ensure_remaining(1)?;
        Ok(self.next_bit())
    }

    /// Reads `bit_len` bits into MSB-first bytes, zero-filling the last byte
    pub fn read_bits(&mut self, bit_len: usize) -> Result<Vec<u8>> {
        self.ensure_remaining(bit_len)?;

        let mut out = vec![0u8; bit_len.div_ceil(8)];
        if self.read_pos % 8 == 0 {
            let start = self.read_pos / 8;
            let full = bit_len / 8;
            out[..full].copy_from_slice(&self.data[start..start + full]);
            self.read_pos += full * 8;
            for i in full * 8..bit_len {
                if self.next_bit() {
                    out[i / 8] |= 0x80 >> (i % 8);
                }
            }
        } else {
            for i in 0..bit_len {
                if self.next_bit() {
                    out[i / 8] |= 0x80 >> (i % 8);
                }
            }
        }
        Ok(out)
    }

    pub fn read_uint(&mut self, bits: usize) -> Result<u128> {
        if bits > 128 {
            return Err(TvmError::out_of_range(format!(
                "cannot read {} bits into a 128-bit integer",
                bits
            )));
        }
        self.ensure_remaining(bits)?;

        let mut value = 0u128;
        for _ in 0..bits {
            value = (value << 1) | self.next_bit() as u128;
        }
        Ok(value)
    }

    pub fn read_int(&mut self, bits: usize) -> Result<i128> {
        let value = self.read_uint(bits)?;
        if bits == 0 {
            return Ok(0);
        }
        // sign-extend from `bits` to 128
        let shift = 128 - bits;
        Ok(((value << shift) as i128) >> shift)
    }

    pub fn read_big_uint(&mut self, bits: usize) -> Result<BigUint> {
        let bytes = self.read_bits(bits)?;
        let value = BigUint::from_bytes_be(&bytes);
        Ok(value >> (bytes.len() * 8 - bits))
    }

    pub fn read_big_int(&mut self, bits: usize) -> Result<BigInt> {
        let value = self.read_big_uint(bits)?;
        if bits > 0 && value.bit(bits as u64 - 1) {
            Ok(BigInt::from(value) - (BigInt::one() << bits))
        } else {
            Ok(BigInt::from(value))
        }
    }

    pub fn read_coins(&mut self) -> Result<u128> {
        self.atomically(|buf| {
            let byte_len = buf.read_uint(4)? as usize;
            buf.read_uint(byte_len * 8)
        })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_uint(8)? as u8)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.read_bits(len * 8)
    }

    /// Reads `len` bytes and decodes them as UTF-8
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        self.atomically(|buf| {
            let bytes = buf.read_bytes(len)?;
            String::from_utf8(bytes)
                .map_err(|e| TvmError::out_of_range(format!("invalid UTF-8 string: {}", e)))
        })
    }

    /// Reads an internal address written by [`BitBuffer::write_address`].
    ///
    /// Anycast, external and variable-length addresses are rejected.
    pub fn read_address(&mut self) -> Result<Option<Address>> {
        self.atomically(|buf| match buf.read_uint(2)? {
            0b00 => Ok(None),
            0b10 => {
                if buf.read_bit()? {
                    return Err(TvmError::bad_address("anycast addresses are not supported"));
                }
                let workchain = buf.read_int(8)? as i32;
                let hash_part: [u8; 32] = buf
                    .read_bytes(32)?
                    .try_into()
                    .map_err(|_| TvmError::bad_address("address hash must be 32 bytes"))?;
                Address::new(workchain, hash_part).map(Some)
            }
            0b01 => Err(TvmError::bad_address("external addresses are not supported")),
            _ => Err(TvmError::bad_address(
                "variable-length addresses are not supported",
            )),
        })
    }
}

impl fmt::Display for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bits_unaligned() {
        let mut buf = BitBuffer::new();
        buf.write_bit(true).unwrap();
        buf.write_uint(0b0101, 4).unwrap();
        buf.write_bytes(&[0xFF]).unwrap();

        assert_eq!(buf.len(), 13);
        assert_eq!(buf.as_bytes(), &[0b1010_1111, 0b1111_1000]);
        assert_eq!(buf.available(), MAX_CELL_BITS - 13);
    }

    #[test]
    fn test_uint_range() {
        let mut buf = BitBuffer::new();
        buf.write_uint(255, 8).unwrap();
        assert!(matches!(
            buf.write_uint(256, 8),
            Err(TvmError::ValueOutOfRange(_))
        ));
        assert!(buf.write_uint(1, 0).is_err());
        buf.write_uint(0, 0).unwrap();
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn test_uint_wider_than_128_bits() {
        let mut buf = BitBuffer::new();
        buf.write_uint(5, 256).unwrap();
        assert_eq!(buf.len(), 256);
        assert_eq!(buf.as_bytes()[31], 5);
        assert!(buf.as_bytes()[..31].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_int_round_trip() {
        let mut buf = BitBuffer::new();
        buf.write_int(-1, 8).unwrap();
        buf.write_int(-128, 8).unwrap();
        buf.write_int(127, 8).unwrap();
        buf.write_int(-1, 1).unwrap();
        buf.write_int(i128::MIN, 128).unwrap();
        buf.write_int(-(1i128 << 125), 127).unwrap();

        assert_eq!(buf.as_bytes()[..3], [0xFF, 0x80, 0x7F]);
        assert_eq!(buf.read_int(8).unwrap(), -1);
        assert_eq!(buf.read_int(8).unwrap(), -128);
        assert_eq!(buf.read_int(8).unwrap(), 127);
        assert_eq!(buf.read_int(1).unwrap(), -1);
        assert_eq!(buf.read_int(128).unwrap(), i128::MIN);
        assert_eq!(buf.read_int(127).unwrap(), -(1i128 << 125));
    }

    #[test]
    fn test_int_range() {
        let mut buf = BitBuffer::new();
        assert!(buf.write_int(128, 8).is_err());
        assert!(buf.write_int(-129, 8).is_err());
        assert!(buf.write_int(1, 1).is_err());
        assert!(buf.write_int(-1, 0).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_capacity_exceeded_leaves_buffer_unchanged() {
        let mut buf = BitBuffer::with_capacity(10);
        buf.write_uint(3, 8).unwrap();

        let err = buf.write_uint(0, 3).unwrap_err();
        assert_eq!(
            err,
            TvmError::CapacityExceeded {
                requested: 3,
                available: 2
            }
        );
        assert_eq!(buf.len(), 8);
        assert_eq!(buf.as_bytes(), &[3]);
    }

    #[test]
    fn test_full_cell_capacity() {
        let mut buf = BitBuffer::new();
        for _ in 0..MAX_CELL_BITS {
            buf.write_bit(true).unwrap();
        }
        assert_eq!(buf.available(), 0);
        assert!(buf.write_bit(false).is_err());
    }

    #[test]
    fn test_coins_boundaries() {
        let mut buf = BitBuffer::new();
        buf.write_coins(0).unwrap();
        assert_eq!(buf.len(), 4);

        let max = (1u128 << 120) - 1;
        buf.write_coins(max).unwrap();
        assert_eq!(buf.len(), 4 + 4 + 120);

        let before = buf.len();
        assert!(matches!(
            buf.write_coins(1u128 << 120),
            Err(TvmError::ValueOutOfRange(_))
        ));
        assert_eq!(buf.len(), before);

        assert_eq!(buf.read_coins().unwrap(), 0);
        assert_eq!(buf.read_coins().unwrap(), max);
    }

    #[test]
    fn test_coins_layout() {
        let mut buf = BitBuffer::new();
        buf.write_coins(1_000_000_000).unwrap();
        // 0x3B9ACA00 needs 4 bytes
        assert_eq!(buf.len(), 4 + 32);
        assert_eq!(buf.to_hex(), "43B9ACA00");
    }

    #[test]
    fn test_big_uint_round_trip() {
        let value = BigUint::parse_bytes(
            b"83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8",
            16,
        )
        .unwrap();
        let mut buf = BitBuffer::new();
        buf.write_bit(true).unwrap();
        buf.write_big_uint(&value, 256).unwrap();
        assert!(buf.write_big_uint(&value, 255).is_err());

        assert!(buf.read_bit().unwrap());
        assert_eq!(buf.read_big_uint(256).unwrap(), value);
    }

    #[test]
    fn test_big_int_negative() {
        let mut buf = BitBuffer::new();
        buf.write_big_int(&BigInt::from(-2), 257).unwrap();
        assert_eq!(buf.len(), 257);
        assert_eq!(buf.read_big_int(257).unwrap(), BigInt::from(-2));
        assert!(buf.write_big_int(&BigInt::from(2), 2).is_err());
    }

    #[test]
    fn test_read_underrun_keeps_cursor() {
        let mut buf = BitBuffer::new();
        buf.write_uint(0xAB, 8).unwrap();
        assert_eq!(buf.read_uint(4).unwrap(), 0xA);

        let err = buf.read_uint(5).unwrap_err();
        assert_eq!(
            err,
            TvmError::BufferUnderrun {
                requested: 5,
                remaining: 4
            }
        );
        assert_eq!(buf.read_position(), 4);
        assert_eq!(buf.read_uint(4).unwrap(), 0xB);
    }

    #[test]
    fn test_read_coins_underrun_is_atomic() {
        let mut buf = BitBuffer::new();
        // length prefix claims 2 bytes, only one follows
        buf.write_uint(2, 4).unwrap();
        buf.write_uint(0xFF, 8).unwrap();

        assert!(buf.read_coins().is_err());
        assert_eq!(buf.read_position(), 0);
    }

    #[test]
    fn test_string_round_trip() {
        let mut buf = BitBuffer::new();
        buf.write_bit(false).unwrap();
        buf.write_string("hello").unwrap();

        buf.read_bit().unwrap();
        assert_eq!(buf.read_string(5).unwrap(), "hello");
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_address_round_trip() {
        let address = Address::new(-1, [0x5A; 32]).unwrap();
        let mut buf = BitBuffer::new();
        buf.write_address(Some(&address)).unwrap();
        buf.write_address(None).unwrap();
        assert_eq!(buf.len(), ADDRESS_BITS + 2);

        assert_eq!(buf.read_address().unwrap(), Some(address));
        assert_eq!(buf.read_address().unwrap(), None);
    }

    #[test]
    fn test_read_address_rejects_external() {
        let mut buf = BitBuffer::new();
        buf.write_uint(0b01, 2).unwrap();
        buf.write_uint(0, 9).unwrap();
        assert!(matches!(
            buf.read_address(),
            Err(TvmError::InvalidAddressFormat(_))
        ));
        assert_eq!(buf.read_position(), 0);
    }

    #[test]
    fn test_read_address_rejects_unknown_workchain() {
        let mut buf = BitBuffer::new();
        buf.write_uint(0b100, 3).unwrap();
        buf.write_int(5, 8).unwrap();
        buf.write_bytes(&[0; 32]).unwrap();
        assert_eq!(buf.read_address(), Err(TvmError::InvalidWorkchain(5)));
    }

    #[test]
    fn test_padded_bytes() {
        let mut buf = BitBuffer::new();
        buf.write_uint(0b101, 3).unwrap();
        assert_eq!(buf.padded_bytes(), vec![0b1011_0000]);

        buf.write_uint(0b10101, 5).unwrap();
        assert_eq!(buf.padded_bytes(), vec![0b1011_0101]);
    }

    #[test]
    fn test_to_hex() {
        let mut buf = BitBuffer::new();
        assert_eq!(buf.to_hex(), "");
        buf.write_uint(0xA, 4).unwrap();
        assert_eq!(buf.to_hex(), "A");
        buf.write_bit(true).unwrap();
        assert_eq!(buf.to_hex(), "AC_");
        assert_eq!(buf.to_string(), "AC_");
    }

    #[test]
    fn test_from_bytes_clears_padding() {
        let buf = BitBuffer::from_bytes(&[0b1011_1111, 0xFF], 3).unwrap();
        assert_eq!(buf.as_bytes(), &[0b1010_0000]);
        assert_eq!(buf.len(), 3);
        assert!(BitBuffer::from_bytes(&[0], 9).is_err());
    }

    #[test]
    fn test_write_buffer() {
        let mut a = BitBuffer::new();
        a.write_uint(0b11, 2).unwrap();
        let mut b = BitBuffer::new();
        b.write_uint(0b101, 3).unwrap();

        a.write_buffer(&b).unwrap();
        assert_eq!(a.len(), 5);
        assert_eq!(a.read_uint(5).unwrap(), 0b11101);
    }

    #[test]
    fn test_get_bit() {
        let mut buf = BitBuffer::new();
        buf.write_uint(0b10, 2).unwrap();
        assert!(buf.get_bit(0).unwrap());
        assert!(!buf.get_bit(1).unwrap());
        assert!(buf.get_bit(2).is_err());
    }
}
