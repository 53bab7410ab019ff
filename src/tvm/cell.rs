//! Cell implementation for TON blockchain
//!
//! A cell is a fundamental data structure in TON that can store up to 1023 bits
//! of data and maintain up to 4 references to other cells.
//!
//! Cells are immutable: they are produced by [`CellBuilder`](crate::tvm::CellBuilder)
//! or by the BOC parser and shared through `Arc`, so one cell may be a child
//! of several parents. The representation hash and depth are computed once,
//! when the cell is sealed.

use crate::tvm::bits::BitBuffer;
use crate::tvm::error::{Result, TvmError};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Maximum number of bits a cell can store
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references a cell can have
pub const MAX_CELL_REFS: usize = 4;

/// Cell level range (0-3)
pub const MAX_CELL_LEVEL: u8 = 3;

/// Deepest cell tree accepted by the network
pub const MAX_CELL_DEPTH: u16 = 1024;

/// Ordinary cells hold plain data; exotic cells (pruned branches, library
/// references, Merkle proofs) are carried through unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CellKind {
    #[default]
    Ordinary,
    Exotic,
}

/// First descriptor byte: `refs + 8 * exotic + 32 * level`
pub fn refs_descriptor(reference_count: usize, exotic: bool, level: u8) -> u8 {
    reference_count as u8 + if exotic { 8 } else { 0 } + level * 32
}

/// Second descriptor byte: `floor(bits / 8) + ceil(bits / 8)`
pub fn bits_descriptor(bit_len: usize) -> u8 {
    (bit_len / 8 + bit_len.div_ceil(8)) as u8
}

/// Decoded pair of descriptor bytes as found in serialized cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellDescriptor {
    pub d1: u8,
    pub d2: u8,
}

impl CellDescriptor {
    const REF_COUNT_MASK: u8 = 0b0000_0111;
    const EXOTIC_FLAG: u8 = 0b0000_1000;
    const STORE_HASHES_FLAG: u8 = 0b0001_0000;

    pub fn new(d1: u8, d2: u8) -> Self {
        Self { d1, d2 }
    }

    /// Number of references (values above 4 are invalid)
    pub fn reference_count(&self) -> usize {
        (self.d1 & Self::REF_COUNT_MASK) as usize
    }

    pub fn is_exotic(&self) -> bool {
        self.d1 & Self::EXOTIC_FLAG != 0
    }

    /// Whether hashes and depths are stored in front of the cell data
    pub fn store_hashes(&self) -> bool {
        self.d1 & Self::STORE_HASHES_FLAG != 0
    }

    pub fn level(&self) -> u8 {
        self.d1 >> 5
    }

    /// Number of data bytes that follow the descriptors
    pub fn byte_len(&self) -> usize {
        (self.d2 as usize).div_ceil(2)
    }

    /// Data ends on a byte boundary, so no completion tag is present
    pub fn is_aligned(&self) -> bool {
        self.d2 % 2 == 0
    }
}

/// Represents a cell in the TON blockchain
#[derive(Debug, Clone)]
pub struct Cell {
    /// Cell data
    bits: BitBuffer,
    /// References to other cells
    references: Vec<Arc<Cell>>,
    kind: CellKind,
    /// Cell level (0-3)
    level: u8,
    /// Representation hash
    hash: [u8; 32],
    depth: u16,
}

impl Default for Cell {
    fn default() -> Self {
        Self::seal(BitBuffer::new(), Vec::new(), CellKind::Ordinary, 0, 0)
    }
}

impl Cell {
    /// Creates an ordinary cell from `bit_len` bits of `data` and its references
    pub fn new(data: Vec<u8>, bit_len: usize, references: Vec<Arc<Cell>>) -> Result<Self> {
        Self::with_kind(data, bit_len, references, CellKind::Ordinary, 0)
    }

    /// Creates an ordinary cell without references
    pub fn with_data(data: Vec<u8>, bit_len: usize) -> Result<Self> {
        Self::new(data, bit_len, Vec::new())
    }

    /// Creates a cell of the given kind.
    ///
    /// `level` is only used for exotic cells; an ordinary cell takes the
    /// highest level of its children.
    pub fn with_kind(
        data: Vec<u8>,
        bit_len: usize,
        references: Vec<Arc<Cell>>,
        kind: CellKind,
        level: u8,
    ) -> Result<Self> {
        if bit_len > MAX_CELL_BITS {
            return Err(TvmError::CapacityExceeded {
                requested: bit_len,
                available: MAX_CELL_BITS,
            });
        }
        let bits = BitBuffer::from_bytes(&data, bit_len)?;
        Self::from_bits(bits, references, kind, level)
    }

    /// Seals a written bit buffer and references into a cell
    pub(crate) fn from_bits(
        bits: BitBuffer,
        references: Vec<Arc<Cell>>,
        kind: CellKind,
        level: u8,
    ) -> Result<Self> {
        if bits.len() > MAX_CELL_BITS {
            return Err(TvmError::CapacityExceeded {
                requested: bits.len(),
                available: MAX_CELL_BITS,
            });
        }
        if references.len() > MAX_CELL_REFS {
            return Err(TvmError::TooManyReferences { max: MAX_CELL_REFS });
        }
        if level > MAX_CELL_LEVEL {
            return Err(TvmError::out_of_range(format!(
                "cell level {} exceeds {}",
                level, MAX_CELL_LEVEL
            )));
        }

        let level = match kind {
            CellKind::Ordinary => references.iter().map(|r| r.level).max().unwrap_or(0),
            CellKind::Exotic => level,
        };

        let depth = match references.iter().map(|r| r.depth).max() {
            None => 0,
            Some(d) if d >= MAX_CELL_DEPTH => {
                return Err(TvmError::DepthOverflow {
                    max: MAX_CELL_DEPTH,
                });
            }
            Some(d) => d + 1,
        };

        Ok(Self::seal(bits, references, kind, level, depth))
    }

    fn seal(
        bits: BitBuffer,
        references: Vec<Arc<Cell>>,
        kind: CellKind,
        level: u8,
        depth: u16,
    ) -> Self {
        let mut cell = Self {
            bits,
            references,
            kind,
            level,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_hash();
        cell
    }

    /// SHA-256 over descriptors, padded data, child depths and child hashes
    fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        let (d1, d2) = self.descriptors();
        hasher.update([d1, d2]);
        hasher.update(self.bits.padded_bytes());
        for reference in &self.references {
            hasher.update(reference.depth.to_be_bytes());
        }
        for reference in &self.references {
            hasher.update(reference.hash);
        }
        hasher.finalize().into()
    }

    /// Returns the cell data, unused bits of the last byte zeroed
    pub fn data(&self) -> &[u8] {
        self.bits.as_bytes()
    }

    /// Returns the number of bits in the cell
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Returns the cell data as a bit buffer
    pub fn bits(&self) -> &BitBuffer {
        &self.bits
    }

    /// Returns the data with the completion tag, as it appears on the wire
    pub fn padded_data(&self) -> Vec<u8> {
        self.bits.padded_bytes()
    }

    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.references.get(index)
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_exotic(&self) -> bool {
        self.kind == CellKind::Exotic
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Returns the (d1, d2) descriptor bytes
    pub fn descriptors(&self) -> (u8, u8) {
        (
            refs_descriptor(self.references.len(), self.is_exotic(), self.level),
            bits_descriptor(self.bits.len()),
        )
    }

    /// 0 for a leaf, otherwise one more than the deepest child
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Representation hash
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Each distinct cell is printed with its subtree once; later
    /// occurrences become a single `x{..} #<hash prefix>` line.
    fn fmt_tree(
        &self,
        f: &mut fmt::Formatter<'_>,
        indent: usize,
        seen: &mut HashSet<[u8; 32]>,
    ) -> fmt::Result {
        if !seen.insert(self.hash) {
            return writeln!(
                f,
                "{:indent$}x{{{}}} #{}",
                "",
                self.bits,
                hex::encode(&self.hash[..4]),
                indent = indent
            );
        }
        writeln!(f, "{:indent$}x{{{}}}", "", self.bits, indent = indent)?;
        for reference in &self.references {
            reference.fmt_tree(f, indent + 1, seen)?;
        }
        Ok(())
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

/// Prints the cell tree in fift notation, one cell per line
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0, &mut HashSet::new())
    }
}
