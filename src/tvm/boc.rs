//! Bag of Cells (BoC) serialization and deserialization
//!
//! BoC is a serialization format that encodes cells into byte arrays.
//! It allows storing and transmitting cell structures efficiently.
//!
//! Layout of the generic format:
//!
//! ```text
//! magic (4) | flags:size (1) | off_bytes (1)
//! cells (size) | roots (size) | absent (size) | tot_cells_size (off_bytes)
//! root_list (roots * size)
//! [index (cells * off_bytes)]
//! cell bodies: d1 | d2 | padded data | ref indices (size each)
//! [crc32c (4, little endian)]
//! ```
//!
//! Cells are stored parents first: every reference points to a cell with a
//! greater index than the cell holding it.

use crate::crc::CRC32C;
use crate::tvm::cell::{Cell, CellDescriptor, CellKind, MAX_CELL_REFS};
use crate::tvm::error::{Result, TvmError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// BoC magic number for standard format
pub const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// BoC magic number for the legacy indexed format
pub const BOC_INDEXED_MAGIC: u32 = 0x68ff65f3;

/// BoC magic number for the legacy indexed format with CRC32C
pub const BOC_INDEXED_CRC32C_MAGIC: u32 = 0xacc3a728;

const HAS_IDX_FLAG: u8 = 0b1000_0000;
const HAS_CRC32C_FLAG: u8 = 0b0100_0000;
const HAS_CACHE_BITS_FLAG: u8 = 0b0010_0000;
const SIZE_MASK: u8 = 0b0000_0111;

/// Serialization switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BocOptions {
    /// Emit the per-cell offset index
    pub has_idx: bool,
    /// Append a CRC32C of everything before it
    pub has_crc32c: bool,
}

/// Parsed header of a serialized bag of cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BocHeader {
    pub magic: u32,
    pub has_idx: bool,
    pub has_crc32c: bool,
    pub has_cache_bits: bool,
    /// Width of cell indices in bytes (1..=4)
    pub size_bytes: usize,
    /// Width of offsets in bytes (1..=8)
    pub offset_bytes: usize,
    pub cells_num: usize,
    pub roots_num: usize,
    pub absent_num: usize,
    pub tot_cells_size: usize,
    pub root_list: Vec<usize>,
    pub index: Vec<usize>,
    /// Position of the first cell body in the input
    pub cells_offset: usize,
}

impl BocHeader {
    /// Parses and validates the header of `data`.
    ///
    /// Besides the fields themselves this checks that the counts are
    /// consistent with each other and that the input holds exactly the
    /// announced cell data plus the optional checksum.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pos = 0;
        let magic = read_uint(data, &mut pos, 4)? as u32;

        let (has_idx, has_crc32c, has_cache_bits, size_bytes) = match magic {
            BOC_GENERIC_MAGIC => {
                let flags = read_byte(data, &mut pos)?;
                (
                    flags & HAS_IDX_FLAG != 0,
                    flags & HAS_CRC32C_FLAG != 0,
                    flags & HAS_CACHE_BITS_FLAG != 0,
                    (flags & SIZE_MASK) as usize,
                )
            }
            BOC_INDEXED_MAGIC => (true, false, false, read_byte(data, &mut pos)? as usize),
            BOC_INDEXED_CRC32C_MAGIC => (true, true, false, read_byte(data, &mut pos)? as usize),
            _ => {
                return Err(TvmError::malformed(format!(
                    "invalid magic number 0x{:08x}",
                    magic
                )));
            }
        };

        if !(1..=4).contains(&size_bytes) {
            return Err(TvmError::malformed(format!(
                "invalid size_bytes {}",
                size_bytes
            )));
        }
        if has_cache_bits && !has_idx {
            return Err(TvmError::malformed("cache bits require an index"));
        }

        let offset_bytes = read_byte(data, &mut pos)? as usize;
        if !(1..=8).contains(&offset_bytes) {
            return Err(TvmError::malformed(format!(
                "invalid offset_bytes {}",
                offset_bytes
            )));
        }

        let cells_num = read_uint(data, &mut pos, size_bytes)?;
        let roots_num = read_uint(data, &mut pos, size_bytes)?;
        let absent_num = read_uint(data, &mut pos, size_bytes)?;
        let tot_cells_size = read_uint(data, &mut pos, offset_bytes)?;

        if roots_num == 0 {
            return Err(TvmError::malformed("no root cells"));
        }
        if roots_num.saturating_add(absent_num) > cells_num {
            return Err(TvmError::malformed(format!(
                "{} roots and {} absent cells do not fit in {} cells",
                roots_num, absent_num, cells_num
            )));
        }
        // every cell takes at least its two descriptor bytes
        if cells_num.saturating_mul(2) > tot_cells_size || tot_cells_size > data.len() {
            return Err(TvmError::malformed(format!(
                "{} cells cannot fit in {} bytes of cell data",
                cells_num, tot_cells_size
            )));
        }

        let mut root_list = Vec::with_capacity(roots_num);
        for _ in 0..roots_num {
            let root = read_uint(data, &mut pos, size_bytes)?;
            if root >= cells_num {
                return Err(TvmError::malformed(format!(
                    "root index {} out of range",
                    root
                )));
            }
            root_list.push(root);
        }

        let mut index = Vec::new();
        if has_idx {
            index.reserve(cells_num);
            let mut previous = 0;
            for _ in 0..cells_num {
                let mut offset = read_uint(data, &mut pos, offset_bytes)?;
                if has_cache_bits {
                    offset >>= 1;
                }
                if offset < previous || offset > tot_cells_size {
                    return Err(TvmError::malformed(format!(
                        "invalid index entry {}",
                        offset
                    )));
                }
                previous = offset;
                index.push(offset);
            }
        }

        let crc_len = if has_crc32c { 4 } else { 0 };
        let expected_len = pos + tot_cells_size + crc_len;
        if data.len() != expected_len {
            return Err(TvmError::malformed(format!(
                "expected {} bytes, got {}",
                expected_len,
                data.len()
            )));
        }

        Ok(Self {
            magic,
            has_idx,
            has_crc32c,
            has_cache_bits,
            size_bytes,
            offset_bytes,
            cells_num,
            roots_num,
            absent_num,
            tot_cells_size,
            root_list,
            index,
            cells_offset: pos,
        })
    }
}

/// Serializes a cell and its references into a Bag of Cells (BoC) format
pub fn serialize_boc(root: &Arc<Cell>, has_crc32: bool) -> Result<Vec<u8>> {
    serialize_boc_roots(
        std::slice::from_ref(root),
        BocOptions {
            has_idx: false,
            has_crc32c: has_crc32,
        },
    )
}

/// Serializes several root cells sharing one deduplicated cell list
pub fn serialize_boc_roots(roots: &[Arc<Cell>], options: BocOptions) -> Result<Vec<u8>> {
    if roots.is_empty() {
        return Err(TvmError::malformed("at least one root cell is required"));
    }

    let order = CellOrder::build(roots);
    let cells_num = order.cells.len();
    let size_bytes = bytes_needed(cells_num);
    if size_bytes > 4 {
        return Err(TvmError::malformed(format!(
            "too many cells: {}",
            cells_num
        )));
    }

    // Serialize each cell
    let mut bodies = Vec::new();
    let mut offsets = Vec::with_capacity(cells_num);
    for (idx, cell) in order.cells.iter().enumerate() {
        offsets.push(bodies.len());
        let (d1, d2) = cell.descriptors();
        bodies.push(d1);
        bodies.push(d2);
        bodies.extend_from_slice(&cell.padded_data());
        for reference in cell.references() {
            let ref_idx = order.position(reference)?;
            if ref_idx <= idx {
                return Err(TvmError::malformed(format!(
                    "cell {} references earlier cell {}",
                    idx, ref_idx
                )));
            }
            write_uint(&mut bodies, ref_idx, size_bytes);
        }
    }

    let tot_cells_size = bodies.len();
    let offset_bytes = bytes_needed(tot_cells_size);
    log::debug!(
        "serializing {} cells ({} roots), {} bytes of cell data",
        cells_num,
        roots.len(),
        tot_cells_size
    );

    let mut result = Vec::with_capacity(16 + tot_cells_size);
    result.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());

    let mut flags = size_bytes as u8;
    if options.has_idx {
        flags |= HAS_IDX_FLAG;
    }
    if options.has_crc32c {
        flags |= HAS_CRC32C_FLAG;
    }
    result.push(flags);
    result.push(offset_bytes as u8);

    write_uint(&mut result, cells_num, size_bytes);
    write_uint(&mut result, roots.len(), size_bytes);
    write_uint(&mut result, 0, size_bytes);
    write_uint(&mut result, tot_cells_size, offset_bytes);

    for root in roots {
        write_uint(&mut result, order.position(root)?, size_bytes);
    }

    if options.has_idx {
        for offset in &offsets {
            write_uint(&mut result, *offset, offset_bytes);
        }
    }

    result.extend_from_slice(&bodies);

    if options.has_crc32c {
        let crc = CRC32C.checksum(&result);
        result.extend_from_slice(&crc.to_le_bytes());
    }

    Ok(result)
}

/// Deserializes a BoC that must contain exactly one root
pub fn deserialize_boc(data: &[u8]) -> Result<Arc<Cell>> {
    let mut roots = deserialize_boc_roots(data)?;
    if roots.len() != 1 {
        return Err(TvmError::malformed(format!(
            "expected a single root, found {}",
            roots.len()
        )));
    }
    roots
        .pop()
        .ok_or_else(|| TvmError::malformed("no root cells"))
}

/// Deserializes a BoC into its root cells, in root-list order
pub fn deserialize_boc_roots(data: &[u8]) -> Result<Vec<Arc<Cell>>> {
    let header = BocHeader::parse(data)?;
    log::debug!(
        "parsing bag of cells: {} cells, {} roots, {} bytes of cell data, idx={} crc32c={}",
        header.cells_num,
        header.roots_num,
        header.tot_cells_size,
        header.has_idx,
        header.has_crc32c
    );

    let cells_end = header.cells_offset + header.tot_cells_size;
    if header.has_crc32c {
        let expected = CRC32C.checksum(&data[..cells_end]);
        let mut stored = [0u8; 4];
        stored.copy_from_slice(&data[cells_end..cells_end + 4]);
        let stored = u32::from_le_bytes(stored);
        if stored != expected {
            return Err(TvmError::ChecksumMismatch {
                expected: format!("{:08x}", expected),
                actual: format!("{:08x}", stored),
            });
        }
    }

    let raw_cells = parse_cells(
        &data[header.cells_offset..cells_end],
        header.cells_num,
        header.size_bytes,
    )?;

    // Children always follow their parents, so build from the end
    let mut cells: Vec<Option<Arc<Cell>>> = vec![None; header.cells_num];
    for (idx, raw) in raw_cells.into_iter().enumerate().rev() {
        let mut references = Vec::with_capacity(raw.references.len());
        for ref_idx in raw.references {
            if ref_idx <= idx || ref_idx >= header.cells_num {
                return Err(TvmError::malformed(format!(
                    "cell {} has invalid reference {}",
                    idx, ref_idx
                )));
            }
            let child = cells[ref_idx]
                .clone()
                .ok_or_else(|| TvmError::malformed(format!("cell {} is missing", ref_idx)))?;
            references.push(child);
        }

        let kind = if raw.descriptor.is_exotic() {
            CellKind::Exotic
        } else {
            CellKind::Ordinary
        };
        let cell = Cell::with_kind(
            raw.data,
            raw.bit_len,
            references,
            kind,
            raw.descriptor.level(),
        )
        .map_err(|err| TvmError::malformed(format!("cell {}: {}", idx, err)))?;
        cells[idx] = Some(Arc::new(cell));
    }

    header
        .root_list
        .iter()
        .map(|&root| {
            cells[root]
                .clone()
                .ok_or_else(|| TvmError::malformed(format!("root {} is missing", root)))
        })
        .collect()
}

struct RawCell {
    descriptor: CellDescriptor,
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<usize>,
}

fn parse_cells(data: &[u8], count: usize, size_bytes: usize) -> Result<Vec<RawCell>> {
    let mut pos = 0;
    let mut cells = Vec::with_capacity(count);

    for idx in 0..count {
        let d1 = read_byte(data, &mut pos)?;
        let d2 = read_byte(data, &mut pos)?;
        let descriptor = CellDescriptor::new(d1, d2);

        let ref_count = descriptor.reference_count();
        if ref_count > MAX_CELL_REFS {
            return Err(TvmError::malformed(format!(
                "cell {} has {} references",
                idx, ref_count
            )));
        }

        if descriptor.store_hashes() {
            let hash_count = (descriptor.level().count_ones() + 1) as usize;
            read_bytes(data, &mut pos, hash_count * (32 + 2))?;
        }

        let bytes = read_bytes(data, &mut pos, descriptor.byte_len())?;
        let bit_len = if descriptor.is_aligned() {
            bytes.len() * 8
        } else {
            // the last byte carries the completion tag
            match bytes.last() {
                Some(&last) if last != 0 => {
                    bytes.len() * 8 - last.trailing_zeros() as usize - 1
                }
                _ => {
                    return Err(TvmError::malformed(format!(
                        "cell {} is missing its completion tag",
                        idx
                    )));
                }
            }
        };

        let mut references = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            references.push(read_uint(data, &mut pos, size_bytes)?);
        }

        log::trace!(
            "cell {}: d1={:#04x} d2={:#04x} bits={} refs={:?}",
            idx,
            d1,
            d2,
            bit_len,
            references
        );
        cells.push(RawCell {
            descriptor,
            data: bytes.to_vec(),
            bit_len,
            references,
        });
    }

    if pos != data.len() {
        return Err(TvmError::malformed(format!(
            "cell data size mismatch: parsed {} of {} bytes",
            pos,
            data.len()
        )));
    }

    Ok(cells)
}

/// Distinct cells of a graph in serialization order
struct CellOrder {
    cells: Vec<Arc<Cell>>,
    index: HashMap<[u8; 32], usize>,
}

impl CellOrder {
    /// Reverse post-order of a depth-first walk, deduplicated by hash.
    /// Children are visited last-to-first, so a tree comes out in plain
    /// pre-order and every reference of a DAG still points forward.
    fn build(roots: &[Arc<Cell>]) -> Self {
        let mut visited = HashSet::new();
        let mut cells = Vec::new();
        for root in roots.iter().rev() {
            Self::visit(root, &mut visited, &mut cells);
        }
        cells.reverse();

        let index = cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| (cell.hash(), idx))
            .collect();
        Self { cells, index }
    }

    fn visit(cell: &Arc<Cell>, visited: &mut HashSet<[u8; 32]>, cells: &mut Vec<Arc<Cell>>) {
        if !visited.insert(cell.hash()) {
            return;
        }
        for reference in cell.references().iter().rev() {
            Self::visit(reference, visited, cells);
        }
        cells.push(cell.clone());
    }

    fn position(&self, cell: &Cell) -> Result<usize> {
        self.index
            .get(&cell.hash())
            .copied()
            .ok_or_else(|| TvmError::malformed("cell missing from serialization order"))
    }
}

/// Minimal number of bytes (at least 1) needed to store `value`
fn bytes_needed(value: usize) -> usize {
    let bits = usize::BITS - value.leading_zeros();
    (bits as usize).div_ceil(8).max(1)
}

fn write_uint(buf: &mut Vec<u8>, value: usize, size: usize) {
    let bytes = (value as u64).to_be_bytes();
    buf.extend_from_slice(&bytes[8 - size..]);
}

fn read_byte(data: &[u8], pos: &mut usize) -> Result<u8> {
    let byte = *data
        .get(*pos)
        .ok_or_else(|| TvmError::malformed("unexpected end of data"))?;
    *pos += 1;
    Ok(byte)
}

fn read_bytes<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = pos
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| TvmError::malformed("unexpected end of data"))?;
    let bytes = &data[*pos..end];
    *pos = end;
    Ok(bytes)
}

fn read_uint(data: &[u8], pos: &mut usize, size: usize) -> Result<usize> {
    let bytes = read_bytes(data, pos, size)?;
    let value = bytes
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | byte as u64);
    usize::try_from(value).map_err(|_| TvmError::malformed(format!("value {} too large", value)))
}

/// Parses a hex-encoded BoC
pub fn hex_to_boc(hex: &str) -> Result<Arc<Cell>> {
    let data = hex::decode(hex.trim())
        .map_err(|e| TvmError::malformed(format!("invalid hex: {}", e)))?;
    deserialize_boc(&data)
}

/// Serializes a cell to a hex-encoded BoC
pub fn boc_to_hex(cell: &Arc<Cell>, has_crc32: bool) -> Result<String> {
    Ok(hex::encode(serialize_boc(cell, has_crc32)?))
}

/// Serializes a cell to a base64-encoded BoC
pub fn boc_to_base64(cell: &Arc<Cell>, has_crc32: bool) -> Result<String> {
    Ok(STANDARD.encode(serialize_boc(cell, has_crc32)?))
}

/// Parses a base64-encoded BoC
pub fn base64_to_boc(b64: &str) -> Result<Arc<Cell>> {
    let data = STANDARD
        .decode(b64.trim())
        .map_err(|e| TvmError::malformed(format!("invalid base64: {}", e)))?;
    deserialize_boc(&data)
}
