//! TVM (TON Virtual Machine) data structures and utilities
//!
//! This module provides implementations of fundamental TON blockchain data structures:
//! - BitBuffer: bit-addressed storage with typed writes and reads
//! - Cell: The basic data structure that can store up to 1023 bits and up to 4 references
//! - CellBuilder: the mutable phase that seals into an immutable cell
//! - Slice: A reader for sequentially accessing cell data
//! - BoC: Bag of Cells serialization format for encoding cells into byte arrays
//! - Address: raw and user-friendly TON address codec

pub mod address;
pub mod bits;
pub mod boc;
pub mod builder;
pub mod cell;
pub mod error;
pub mod slice;

pub use address::{Address, AddressFormat, BASECHAIN, MASTERCHAIN};
pub use bits::BitBuffer;
pub use boc::{
    BocHeader, BocOptions, base64_to_boc, boc_to_base64, boc_to_hex, deserialize_boc,
    deserialize_boc_roots, hex_to_boc, serialize_boc, serialize_boc_roots,
};
pub use builder::CellBuilder;
pub use cell::{Cell, CellKind, MAX_CELL_BITS, MAX_CELL_DEPTH, MAX_CELL_LEVEL, MAX_CELL_REFS};
pub use error::TvmError;
pub use slice::Slice;
