//! Error type shared by the cell, BOC and address codecs

use thiserror::Error;

/// Errors produced while building, reading or (de)serializing TVM data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TvmError {
    /// A write would move the cursor past the buffer capacity
    #[error("capacity exceeded: {requested} bits requested, {available} available")]
    CapacityExceeded { requested: usize, available: usize },

    /// A value does not fit into the requested width or encoding
    #[error("value out of range: {0}")]
    ValueOutOfRange(String),

    /// A cell already holds the maximum number of references
    #[error("cell can hold at most {max} references")]
    TooManyReferences { max: usize },

    /// A read would move the cursor past the written length
    #[error("buffer underrun: {requested} bits requested, {remaining} remaining")]
    BufferUnderrun { requested: usize, remaining: usize },

    #[error("malformed bag of cells: {0}")]
    MalformedBoc(String),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("invalid workchain: {0}")]
    InvalidWorkchain(i32),

    /// A cell tree is deeper than the network allows
    #[error("cell depth exceeds {max}")]
    DepthOverflow { max: u16 },
}

pub type Result<T> = std::result::Result<T, TvmError>;

impl TvmError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        TvmError::MalformedBoc(msg.into())
    }

    pub(crate) fn out_of_range(msg: impl Into<String>) -> Self {
        TvmError::ValueOutOfRange(msg.into())
    }

    pub(crate) fn bad_address(msg: impl Into<String>) -> Self {
        TvmError::InvalidAddressFormat(msg.into())
    }
}
