//! Error types for BLK payload decoding.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BlkError>;

#[derive(Error, Debug)]
pub enum BlkError {
    #[error("blk requires a zstd dictionary that was not supplied")]
    MissingDict,

    #[error("blk requires an external name map that was not supplied")]
    MissingNamemap,

    #[error("unknown blk param type tag {0:#x}")]
    UnknownParamType(u8),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("bad block hierarchy: {0}")]
    BadHierarchy(String),

    #[error("cursor error: {0}")]
    Cursor(#[from] vromfs_cursor::CursorError),
}

/// A non-fatal condition observed while decoding a BLK payload. Collected
/// rather than logged, since this crate has no terminal to print to (see
/// DESIGN.md on ambient logging).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// The declared `names_in_name_map` count didn't match the number of
    /// names actually parsed out of the inline name table.
    NameMapLengthMismatch { expected: u64, actual: u64 },
    /// ZSTD decompression needed the streaming-frame fallback because the
    /// payload wasn't a sized frame.
    StreamingFrameFallback,
}
