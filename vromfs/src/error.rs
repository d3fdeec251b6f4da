//! Error types for VROMFS container parsing.

use thiserror::Error;

/// Result type alias for VROMFS operations.
pub type Result<T> = std::result::Result<T, VromfsError>;

#[derive(Error, Debug)]
pub enum VromfsError {
    #[error("bad vromfs magic: expected 'VRFS' or 'VRFX'")]
    BadMagic,

    #[error("bad inner header: {0}")]
    BadInnerHeader(String),

    #[error("md5 digest mismatch over decompressed inner image")]
    DigestMismatch,

    #[error("bad name map: {0}")]
    BadNameMap(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("cursor error: {0}")]
    Cursor(#[from] vromfs_cursor::CursorError),

    #[error("file tree error: {0}")]
    FsTree(#[from] fstree::FsTreeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
