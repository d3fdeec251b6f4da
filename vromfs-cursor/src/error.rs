use thiserror::Error;

/// Errors raised by [`crate::ByteCursor`] and [`crate::BitCursor`].
#[derive(Error, Debug)]
pub enum CursorError {
    /// Fewer bytes/bits remained than a read requested.
    #[error("unexpected end of data: wanted {wanted} bytes, had {available}")]
    UnexpectedEof { wanted: usize, available: usize },

    /// A ULEB128 value required more than 64 bits to represent.
    #[error("ULEB128 value overflowed 64 bits")]
    Overflow,
}

pub type Result<T> = std::result::Result<T, CursorError>;
