//! Shared byte/bit cursor primitives for the VROMFS container parser and the
//! BLK configuration decoder.
//!
//! Both wire formats are read forward-only: a [`ByteCursor`] walks a byte
//! buffer consuming fixed-width and variable-length (ULEB128) fields, and a
//! [`BitCursor`] does the same at bit granularity for formats that need it.

pub mod bit;
pub mod byte;
pub mod error;
mod uleb128;

pub use bit::BitCursor;
pub use byte::ByteCursor;
pub use error::{CursorError, Result};
