//! Decoder for the BLK structured-configuration file format used inside
//! VROMFS archives: a header-typed payload, optional dictionary-trained
//! ZSTD compression, archive-level name-map resolution for "slim" variants,
//! and a flat parameter/block stream reconstructed into a tree.

pub mod block;
pub mod decoder;
pub mod error;
pub mod params;

pub use block::{Block, TypedValue};
pub use decoder::{decode, decode_with_warnings};
pub use error::{BlkError, DecodeWarning, Result};
