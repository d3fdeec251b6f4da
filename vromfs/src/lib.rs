//! Read-only parser for the VROMFS game-asset archive container.
//!
//! Handles the outer header (VRFS/VRFX), fixed-key deobfuscation, ZSTD
//! decompression, MD5 digest verification, and the inner directory table
//! (name table, data table, and the special `\xff?nm`/`*dict`/`version`
//! records). BLK payload decoding lives in the sibling `blk` crate.

pub mod error;
pub mod format;
pub mod obfuscate;
pub mod reader;

pub use error::{Result, VromfsError};
pub use format::Packing;
pub use reader::{VromfsFile, VromfsReader, VromfsReaderOptions};
