//! Aggregator: opens a VROMFS archive, exposes its logical file tree, and
//! decodes individual entries — raw bytes or, for `.blk` payloads, a typed
//! [`blk::Block`] tree.

pub mod error;

use std::fs;
use std::path::Path;

use fstree::{Directory, DirHandle, MassQuery, Query};
pub use error::{PipelineError, Result};

pub use blk::{Block, TypedValue};
pub use vromfs::{VromfsReader, VromfsReaderOptions};

/// An owned, path-addressable handle to one entry in the archive. Unlike
/// [`vromfs::VromfsFile`], this carries no borrow from the reader, so it can
/// be stored in the file tree alongside the reader itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    path_components: Vec<String>,
    offset: u32,
    size: u32,
}

impl ArchiveFile {
    pub fn path_components(&self) -> &[String] {
        &self.path_components
    }

    pub fn full_path(&self) -> String {
        self.path_components.join("/")
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

/// An opened VROMFS archive: the decoded reader plus the file tree built
/// from its entries.
pub struct Archive {
    reader: VromfsReader,
    files: Vec<ArchiveFile>,
    tree: DirHandle<ArchiveFile>,
}

impl Archive {
    /// Reads the file at `path` and opens it as a VROMFS archive, with
    /// default reader options (digest verification enabled).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, VromfsReaderOptions::default())
    }

    /// As [`Archive::open`], with explicit reader options.
    pub fn open_with_options(path: impl AsRef<Path>, options: VromfsReaderOptions) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Parses an in-memory VROMFS container, default options.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, VromfsReaderOptions::default())
    }

    /// Parses an in-memory VROMFS container with explicit reader options.
    pub fn from_bytes_with_options(data: &[u8], options: VromfsReaderOptions) -> Result<Self> {
        let reader = VromfsReader::with_options(data, options)?;

        let files: Vec<ArchiveFile> = reader
            .files()
            .map(|f| ArchiveFile {
                path_components: f.path_components().to_vec(),
                offset: f.offset(),
                size: f.size(),
            })
            .collect();

        let tree = Directory::root("");
        for file in &files {
            Directory::insert(
                &tree,
                Query::from_path(&file.full_path(), Some(file.clone())),
            )?;
        }

        Ok(Archive {
            reader,
            files,
            tree,
        })
    }

    /// All files in the archive, in index order.
    pub fn files(&self) -> impl Iterator<Item = &ArchiveFile> {
        self.files.iter()
    }

    /// The archive's logical directory tree.
    pub fn tree(&self) -> &DirHandle<ArchiveFile> {
        &self.tree
    }

    /// Depth-first search over the tree with exclude/include name filters.
    pub fn search(&self, query: &MassQuery) -> Vec<(Vec<String>, ArchiveFile)> {
        Directory::search(&self.tree, query)
    }

    /// Looks up a single file by its `/`-separated path.
    pub fn file_at(&self, path: &str) -> Result<ArchiveFile> {
        Directory::lookup(&self.tree, Query::from_path(path, None), true)?
            .ok_or_else(|| PipelineError::FileNotFound(path.to_string()))
    }

    /// Raw bytes for a file.
    pub fn open_file(&self, file: &ArchiveFile) -> Result<Vec<u8>> {
        Ok(self.reader.slice(file.offset, file.size).to_vec())
    }

    /// Decodes a `.blk` file's bytes into a [`blk::Block`] tree, using the
    /// archive's name map and ZSTD dictionary if present.
    pub fn open_blk(&self, file: &ArchiveFile) -> Result<Block> {
        let raw = self.reader.slice(file.offset, file.size);
        let block = blk::decode(raw, self.reader.name_map(), self.reader.zstd_dict())?;
        Ok(block)
    }
}
