use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("vromfs error: {0}")]
    Vromfs(#[from] vromfs::VromfsError),

    #[error("blk error: {0}")]
    Blk(#[from] blk::BlkError),

    #[error("file tree error: {0}")]
    FsTree(#[from] fstree::FsTreeError),

    #[error("file not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
