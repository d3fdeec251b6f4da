use thiserror::Error;

#[derive(Error, Debug)]
pub enum FsTreeError {
    #[error("tried to create a file that already exists: {0}")]
    Duplicate(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("query exhausted its path before reaching a terminal component")]
    QueryExhausted,
}

pub type Result<T> = std::result::Result<T, FsTreeError>;
