use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    DuplicateRecord,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Traversal timed out after {0:?}")]
    Timeout(Duration),

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
