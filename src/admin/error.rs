use std::path::{Path, PathBuf};

use crate::types::CactusError;
use thiserror::Error;

/// Error type for administrative operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// File not found at the specified path.
    #[error("file not found: {0}")]
    MissingFile(PathBuf),
    /// Core link storage error.
    #[error(transparent)]
    Core(#[from] CactusError),
    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Flower context could not be parsed.
    #[error("invalid flower context: {0}")]
    Context(#[from] serde_json::Error),
}

/// Result type alias for administrative operations.
pub type Result<T> = std::result::Result<T, AdminError>;

impl AdminError {
    pub(crate) fn missing_file(path: impl AsRef<Path>) -> Self {
        AdminError::MissingFile(path.as_ref().to_path_buf())
    }
}
