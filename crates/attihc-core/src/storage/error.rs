use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Why an import was rejected. Nothing is written when this is returned.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Import is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Import must be a JSON object keyed by date")]
    NotAnObject,

    #[error("Failed to save imported days: {0}")]
    Storage(#[from] StorageError),
}
