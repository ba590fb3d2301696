use thiserror::Error;

use crate::ingest::schema::MappingRequest;

#[derive(Error, Debug)]
pub enum ShengciError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Empty input file: {0}")]
    EmptyFile(String),

    #[error("Could not decode {0} with any supported encoding")]
    UndecodableFile(String),

    #[error("Could not match the header row of {}", .0.file)]
    NeedsMapping(Box<MappingRequest>),

    #[error("Failed to load file: {0}")]
    FailedToLoadFile(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("ShengciError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for ShengciError {
    fn from(error: std::io::Error) -> Self {
        ShengciError::Io(Box::new(error))
    }
}
