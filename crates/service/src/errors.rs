use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("upload rejected: {0}")]
    Upload(UploadRejection),
}

/// Why an uploaded file was refused; the HTTP layer maps each to its own status.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("file is empty")]
    Empty,
    #[error("file exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("unsupported content type {0}")]
    UnsupportedType(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn storage(e: impl std::fmt::Display) -> Self { Self::Storage(e.to_string()) }
}
