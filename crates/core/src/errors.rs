use thiserror::Error;

use crate::conflict::ConflictReport;

#[derive(Error, Debug)]
pub enum JadwalError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schedule conflict: {}", .0.summary())]
    Conflict(ConflictReport),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type JadwalResult<T> = Result<T, JadwalError>;
