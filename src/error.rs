//! Error types for predict-rs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Admission rejected: the in-flight counter is at or above the limit.
    #[error("capacity exceeded: {limit} predictions already in flight")]
    CapacityExceeded { limit: usize },

    /// Admission rejected: the same resource is already being classified.
    #[error("prediction already in progress for {0}")]
    DuplicateInProgress(String),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("prediction not found: {0}")]
    NotFound(String),

    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for the synchronous admission rejections (capacity, duplicate).
    ///
    /// Callers map these to "retry later" / "conflict" responses; everything
    /// else from `submit` is an internal failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::CapacityExceeded { .. } | Error::DuplicateInProgress(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
