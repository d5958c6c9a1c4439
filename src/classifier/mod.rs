//! Classification service client.
//!
//! The engine only sees the [`Classifier`] trait: hand it a resource and a
//! prediction id, get back raw scores or a [`ClassifyError`]. Timeouts and
//! status-code mapping belong to the implementation.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::codec::RawResult;
use crate::model::{Correlation, PredictionId};

pub use http::{HttpClassifier, HttpClassifierConfig};

/// Closed set of failures from the classification service.
///
/// The `Display` form is recorded verbatim as a failed prediction's reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("bad input: {0}")]
    BadInput(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClassifyError {
    /// Short kind tag for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifyError::BadInput(_) => "bad_input",
            ClassifyError::Forbidden(_) => "forbidden",
            ClassifyError::NotFound(_) => "not_found",
            ClassifyError::Internal(_) => "internal",
        }
    }
}

/// A client that can classify one resource.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        resource: &str,
        prediction_id: PredictionId,
        correlation: &Correlation,
    ) -> Result<RawResult, ClassifyError>;
}
