//! Core data model.

pub mod context;
pub mod prediction;

pub use context::{Correlation, RequestContext};
pub use prediction::{Label, Outcome, Prediction, PredictionId, Status};
