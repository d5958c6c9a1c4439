//! Span helpers for background prediction execution.

use tracing::Span;

use crate::model::{Correlation, Status};

/// Span wrapping one unit of background work.
///
/// `prediction.status` is declared empty and filled by [`record_status`].
pub fn start_prediction_span(resource: &str, correlation: &Correlation) -> Span {
    tracing::info_span!(
        "prediction.execute",
        "prediction.id" = %correlation.prediction_id,
        "prediction.resource" = resource,
        "request.id" = %correlation.request_id,
        "prediction.status" = tracing::field::Empty,
    )
}

/// Record the terminal status on the span and emit a transition event.
pub fn record_status(span: &Span, status: Status) {
    span.record("prediction.status", status.as_str());
    span.in_scope(|| {
        tracing::info!(from = "processing", to = status.as_str(), "status_transition");
    });
}
