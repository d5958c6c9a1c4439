//! Metric instruments for the prediction engine.
//!
//! All instruments come from the `"predict-rs"` meter on the global
//! `MeterProvider`; without a provider installed they are no-ops.

use opentelemetry::metrics::{Counter, Histogram, Meter, UpDownCounter};

fn meter() -> Meter {
    opentelemetry::global::meter("predict-rs")
}

/// Counter: submissions.
/// Labels: `result` ("admitted" | "capacity_exceeded" | "duplicate" | "invalid" | "error").
pub fn predictions_submitted() -> Counter<u64> {
    meter()
        .u64_counter("predict.submitted")
        .with_description("Number of prediction submissions by admission result")
        .build()
}

/// Counter: predictions that reached a terminal status.
/// Labels: `status` ("completed" | "failed").
pub fn predictions_finalized() -> Counter<u64> {
    meter()
        .u64_counter("predict.finalized")
        .with_description("Number of predictions finalized")
        .build()
}

/// Counter: finalize writes that failed and left a record in `processing`.
pub fn finalize_failures() -> Counter<u64> {
    meter()
        .u64_counter("predict.finalize_failures")
        .with_description("Finalize writes that failed; the record stays processing")
        .build()
}

/// Up/down counter: predictions admitted and not yet released.
pub fn in_flight() -> UpDownCounter<i64> {
    meter()
        .i64_up_down_counter("predict.in_flight")
        .with_description("Predictions currently in flight")
        .build()
}

/// Histogram: classification call latency in milliseconds.
/// Labels: `result` ("ok" | error kind).
pub fn classify_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("predict.classify.duration_ms")
        .with_description("Classification service call duration")
        .with_unit("ms")
        .build()
}
