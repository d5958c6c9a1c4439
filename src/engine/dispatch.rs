//! Prediction admission and dispatch.
//!
//! `submit` decides synchronously whether a prediction may start, creates
//! its pending record, and hands the classification call to a detached
//! task. The caller gets the pending record back without waiting on the
//! classification service.
//!
//! Admission is two checks. Capacity is an optimistic lock-free read of the
//! in-flight counter followed by an increment, so callers racing past the
//! read in the same instant can briefly overshoot the limit by at most the
//! number of racers. The dedup check is an atomic insert into the in-flight
//! resource set under its lock; a failed insert undoes the increment.

use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Instrument, Span, error, info, warn};

use super::guard::{AdmissionGuard, AdmissionState};
use crate::classifier::Classifier;
use crate::codec::ResultCodec;
use crate::error::{Error, Result};
use crate::model::{Correlation, Outcome, Prediction, PredictionId, RequestContext};
use crate::store::PredictionStore;
use crate::telemetry::metrics;
use crate::telemetry::prediction::{record_status, start_prediction_span};

/// Bounded-concurrency, single-attempt prediction dispatcher.
///
/// Construct once and clone the handle into request handlers; all clones
/// share the same admission state.
pub struct Dispatcher {
    store: Arc<dyn PredictionStore>,
    classifier: Arc<dyn Classifier>,
    codec: Arc<ResultCodec>,
    state: Arc<AdmissionState>,
}

impl Clone for Dispatcher {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            classifier: Arc::clone(&self.classifier),
            codec: Arc::clone(&self.codec),
            state: Arc::clone(&self.state),
        }
    }
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn PredictionStore>,
        classifier: Arc<dyn Classifier>,
        codec: ResultCodec,
        capacity: usize,
    ) -> Self {
        Self {
            store,
            classifier,
            codec: Arc::new(codec),
            state: Arc::new(AdmissionState::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.state.capacity
    }

    /// Predictions admitted and not yet released.
    pub fn in_flight(&self) -> usize {
        self.state.in_flight()
    }

    pub fn is_in_flight(&self, resource: &str) -> bool {
        self.state.is_in_flight(resource)
    }

    /// Admit a prediction for `resource` on behalf of `owner`.
    ///
    /// Returns the pending record as soon as it exists. Fails with
    /// [`Error::CapacityExceeded`] or [`Error::DuplicateInProgress`] without
    /// side effects, or with the store's own error if the pending record
    /// cannot be created (admission is rolled back).
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        owner: &str,
        resource: &str,
    ) -> Result<Prediction> {
        if resource.is_empty() {
            count_submission("invalid");
            return Err(Error::InvalidResource("resource must not be empty".to_string()));
        }

        if self.state.at_capacity() {
            count_submission("capacity_exceeded");
            return Err(Error::CapacityExceeded {
                limit: self.state.capacity,
            });
        }

        self.state.reserve_slot();
        if !self.state.claim_resource(resource) {
            self.state.unreserve_slot();
            count_submission("duplicate");
            return Err(Error::DuplicateInProgress(resource.to_string()));
        }

        // From here on the slot and key belong to the guard; dropping it on
        // any path below releases both.
        let guard = AdmissionGuard::new(Arc::clone(&self.state), resource.to_string());

        let pending = match self.store.create_pending(owner, resource).await {
            Ok(pending) => pending,
            Err(e) => {
                drop(guard);
                count_submission("error");
                warn!(resource, error = %e, "failed to create pending prediction");
                return Err(e);
            }
        };

        let correlation = Correlation::derive(ctx, pending.id);
        let span = start_prediction_span(resource, &correlation);
        let execution = Execution {
            store: Arc::clone(&self.store),
            classifier: Arc::clone(&self.classifier),
            codec: Arc::clone(&self.codec),
            resource: resource.to_string(),
            correlation,
            guard,
        };
        tokio::spawn(execution.run().instrument(span));

        count_submission("admitted");
        info!(id = %pending.id, resource, owner, "prediction admitted");
        Ok(pending)
    }

    /// Wait until nothing is in flight, including work admitted meanwhile.
    /// Admitted work is never cancelled.
    pub async fn drain(&self) {
        self.state.wait_idle().await;
    }
}

fn count_submission(result: &'static str) {
    metrics::predictions_submitted().add(1, &[KeyValue::new("result", result)]);
}

/// Everything one background unit of work needs, including its admission.
struct Execution {
    store: Arc<dyn PredictionStore>,
    classifier: Arc<dyn Classifier>,
    codec: Arc<ResultCodec>,
    resource: String,
    correlation: Correlation,
    guard: AdmissionGuard,
}

impl Execution {
    async fn run(self) {
        let Execution {
            store,
            classifier,
            codec,
            resource,
            correlation,
            guard,
        } = self;
        let id: PredictionId = correlation.prediction_id;

        let started = Instant::now();
        let result = classifier.classify(&resource, id, &correlation).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let outcome = match result {
            Ok(raw) => {
                metrics::classify_duration_ms().record(elapsed_ms, &[KeyValue::new("result", "ok")]);
                Outcome::Classified(codec.decode(&raw))
            }
            Err(e) => {
                metrics::classify_duration_ms()
                    .record(elapsed_ms, &[KeyValue::new("result", e.kind())]);
                warn!(kind = e.kind(), error = %e, "classification failed");
                Outcome::Failed(e.to_string())
            }
        };

        let status = outcome.status();
        match store.finalize(id, outcome).await {
            Ok(()) => {
                record_status(&Span::current(), status);
                metrics::predictions_finalized()
                    .add(1, &[KeyValue::new("status", status.as_str())]);
            }
            Err(e) => {
                // Not retried: the record stays `processing`.
                metrics::finalize_failures().add(1, &[]);
                error!(%id, resource = %resource, error = %e, "failed to finalize prediction");
            }
        }

        drop(guard);
    }
}
