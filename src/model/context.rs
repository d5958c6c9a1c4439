//! Request correlation.
//!
//! The caller of `submit` captures what it knows about the inbound request;
//! background execution turns that into a [`Correlation`] so the external
//! call and its logs can be tied back to the request that admitted them.

use uuid::Uuid;

use super::prediction::PredictionId;

/// What the request-handling layer knows about the inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Trace/request identifier from the inbound request, if any.
    pub request_id: Option<String>,
    /// Extra headers to pass through to the classification service
    /// (e.g. `traceparent`).
    pub forwarded: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn forward(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.forwarded.push((name.into(), value.into()));
        self
    }
}

/// Correlation data attached to one classification call.
#[derive(Debug, Clone)]
pub struct Correlation {
    pub request_id: String,
    pub prediction_id: PredictionId,
    pub headers: Vec<(String, String)>,
}

impl Correlation {
    pub const REQUEST_ID_HEADER: &'static str = "X-Request-ID";
    pub const PREDICTION_ID_HEADER: &'static str = "X-Prediction-ID";

    /// Derive correlation for `prediction_id` from the inbound context.
    /// A request without an identifier gets a fresh one.
    pub fn derive(ctx: &RequestContext, prediction_id: PredictionId) -> Self {
        let request_id = ctx
            .request_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            request_id,
            prediction_id,
            headers: ctx.forwarded.clone(),
        }
    }

    /// All headers to send with the external call, correlation ids first.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.headers.len() + 2);
        pairs.push((Self::REQUEST_ID_HEADER.to_string(), self.request_id.clone()));
        pairs.push((
            Self::PREDICTION_ID_HEADER.to_string(),
            self.prediction_id.to_string(),
        ));
        pairs.extend(self.headers.iter().cloned());
        pairs
    }
}
