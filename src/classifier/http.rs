//! HTTP client for the external classification service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, warn};

use super::{Classifier, ClassifyError};
use crate::codec::RawResult;
use crate::error::{Error, Result};
use crate::model::{Correlation, PredictionId};

/// Connection settings for [`HttpClassifier`].
#[derive(Debug)]
pub struct HttpClassifierConfig {
    /// Base URL, e.g. `http://classifier:8080`.
    pub base_url: String,
    pub api_key: Option<SecretString>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

/// Request body sent to `POST {base_url}/classify`.
#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    resource: &'a str,
    prediction_id: String,
}

pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl HttpClassifier {
    pub fn new(config: HttpClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/classify", config.base_url.trim_end_matches('/')),
            api_key: config.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        resource: &str,
        prediction_id: PredictionId,
        correlation: &Correlation,
    ) -> std::result::Result<RawResult, ClassifyError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .headers(build_headers(correlation))
            .json(&ClassifyRequest {
                resource,
                prediction_id: prediction_id.to_string(),
            });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, resource, "classification service rejected request");
            return Err(map_status(status, &body));
        }

        response
            .json::<RawResult>()
            .await
            .map_err(|e| ClassifyError::Internal(format!("undecodable response: {e}")))
    }
}

/// Correlation headers as a `HeaderMap`. Invalid header names or values are
/// skipped, never fatal.
fn build_headers(correlation: &Correlation) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in correlation.header_pairs() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "dropping invalid correlation header"),
        }
    }
    headers
}

fn transport_error(e: reqwest::Error) -> ClassifyError {
    if e.is_timeout() {
        ClassifyError::Internal(format!("classification request timed out: {e}"))
    } else {
        ClassifyError::Internal(format!("classification request failed: {e}"))
    }
}

/// Map a non-success status to the closed error set.
fn map_status(status: StatusCode, body: &str) -> ClassifyError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ClassifyError::BadInput(detail)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClassifyError::Forbidden(detail),
        StatusCode::NOT_FOUND => ClassifyError::NotFound(detail),
        _ => ClassifyError::Internal(detail),
    }
}
