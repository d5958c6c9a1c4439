//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or
//! malformed. Sensitive values wrapped in secrecy::SecretString to prevent
//! log leaks.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use secrecy::SecretString;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub classifier_url: String,
    pub classifier_api_key: Option<SecretString>,
    pub classifier_timeout: Duration,
    /// Capacity limit: predictions allowed in flight at once.
    pub max_in_flight: usize,
    /// Optional TOML label table for the result codec.
    pub labels_path: Option<PathBuf>,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;
    pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 30;

    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let max_in_flight =
            parsed_var("MAX_IN_FLIGHT")?.unwrap_or(Self::DEFAULT_MAX_IN_FLIGHT);
        if max_in_flight == 0 {
            return Err(Error::Config("MAX_IN_FLIGHT must be at least 1".to_string()));
        }

        let timeout_secs = parsed_var("CLASSIFIER_TIMEOUT_SECS")?
            .unwrap_or(Self::DEFAULT_CLASSIFIER_TIMEOUT_SECS);

        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            classifier_url: required_var("CLASSIFIER_URL")?,
            classifier_api_key: optional_var("CLASSIFIER_API_KEY").map(SecretString::from),
            classifier_timeout: Duration::from_secs(timeout_secs),
            max_in_flight,
            labels_path: optional_var("LABELS_PATH").map(PathBuf::from),
            otel_endpoint: optional_var("OTEL_ENDPOINT"),
            log_level: optional_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    optional_var(name)
        .ok_or_else(|| Error::Config(format!("required environment variable {name} is not set")))
}

/// Unset and empty are the same thing.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::Config(format!("invalid {name}={raw:?}: {e}")))
        })
        .transpose()
}
