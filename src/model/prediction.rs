//! Prediction records.
//!
//! A prediction is one admitted classification request: who asked for it,
//! which resource it classifies, and where it is in its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// A classification request tracked by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Assigned by the store when the pending record is created.
    pub id: PredictionId,

    /// Identity of the requester. Opaque to the engine.
    pub owner: String,

    /// Locator of the input to classify (e.g. an object-storage path).
    /// Doubles as the dedup key while the prediction is in flight.
    pub resource: String,

    pub status: Status,

    /// Set when the prediction completed successfully.
    pub label: Option<Label>,

    /// Failure reason when the prediction failed.
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Newtype for prediction IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictionId(pub Uuid);

impl PredictionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PredictionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PredictionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PredictionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(PredictionId)
            .map_err(|e| Error::Other(format!("invalid prediction id {s:?}: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Admitted, classification not yet finalized.
    Processing,
    /// Classified successfully. Terminal.
    Completed,
    /// Classification failed. Terminal.
    Failed,
}

impl Status {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: Status) -> bool {
        use Status::*;
        matches!((self, to), (Processing, Completed) | (Processing, Failed))
    }

    /// Is this a terminal status?
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Processing => "processing",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Status::Processing),
            "completed" => Ok(Status::Completed),
            "failed" => Ok(Status::Failed),
            other => Err(Error::Other(format!("unknown prediction status: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Label + Outcome
// ---------------------------------------------------------------------------

/// Domain result of a classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Label {
    /// The winning category and its confidence score.
    Category {
        index: u32,
        name: String,
        confidence: f64,
    },
    /// The service returned no score mapping at all.
    Undefined,
}

impl Label {
    pub const UNDEFINED: &'static str = "undefined";

    /// Text form stored alongside the record.
    pub fn name(&self) -> &str {
        match self {
            Label::Category { name, .. } => name,
            Label::Undefined => Self::UNDEFINED,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal outcome written by `finalize`. Exactly one of result or reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Classified(Label),
    Failed(String),
}

impl Outcome {
    /// The status this outcome moves a prediction into.
    pub fn status(&self) -> Status {
        match self {
            Outcome::Classified(_) => Status::Completed,
            Outcome::Failed(_) => Status::Failed,
        }
    }
}
