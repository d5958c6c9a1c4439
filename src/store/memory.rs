//! In-process prediction store for tests and local runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::PredictionStore;
use crate::error::{Error, Result};
use crate::model::{Outcome, Prediction, PredictionId, Status};

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<PredictionId, Prediction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records with the given status.
    pub fn list_by_status(&self, status: Status) -> Vec<Prediction> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<_> = records
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect();
        out.sort_by_key(|p| p.created_at);
        out
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PredictionStore for MemoryStore {
    async fn create_pending(&self, owner: &str, resource: &str) -> Result<Prediction> {
        let now = Utc::now();
        let prediction = Prediction {
            id: PredictionId::new(),
            owner: owner.to_string(),
            resource: resource.to_string(),
            status: Status::Processing,
            label: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert(prediction.id, prediction.clone());
        Ok(prediction)
    }

    async fn finalize(&self, id: PredictionId, outcome: Outcome) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let record = records
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let to = outcome.status();
        if !record.status.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: record.status.to_string(),
                to: to.to_string(),
            });
        }

        let now = Utc::now();
        record.status = to;
        record.updated_at = now;
        record.completed_at = Some(now);
        match outcome {
            Outcome::Classified(label) => record.label = Some(label),
            Outcome::Failed(reason) => record.error = Some(reason),
        }
        Ok(())
    }

    async fn get(&self, id: PredictionId) -> Result<Prediction> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}
