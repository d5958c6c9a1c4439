//! Persistence contract for prediction records.
//!
//! The engine creates a pending record at admission and finalizes it from
//! background execution. Storage failures are the store's to report; the
//! engine passes them through untouched.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Outcome, Prediction, PredictionId};

pub use memory::MemoryStore;

#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Create a `Processing` record for `(owner, resource)` and assign its id.
    async fn create_pending(&self, owner: &str, resource: &str) -> Result<Prediction>;

    /// Write the terminal outcome. Fails with `NotFound` for an unknown id and
    /// `InvalidTransition` if the record already left `Processing`.
    async fn finalize(&self, id: PredictionId, outcome: Outcome) -> Result<()>;

    async fn get(&self, id: PredictionId) -> Result<Prediction>;
}
