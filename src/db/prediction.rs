//! Prediction records in Postgres: the `PredictionStore` implementation
//! plus the read path used by operators.

use async_trait::async_trait;
use uuid::Uuid;

use super::Db;
use crate::error::{Error, Result};
use crate::model::{Label, Outcome, Prediction, PredictionId, Status};
use crate::store::PredictionStore;

const COLUMNS: &str = "id, owner, resource, status, label, category_index, confidence, error, created_at, updated_at, completed_at";

#[async_trait]
impl PredictionStore for Db {
    async fn create_pending(&self, owner: &str, resource: &str) -> Result<Prediction> {
        let row: PredictionRow = sqlx::query_as(&format!(
            "INSERT INTO predictions (id, owner, resource, status)
             VALUES ($1, $2, $3, 'processing')
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(resource)
        .fetch_one(self.pool())
        .await?;

        row.try_into_prediction()
    }

    async fn finalize(&self, id: PredictionId, outcome: Outcome) -> Result<()> {
        let to = outcome.status();
        let (label, category_index, confidence, error) = match &outcome {
            Outcome::Classified(Label::Category {
                index,
                name,
                confidence,
            }) => (
                Some(name.clone()),
                Some(*index as i32),
                Some(*confidence),
                None,
            ),
            Outcome::Classified(Label::Undefined) => {
                (Some(Label::UNDEFINED.to_string()), None, None, None)
            }
            Outcome::Failed(reason) => (None, None, None, Some(reason.clone())),
        };

        let rows_affected = sqlx::query(
            "UPDATE predictions
             SET status = $1, label = $2, category_index = $3, confidence = $4, error = $5,
                 updated_at = now(), completed_at = now()
             WHERE id = $6 AND status = 'processing'",
        )
        .bind(to.as_str())
        .bind(label)
        .bind(category_index)
        .bind(confidence)
        .bind(error)
        .bind(id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows_affected == 0 {
            // Either the id is unknown or the record is already terminal.
            let current: Option<(String,)> =
                sqlx::query_as("SELECT status FROM predictions WHERE id = $1")
                    .bind(id.0)
                    .fetch_optional(self.pool())
                    .await?;
            return Err(match current {
                None => Error::NotFound(id.to_string()),
                Some((from,)) => Error::InvalidTransition {
                    from,
                    to: to.to_string(),
                },
            });
        }

        Ok(())
    }

    async fn get(&self, id: PredictionId) -> Result<Prediction> {
        self.get_prediction(id).await
    }
}

impl Db {
    /// Get a prediction by ID.
    pub async fn get_prediction(&self, id: PredictionId) -> Result<Prediction> {
        let row: Option<PredictionRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM predictions WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(self.pool())
                .await?;

        row.ok_or_else(|| Error::NotFound(id.to_string()))?
            .try_into_prediction()
    }

    /// List predictions, newest first, optionally filtered by status and owner.
    pub async fn list_predictions(
        &self,
        status: Option<Status>,
        owner: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Prediction>> {
        let rows: Vec<PredictionRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM predictions
             WHERE ($1::text IS NULL OR status = $1)
             AND ($2::text IS NULL OR owner = $2)
             ORDER BY created_at DESC
             LIMIT $3"
        ))
        .bind(status.map(Status::as_str))
        .bind(owner)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(PredictionRow::try_into_prediction)
            .collect()
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct PredictionRow {
    id: Uuid,
    owner: String,
    resource: String,
    status: String,
    label: Option<String>,
    category_index: Option<i32>,
    confidence: Option<f64>,
    error: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl PredictionRow {
    fn try_into_prediction(self) -> Result<Prediction> {
        let label = match (self.label, self.category_index) {
            (Some(name), Some(index)) => Some(Label::Category {
                index: index as u32,
                name,
                confidence: self.confidence.unwrap_or_default(),
            }),
            (Some(_), None) => Some(Label::Undefined),
            (None, _) => None,
        };

        Ok(Prediction {
            id: PredictionId(self.id),
            owner: self.owner,
            resource: self.resource,
            status: self.status.parse()?,
            label,
            error: self.error,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        })
    }
}
