use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::feedback::Feedback;
use crate::models::history::{HistoryRow, StoredRow};
use crate::store::{DocumentStore, StoreError};

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Connects, then applies the embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }
}

/// Ids are UUIDs in this store; anything else cannot name a row.
fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| StoreError::NotFound(format!("History item {id} not found")))
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn fetch_history(&self, owner: &str) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT id, uid, payload, created_at FROM analysis_history WHERE uid = $1 ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        debug!("Fetched {} history rows for {owner}", rows.len());
        Ok(rows.into_iter().map(HistoryRow::into_raw).collect())
    }

    async fn insert_history(&self, owner: &str, payload: &Value) -> Result<StoredRow, StoreError> {
        let (id, created_at) = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            "INSERT INTO analysis_history (uid, payload) VALUES ($1, $2) RETURNING id, created_at",
        )
        .bind(owner)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(StoredRow { id, created_at })
    }

    async fn delete_history(&self, owner: &str, id: &str) -> Result<(), StoreError> {
        let row_id = parse_id(id)?;
        let result = sqlx::query("DELETE FROM analysis_history WHERE id = $1 AND uid = $2")
            .bind(row_id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("History item {id} not found")));
        }
        Ok(())
    }

    async fn clear_history(&self, owner: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM analysis_history WHERE uid = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO feedback (uid, kind, rating, text) VALUES ($1, $2, $3, $4)")
            .bind(&feedback.uid)
            .bind(feedback.kind.as_str())
            .bind(i16::from(feedback.rating))
            .bind(&feedback.text)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
