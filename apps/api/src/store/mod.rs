//! Document store adapter — where per-user history rows and feedback live.
//!
//! `AppState` carries an `Arc<dyn DocumentStore>`: PostgreSQL when `DATABASE_URL` is set,
//! the in-process memory store otherwise.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::feedback::Feedback;
use crate::models::history::StoredRow;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Raw payloads for every row owned by `owner`, newest first.
    /// Each payload carries `id`, `uid` and `created_at` from the row.
    async fn fetch_history(&self, owner: &str) -> Result<Vec<Value>, StoreError>;

    /// Persists one analysis document; the store assigns id and creation time.
    async fn insert_history(&self, owner: &str, payload: &Value) -> Result<StoredRow, StoreError>;

    /// Deletes one row. `NotFound` if `owner` has no row with that id.
    async fn delete_history(&self, owner: &str, id: &str) -> Result<(), StoreError>;

    /// Deletes every row owned by `owner`, returning how many went.
    async fn clear_history(&self, owner: &str) -> Result<u64, StoreError>;

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StoreError>;
}
