use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::feedback::Feedback;
use crate::models::history::{merge_row, StoredRow};
use crate::store::{DocumentStore, StoreError};

struct StoredDoc {
    id: Uuid,
    uid: String,
    payload: Value,
    created_at: DateTime<Utc>,
}

/// In-process store used when no database is configured. Contents die with the process.
#[derive(Default)]
pub struct MemoryDocumentStore {
    history: Mutex<Vec<StoredDoc>>,
    feedback: Mutex<Vec<Feedback>>,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `Unavailable` until switched back.
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub async fn feedback_count(&self) -> usize {
        self.feedback.lock().await.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch_history(&self, owner: &str) -> Result<Vec<Value>, StoreError> {
        self.check_available()?;
        let docs = self.history.lock().await;
        let mut owned: Vec<&StoredDoc> = docs.iter().filter(|d| d.uid == owner).collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned
            .into_iter()
            .map(|d| merge_row(d.id, &d.uid, d.created_at, d.payload.clone()))
            .collect())
    }

    async fn insert_history(&self, owner: &str, payload: &Value) -> Result<StoredRow, StoreError> {
        self.check_available()?;
        let mut docs = self.history.lock().await;
        // Keep creation times strictly increasing so newest-first order is total.
        let now = Utc::now();
        let created_at = match docs.iter().map(|d| d.created_at).max() {
            Some(last) if last >= now => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        let row = StoredRow {
            id: Uuid::new_v4(),
            created_at,
        };
        docs.push(StoredDoc {
            id: row.id,
            uid: owner.to_string(),
            payload: payload.clone(),
            created_at,
        });
        Ok(row)
    }

    async fn delete_history(&self, owner: &str, id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut docs = self.history.lock().await;
        let before = docs.len();
        docs.retain(|d| !(d.uid == owner && d.id.to_string() == id));
        if docs.len() == before {
            return Err(StoreError::NotFound(format!("History item {id} not found")));
        }
        Ok(())
    }

    async fn clear_history(&self, owner: &str) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut docs = self.history.lock().await;
        let before = docs.len();
        docs.retain(|d| d.uid != owner);
        Ok((before - docs.len()) as u64)
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StoreError> {
        self.check_available()?;
        self.feedback.lock().await.push(feedback.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_is_scoped_and_newest_first() {
        let store = MemoryDocumentStore::new();
        let first = store.insert_history("alice", &json!({"skill_match": 1})).await.unwrap();
        store.insert_history("bob", &json!({"skill_match": 2})).await.unwrap();
        let second = store.insert_history("alice", &json!({"skill_match": 3})).await.unwrap();

        let rows = store.fetch_history("alice").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], second.id.to_string());
        assert_eq!(rows[1]["id"], first.id.to_string());
        assert_eq!(rows[0]["uid"], "alice");
    }

    #[tokio::test]
    async fn test_delete_requires_matching_owner() {
        let store = MemoryDocumentStore::new();
        let row = store.insert_history("alice", &json!({})).await.unwrap();
        let id = row.id.to_string();

        assert!(matches!(
            store.delete_history("bob", &id).await,
            Err(StoreError::NotFound(_))
        ));
        store.delete_history("alice", &id).await.unwrap();
        assert!(store.fetch_history("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_only_touches_owner() {
        let store = MemoryDocumentStore::new();
        store.insert_history("alice", &json!({})).await.unwrap();
        store.insert_history("alice", &json!({})).await.unwrap();
        store.insert_history("bob", &json!({})).await.unwrap();

        assert_eq!(store.clear_history("alice").await.unwrap(), 2);
        assert_eq!(store.fetch_history("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_reads() {
        let store = MemoryDocumentStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.fetch_history("alice").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
