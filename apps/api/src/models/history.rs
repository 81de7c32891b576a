use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// Keys that belong to the row rather than the stored document.
const ROW_OWNED_KEYS: [&str; 5] = ["id", "uid", "created_at", "timestamp", "resume_text"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryRow {
    pub id: Uuid,
    pub uid: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl HistoryRow {
    /// Merges the stored document with the row columns into a raw payload for the normalizer.
    pub fn into_raw(self) -> Value {
        merge_row(self.id, &self.uid, self.created_at, self.payload)
    }
}

/// Identity assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

pub fn merge_row(id: Uuid, uid: &str, created_at: DateTime<Utc>, payload: Value) -> Value {
    let mut doc = match payload {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    doc.insert("id".to_string(), Value::String(id.to_string()));
    doc.insert("uid".to_string(), Value::String(uid.to_string()));
    doc.insert("created_at".to_string(), Value::String(created_at.to_rfc3339()));
    Value::Object(doc)
}

/// Strips the keys the row owns so a document never contradicts its own columns.
pub fn storable_payload(record: Value) -> Value {
    match record {
        Value::Object(mut map) => {
            for key in ROW_OWNED_KEYS {
                map.remove(key);
            }
            Value::Object(map)
        }
        other => other,
    }
}
