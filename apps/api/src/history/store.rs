use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::analysis::normalize::normalize;
use crate::history::HistoryError;
use crate::models::analysis::AnalysisRecord;
use crate::store::DocumentStore;

/// Immutable, ordered (most recent first) view of one user's history.
pub type Snapshot = Arc<[AnalysisRecord]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { records: usize },
    /// A newer refresh or local change landed first, or the session changed owner.
    Discarded,
}

struct StoreState {
    owner: Option<String>,
    records: Snapshot,
    /// Sequence number of the last change that replaced `records`.
    applied: u64,
}

/// Holds the latest history snapshot for one session owner.
///
/// Every change replaces the snapshot whole, so readers holding an older `Snapshot`
/// are never exposed to a half-applied update. Refreshes and local changes draw from one
/// monotonically increasing sequence; a refresh only lands if nothing newer has.
pub struct HistoryStore {
    state: RwLock<StoreState>,
    sequence: AtomicU64,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self {
            state: RwLock::new(StoreState {
                owner: None,
                records: Arc::from(Vec::new()),
                applied: 0,
            }),
            sequence: AtomicU64::new(0),
        }
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Starts a session for `owner` with an empty snapshot. Pending refreshes are discarded.
    pub async fn begin_session(&self, owner: &str) {
        let mut state = self.state.write().await;
        state.owner = Some(owner.to_string());
        state.records = Arc::from(Vec::new());
        state.applied = self.next_sequence();
    }

    /// Drops the snapshot. Pending refreshes are discarded.
    pub async fn end_session(&self) {
        let mut state = self.state.write().await;
        state.owner = None;
        state.records = Arc::from(Vec::new());
        state.applied = self.next_sequence();
    }

    pub async fn owner(&self) -> Option<String> {
        self.state.read().await.owner.clone()
    }

    pub async fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.state.read().await.records)
    }

    /// Replaces the snapshot with the store's rows for the current owner.
    ///
    /// On failure the previous snapshot stays in place and the error is returned for the
    /// caller to surface once. No retry is attempted here.
    pub async fn refresh(&self, store: &dyn DocumentStore) -> Result<RefreshOutcome, HistoryError> {
        let owner = self.owner().await.ok_or(HistoryError::NoSession)?;
        let seq = self.next_sequence();

        let rows = store.fetch_history(&owner).await.map_err(|e| {
            warn!("History refresh for {owner} failed: {e}");
            HistoryError::Store(e)
        })?;

        let records: Vec<AnalysisRecord> = rows
            .iter()
            .map(|raw| normalize(raw).owned_by(&owner))
            .filter(|record| {
                let belongs = record.owner.as_deref() == Some(owner.as_str());
                if !belongs {
                    warn!("Skipping history row owned by {:?}", record.owner);
                }
                belongs
            })
            .collect();

        let mut state = self.state.write().await;
        if state.owner.as_deref() != Some(owner.as_str()) || seq <= state.applied {
            debug!("Discarding stale history refresh #{seq} for {owner}");
            return Ok(RefreshOutcome::Discarded);
        }
        let count = records.len();
        state.records = Arc::from(records);
        state.applied = seq;
        info!("History refreshed for {owner}: {count} records");
        Ok(RefreshOutcome::Applied { records: count })
    }

    fn ensure_owner(state: &StoreState, record_owner: Option<&str>) -> Result<(), HistoryError> {
        let current = state.owner.as_deref().ok_or(HistoryError::NoSession)?;
        if record_owner != Some(current) {
            return Err(HistoryError::OwnerMismatch {
                expected: current.to_string(),
                found: record_owner.map(str::to_string),
            });
        }
        Ok(())
    }

    /// Puts a freshly saved record at the front, keeping newest-first order.
    pub async fn append(&self, record: AnalysisRecord) -> Result<(), HistoryError> {
        let mut state = self.state.write().await;
        Self::ensure_owner(&state, record.owner.as_deref())?;

        let mut next = Vec::with_capacity(state.records.len() + 1);
        next.push(record);
        next.extend(state.records.iter().cloned());
        state.records = Arc::from(next);
        state.applied = self.next_sequence();
        Ok(())
    }

    /// Removes the record with `id` after the store confirmed the delete.
    /// Returns whether anything was removed.
    pub async fn remove(&self, id: &str) -> Result<bool, HistoryError> {
        let mut state = self.state.write().await;
        if state.owner.is_none() {
            return Err(HistoryError::NoSession);
        }
        let next: Vec<AnalysisRecord> = state
            .records
            .iter()
            .filter(|r| r.id.as_deref() != Some(id))
            .cloned()
            .collect();
        let removed = next.len() != state.records.len();
        state.records = Arc::from(next);
        state.applied = self.next_sequence();
        Ok(removed)
    }

    /// Empties the snapshot after the store confirmed a bulk clear.
    pub async fn clear(&self) -> Result<(), HistoryError> {
        let mut state = self.state.write().await;
        if state.owner.is_none() {
            return Err(HistoryError::NoSession);
        }
        state.records = Arc::from(Vec::new());
        state.applied = self.next_sequence();
        Ok(())
    }
}
