use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::history::store::HistoryStore;

/// One `HistoryStore` per logged-in owner.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<HistoryStore>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the owner's store, creating a fresh session if there is none.
    pub async fn open(&self, owner: &str) -> Arc<HistoryStore> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(owner) {
            return Arc::clone(existing);
        }
        let store = Arc::new(HistoryStore::new());
        store.begin_session(owner).await;
        sessions.insert(owner.to_string(), Arc::clone(&store));
        info!("Opened history session for {owner}");
        store
    }

    pub async fn get(&self, owner: &str) -> Option<Arc<HistoryStore>> {
        self.sessions.read().await.get(owner).cloned()
    }

    /// Ends and drops the owner's session. Returns false if there was none.
    pub async fn close(&self, owner: &str) -> bool {
        let removed = self.sessions.write().await.remove(owner);
        match removed {
            Some(store) => {
                store.end_session().await;
                info!("Closed history session for {owner}");
                true
            }
            None => false,
        }
    }
}
