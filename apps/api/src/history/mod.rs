// History sessions: the per-user snapshot shell over the document store,
// plus the HTTP handlers that drive it.

pub mod handlers;
pub mod sessions;
pub mod store;
pub mod submit;

use thiserror::Error;

use crate::store::StoreError;

pub use sessions::SessionRegistry;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("No active history session")]
    NoSession,

    #[error("Record owner {found:?} does not match session owner '{expected}'")]
    OwnerMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
