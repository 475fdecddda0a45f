//! Per-session numbered record storage.
//!
//! Backs paginated UI state: each session owns a sequence of numbered opaque
//! records (one per rendered page version). Keys are
//! `prefix ÷ sessionId ÷ recordId`, so removing a session's records is a
//! prefix delete.

use std::sync::Arc;

use roam_cache::CacheClient;

use crate::keys::KeyNamespace;

/// Default namespace for page records, disjoint from session attributes.
pub const DEFAULT_RECORD_PREFIX: &str = "page";

/// Numbered-record store for paginated UI state.
pub struct RecordStore {
    cache: Arc<CacheClient>,
    keys: KeyNamespace,
}

impl RecordStore {
    pub fn new(cache: Arc<CacheClient>) -> Self {
        Self::with_namespace(cache, KeyNamespace::new(DEFAULT_RECORD_PREFIX, "-"))
    }

    pub fn with_namespace(cache: Arc<CacheClient>, keys: KeyNamespace) -> Self {
        Self { cache, keys }
    }

    pub async fn get(&self, session_id: &str, record_id: u64) -> Option<Vec<u8>> {
        self.cache
            .get(&self.keys.attribute_key(session_id, &record_id.to_string()))
            .await
    }

    pub async fn store(&self, session_id: &str, record_id: u64, data: &[u8]) -> bool {
        self.cache
            .set(&self.keys.attribute_key(session_id, &record_id.to_string()), data)
            .await
    }

    pub async fn remove(&self, session_id: &str, record_id: u64) -> bool {
        self.cache
            .delete(&self.keys.attribute_key(session_id, &record_id.to_string()))
            .await
    }

    /// Remove every record of one session.
    pub async fn remove_all(&self, session_id: &str) -> usize {
        self.cache
            .delete_by_prefix(&self.keys.session_prefix(session_id))
            .await
    }

    /// Release the underlying connection pools.
    pub fn destroy(&self) {
        self.cache.destroy();
    }
}
