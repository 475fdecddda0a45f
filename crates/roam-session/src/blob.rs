//! Whole-session blob storage.
//!
//! Some container integrations persist a session as one opaque serialized
//! blob keyed directly by identifier rather than attribute-by-attribute.
//! Identity resolution does not apply here: the container hands us the id it
//! considers authoritative.

use std::collections::BTreeSet;
use std::sync::Arc;

use roam_cache::CacheClient;

/// Default key prefix for whole-session blobs, kept disjoint from the
/// attribute namespace.
pub const DEFAULT_BLOB_PREFIX: &str = "SESSIONBLOB-";

/// Stores each session as a single opaque blob under `prefix + id`.
pub struct SessionBlobStore {
    cache: Arc<CacheClient>,
    prefix: String,
}

impl SessionBlobStore {
    pub fn new(cache: Arc<CacheClient>) -> Self {
        Self::with_prefix(cache, DEFAULT_BLOB_PREFIX)
    }

    pub fn with_prefix(cache: Arc<CacheClient>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    pub async fn load(&self, id: &str) -> Option<Vec<u8>> {
        self.cache.get(&self.key(id)).await
    }

    pub async fn save(&self, id: &str, blob: &[u8]) -> bool {
        self.cache.set(&self.key(id), blob).await
    }

    /// Save and bound the blob's lifetime, e.g. to the container's session
    /// timeout. Both steps are best-effort.
    pub async fn save_with_ttl(&self, id: &str, blob: &[u8], seconds: u64) -> bool {
        let key = self.key(id);
        self.cache.set(&key, blob).await && self.cache.expire(&key, seconds).await
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.cache.delete(&self.key(id)).await
    }

    /// Bare identifiers of every stored session.
    pub async fn ids(&self) -> BTreeSet<String> {
        self.cache
            .list_keys_by_prefix(&self.prefix)
            .await
            .iter()
            .filter_map(|key| key.strip_prefix(self.prefix.as_str()))
            .map(str::to_owned)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.cache.list_keys_by_prefix(&self.prefix).await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove every stored session blob.
    pub async fn clear(&self) -> usize {
        self.cache.delete_by_prefix(&self.prefix).await
    }
}
