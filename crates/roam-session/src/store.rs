//! The session attribute store facade.
//!
//! Ties identity resolution, key namespacing, and the cache client together
//! behind the byte-level [`KeyedAttributeStore`] contract that adapter layers
//! (servlet bridges, UI page stores) program against. Callers only ever see
//! "present", "absent", or an ok/failed boolean; backend outages make a
//! session behave as freshly created instead of failing the request.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use roam_cache::{CacheClient, ValueCodec};

use crate::context::SessionContext;
use crate::keys::KeyNamespace;
use crate::resolver::{Resolution, SessionIdentityResolver};

/// Byte-level attribute store contract exposed to adapter layers.
#[async_trait]
pub trait KeyedAttributeStore: Send + Sync {
    /// Fetch one attribute; `None` for miss, unresolved identity, decode
    /// failure, or backend outage alike.
    async fn get(&self, ctx: &SessionContext, name: &str) -> Option<Vec<u8>>;

    /// Store one attribute; `false` when the write did not happen. Callers
    /// must not assume durability of a single call.
    async fn set(&self, ctx: &SessionContext, name: &str, value: &[u8]) -> bool;

    /// Remove one attribute.
    async fn remove(&self, ctx: &SessionContext, name: &str) -> bool;

    /// Enumerate the bare attribute names of the request's session.
    async fn list_names(&self, ctx: &SessionContext) -> BTreeSet<String>;

    /// Remove every attribute of the request's session.
    async fn clear(&self, ctx: &SessionContext) -> bool;

    /// Release the underlying connection pools.
    async fn destroy(&self);
}

/// Session attribute store over a shared replicated cache.
pub struct SessionAttributeStore {
    cache: Arc<CacheClient>,
    keys: KeyNamespace,
    resolver: SessionIdentityResolver,
}

impl SessionAttributeStore {
    /// Store over the default namespace.
    pub fn new(cache: Arc<CacheClient>) -> Self {
        Self::with_namespace(cache, KeyNamespace::default())
    }

    pub fn with_namespace(cache: Arc<CacheClient>, keys: KeyNamespace) -> Self {
        let resolver = SessionIdentityResolver::new(cache.clone(), keys.clone());
        Self {
            cache,
            keys,
            resolver,
        }
    }

    /// The identity resolver this store routes through.
    pub fn resolver(&self) -> &SessionIdentityResolver {
        &self.resolver
    }

    /// Remove every entry in this store's namespace: all sessions' attributes
    /// and all alias mappings. Returns the number of entries removed.
    pub async fn clear_all(&self) -> usize {
        self.cache
            .delete_by_prefix(&self.keys.store_prefix())
            .await
    }

    /// Typed read through a codec; decode failure counts as a miss.
    pub async fn get_value<C: ValueCodec>(
        &self,
        ctx: &SessionContext,
        name: &str,
        codec: &C,
    ) -> Option<C::Value> {
        let raw = self.get(ctx, name).await?;
        match codec.decode(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(name, error = %err, "stored attribute failed to decode; treating as miss");
                None
            }
        }
    }

    /// Typed write through a codec; encode failure counts as a failed write.
    pub async fn set_value<C: ValueCodec>(
        &self,
        ctx: &SessionContext,
        name: &str,
        codec: &C,
        value: &C::Value,
    ) -> bool {
        match codec.encode(value) {
            Ok(raw) => self.set(ctx, name, &raw).await,
            Err(err) => {
                debug!(name, error = %err, "attribute failed to encode; dropping write");
                false
            }
        }
    }

    async fn resolve(&self, ctx: &SessionContext) -> Option<String> {
        match self.resolver.resolve(ctx).await {
            Resolution::Canonical(id) => Some(id),
            Resolution::Unresolved => None,
        }
    }
}

#[async_trait]
impl KeyedAttributeStore for SessionAttributeStore {
    async fn get(&self, ctx: &SessionContext, name: &str) -> Option<Vec<u8>> {
        let canonical = self.resolve(ctx).await?;
        self.cache
            .get(&self.keys.attribute_key(&canonical, name))
            .await
    }

    async fn set(&self, ctx: &SessionContext, name: &str, value: &[u8]) -> bool {
        let Some(canonical) = self.resolve(ctx).await else {
            return false;
        };
        self.cache
            .set(&self.keys.attribute_key(&canonical, name), value)
            .await
    }

    async fn remove(&self, ctx: &SessionContext, name: &str) -> bool {
        let Some(canonical) = self.resolve(ctx).await else {
            return false;
        };
        self.cache
            .delete(&self.keys.attribute_key(&canonical, name))
            .await
    }

    async fn list_names(&self, ctx: &SessionContext) -> BTreeSet<String> {
        let Some(canonical) = self.resolve(ctx).await else {
            return BTreeSet::new();
        };
        self.cache
            .list_keys_by_prefix(&self.keys.session_prefix(&canonical))
            .await
            .iter()
            .filter_map(|key| self.keys.strip_attribute_name(key, &canonical))
            .map(str::to_owned)
            .collect()
    }

    async fn clear(&self, ctx: &SessionContext) -> bool {
        let Some(canonical) = self.resolve(ctx).await else {
            return false;
        };
        self.cache
            .delete_by_prefix(&self.keys.session_prefix(&canonical))
            .await;
        true
    }

    async fn destroy(&self) {
        self.cache.destroy();
    }
}
