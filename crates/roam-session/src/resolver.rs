//! Session identity resolution.
//!
//! A request carries a *local* session identifier assigned by whichever
//! instance serves it. The session's attributes, however, are namespaced
//! under the *canonical* identifier — the one the session was first stored
//! under, possibly on a different instance. Alias mappings
//! (`localId -> nextId`) bridge the two; resolution walks the chain until it
//! reaches an identifier with no outgoing mapping.
//!
//! Concurrent requests may race to create a mapping for the same local id;
//! the backend's last write wins and both outcomes are internally consistent
//! per call. The walk is hop-bounded so an accidentally-introduced cycle
//! fails closed instead of looping.

use std::sync::Arc;

use tracing::{debug, warn};

use roam_cache::CacheClient;

use crate::context::SessionContext;
use crate::keys::KeyNamespace;

/// Default bound on alias-chain hops before resolution fails closed.
pub const MAX_ALIAS_HOPS: usize = 16;

/// Outcome of a resolution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The terminal identifier owning the session's attribute namespace.
    Canonical(String),
    /// No canonical identifier could be determined; attribute operations
    /// against this request are defined no-ops.
    Unresolved,
}

impl Resolution {
    pub fn canonical(&self) -> Option<&str> {
        match self {
            Resolution::Canonical(id) => Some(id),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved)
    }
}

/// Maps request-visible session identifiers to canonical ones.
pub struct SessionIdentityResolver {
    cache: Arc<CacheClient>,
    keys: KeyNamespace,
    max_hops: usize,
}

impl SessionIdentityResolver {
    pub fn new(cache: Arc<CacheClient>, keys: KeyNamespace) -> Self {
        Self {
            cache,
            keys,
            max_hops: MAX_ALIAS_HOPS,
        }
    }

    /// Override the alias-chain hop bound.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops.max(1);
        self
    }

    /// Resolve the canonical identifier for a request.
    ///
    /// When the context carries an incoming identifier differing from the
    /// local one (a session migrating from another instance), the incoming
    /// chain is walked first and a single-hop mapping
    /// `localId -> canonical` is recorded so later requests resolve without
    /// re-walking.
    pub async fn resolve(&self, ctx: &SessionContext) -> Resolution {
        match (ctx.local_id(), ctx.incoming_id()) {
            (Some(local), Some(incoming)) if local != incoming => {
                self.resolve_migration(local, incoming, ctx.allow_create())
                    .await
            }
            (Some(local), _) => self.resolve_chain(local, ctx.allow_create()).await,
            (None, Some(incoming)) => self.resolve_chain(incoming, ctx.allow_create()).await,
            (None, None) => Resolution::Unresolved,
        }
    }

    /// Record an alias mapping `from -> to`. Self-mappings are skipped.
    pub async fn record_alias(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let stored = self
            .cache
            .set(&self.keys.alias_key(from), to.as_bytes())
            .await;
        if stored {
            debug!(from, to, "recorded session alias mapping");
        }
        stored
    }

    async fn resolve_migration(
        &self,
        local: &str,
        incoming: &str,
        allow_create: bool,
    ) -> Resolution {
        match self.resolve_chain(incoming, allow_create).await {
            Resolution::Canonical(canonical) => {
                if canonical != local {
                    // Best-effort: if the write is dropped the next request
                    // walks the incoming chain again.
                    self.record_alias(local, &canonical).await;
                }
                Resolution::Canonical(canonical)
            }
            Resolution::Unresolved => Resolution::Unresolved,
        }
    }

    async fn resolve_chain(&self, start: &str, allow_create: bool) -> Resolution {
        let Some((canonical, hops)) = self.walk(start).await else {
            return Resolution::Unresolved;
        };
        // A terminal id reached through at least one mapping is canonical by
        // construction. A bare id with neither mapping nor attributes is a
        // brand-new session, canonical only if the caller may create one.
        if hops > 0 || allow_create || self.has_attributes(&canonical).await {
            Resolution::Canonical(canonical)
        } else {
            Resolution::Unresolved
        }
    }

    /// Walk the alias chain from `start`; returns the terminal identifier
    /// and how many mappings were followed, or `None` when the hop bound was
    /// exceeded.
    async fn walk(&self, start: &str) -> Option<(String, usize)> {
        let mut current = start.to_owned();
        let mut hops = 0usize;
        loop {
            let mapped = self.cache.get(&self.keys.alias_key(&current)).await;
            match mapped.and_then(|bytes| String::from_utf8(bytes).ok()) {
                None => return Some((current, hops)),
                Some(next) => {
                    hops += 1;
                    if hops > self.max_hops {
                        warn!(
                            start,
                            max_hops = self.max_hops,
                            "alias chain exceeded hop bound; treating session as unresolved"
                        );
                        return None;
                    }
                    current = next;
                }
            }
        }
    }

    async fn has_attributes(&self, session_id: &str) -> bool {
        !self
            .cache
            .list_keys_by_prefix(&self.keys.session_prefix(session_id))
            .await
            .is_empty()
    }
}
