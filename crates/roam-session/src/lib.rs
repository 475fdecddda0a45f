//! Session identity resolution and attribute storage over a shared cache.
//!
//! Front-end instances share transient session state through a replicated
//! key-value backend so a request can land on any instance and still find
//! its data. This crate supplies:
//! - [`KeyNamespace`] — compound key construction for attribute, alias, and
//!   whole-store prefixes
//! - [`SessionIdentityResolver`] — maps the request's local session id to
//!   the canonical id owning the attribute namespace, walking stored alias
//!   chains with a hop bound
//! - [`SessionAttributeStore`] — the [`KeyedAttributeStore`] facade adapter
//!   layers program against
//! - [`SessionBlobStore`] and [`RecordStore`] — whole-session blob and
//!   paginated-record adapters over the same cache
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use roam_cache::{CacheClient, CacheConfig};
//! use roam_session::{KeyedAttributeStore, SessionAttributeStore, SessionContext};
//!
//! let cache = Arc::new(CacheClient::new(CacheConfig::single("cache:6379")));
//! let store = SessionAttributeStore::new(cache);
//!
//! // A session created elsewhere arrives under a new local id.
//! let ctx = SessionContext::new("local-77").with_incoming_id("origin-12");
//! let cart = store.get(&ctx, "cart").await;
//! ```

mod blob;
mod context;
mod keys;
mod records;
mod resolver;
mod store;

pub use blob::{SessionBlobStore, DEFAULT_BLOB_PREFIX};
pub use context::SessionContext;
pub use keys::{KeyNamespace, DEFAULT_DIVIDER, DEFAULT_PREFIX};
pub use records::{RecordStore, DEFAULT_RECORD_PREFIX};
pub use resolver::{Resolution, SessionIdentityResolver, MAX_ALIAS_HOPS};
pub use store::{KeyedAttributeStore, SessionAttributeStore};
