//! Resilient pooled client for a replicated key-value cache backend.
//!
//! This crate provides the cache-access layer for sharing transient state
//! (session attributes, paginated UI state) across server instances:
//! - a best-effort [`CacheClient`] over a primary/replica endpoint pair,
//!   with bounded non-blocking connection pools per endpoint
//! - a rate-limited [`ErrorReporter`] so a backend outage degrades request
//!   serving gracefully instead of flooding the logs
//! - [`ValueCodec`] implementations mapping application values to opaque
//!   byte payloads, including a text-safe base64 variant
//!
//! # Example
//!
//! ```rust,ignore
//! use roam_cache::{CacheClient, CacheConfig};
//!
//! let config = CacheConfig::new("primary:6379", "replica:6379")
//!     .with_pool_size(16)
//!     .with_read_from_primary(false);
//!
//! let client = CacheClient::new(config);
//! if !client.set("SESSION-abc-cart", b"...").await {
//!     // cache is advisory; the write may simply be dropped
//! }
//! ```

mod client;
mod codec;
mod config;
mod error;
mod pool;
mod reporter;
pub mod resp;

pub use client::CacheClient;
pub use codec::{Base64Codec, JsonCodec, RawCodec, ValueCodec};
pub use config::{
    CacheConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_ERROR_LOG_THRESHOLD,
    DEFAULT_ERROR_SAMPLE_INTERVAL, DEFAULT_IO_TIMEOUT, DEFAULT_POOL_SIZE,
};
pub use error::{CacheError, CodecError, Result};
pub use reporter::{ErrorReporter, Report};
