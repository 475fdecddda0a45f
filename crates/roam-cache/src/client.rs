//! Best-effort cache client over a primary/replica endpoint pair.
//!
//! The cache is advisory, not the system of record: every operation absorbs
//! backend failures at this boundary. Reads degrade to a miss, mutations
//! report `false`, key listings come back empty, and the rate-limited
//! reporter keeps the logs useful during an outage. Nothing above this layer
//! ever sees a transport error.

use std::collections::BTreeSet;

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::pool::ConnectionPool;
use crate::reporter::ErrorReporter;
use crate::resp::RespValue;

/// Pooled client over the two logical backend endpoints.
///
/// Writes go to the primary pool; reads go to the replica pool, so a read
/// immediately following a write on another request may observe stale or
/// absent data (replica lag). Set
/// [`read_from_primary`](CacheConfig::read_from_primary) when read-your-writes
/// is worth the primary's latency.
pub struct CacheClient {
    primary: ConnectionPool,
    replica: ConnectionPool,
    reporter: ErrorReporter,
    read_from_primary: bool,
}

impl CacheClient {
    /// Build a client from configuration. No I/O happens here; connections
    /// are dialed on first use.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            primary: ConnectionPool::new(
                "primary",
                config.primary_addr,
                config.pool_size,
                config.connect_timeout,
                config.io_timeout,
            ),
            replica: ConnectionPool::new(
                "replica",
                config.replica_addr,
                config.pool_size,
                config.connect_timeout,
                config.io_timeout,
            ),
            reporter: ErrorReporter::new(config.error_log_threshold, config.error_sample_interval),
            read_from_primary: config.read_from_primary,
        }
    }

    fn read_pool(&self) -> &ConnectionPool {
        if self.read_from_primary {
            &self.primary
        } else {
            &self.replica
        }
    }

    /// Fetch a value. `None` means miss, absent backend, or any transport
    /// failure; the caller cannot and need not tell those apart.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self
            .read_pool()
            .request(RespValue::command(&[b"GET", key.as_bytes()]))
            .await
        {
            Ok(RespValue::Bulk(data)) => Some(data.to_vec()),
            Ok(RespValue::Null) => None,
            Ok(other) => {
                self.reporter.record("GET", &unexpected_reply(&other));
                None
            }
            Err(err) => {
                self.reporter.record("GET", &err);
                None
            }
        }
    }

    /// Store a value. `false` means the write did not happen; the cache is
    /// advisory, so callers may simply drop the write.
    pub async fn set(&self, key: &str, value: &[u8]) -> bool {
        match self
            .primary
            .request(RespValue::command(&[b"SET", key.as_bytes(), value]))
            .await
        {
            Ok(RespValue::Simple(reply)) if reply == "OK" => true,
            Ok(other) => {
                self.reporter.record("SET", &unexpected_reply(&other));
                false
            }
            Err(err) => {
                self.reporter.record("SET", &err);
                false
            }
        }
    }

    /// Delete a key. `true` means the backend acknowledged the command,
    /// whether or not the key existed.
    pub async fn delete(&self, key: &str) -> bool {
        match self
            .primary
            .request(RespValue::command(&[b"DEL", key.as_bytes()]))
            .await
        {
            Ok(RespValue::Integer(_)) => true,
            Ok(other) => {
                self.reporter.record("DEL", &unexpected_reply(&other));
                false
            }
            Err(err) => {
                self.reporter.record("DEL", &err);
                false
            }
        }
    }

    /// Delete every key starting with `prefix`; returns how many were
    /// deleted. The scan runs through the write pool so it reflects
    /// acknowledged writes rather than the replica's view.
    ///
    /// Not atomic: a concurrent writer adding a key under the same prefix
    /// during the scan may or may not be deleted.
    pub async fn delete_by_prefix(&self, prefix: &str) -> usize {
        let keys = self.keys_via(&self.primary, prefix).await;
        let mut removed = 0;
        for key in keys {
            if self.delete(&key).await {
                removed += 1;
            }
        }
        removed
    }

    /// List keys starting with `prefix`. Unreachable backend yields an empty
    /// set, not an error.
    pub async fn list_keys_by_prefix(&self, prefix: &str) -> BTreeSet<String> {
        self.keys_via(self.read_pool(), prefix).await
    }

    /// Set a time-to-live on a key. `true` only when the backend reports the
    /// TTL was applied (the key existed).
    pub async fn expire(&self, key: &str, seconds: u64) -> bool {
        let seconds = seconds.to_string();
        match self
            .primary
            .request(RespValue::command(&[
                b"EXPIRE",
                key.as_bytes(),
                seconds.as_bytes(),
            ]))
            .await
        {
            Ok(RespValue::Integer(applied)) => applied > 0,
            Ok(other) => {
                self.reporter.record("EXPIRE", &unexpected_reply(&other));
                false
            }
            Err(err) => {
                self.reporter.record("EXPIRE", &err);
                false
            }
        }
    }

    /// Release both connection pools. Subsequent operations degrade to
    /// miss/failed like any other backend outage.
    pub fn destroy(&self) {
        self.primary.close();
        self.replica.close();
    }

    /// Total backend errors this client has absorbed.
    pub fn error_count(&self) -> u64 {
        self.reporter.total()
    }

    async fn keys_via(&self, pool: &ConnectionPool, prefix: &str) -> BTreeSet<String> {
        let pattern = format!("{prefix}*");
        match pool
            .request(RespValue::command(&[b"KEYS", pattern.as_bytes()]))
            .await
        {
            Ok(RespValue::Array(items)) => items
                .iter()
                .filter_map(RespValue::as_bulk)
                .filter_map(|data| std::str::from_utf8(data).ok())
                .map(str::to_owned)
                .collect(),
            Ok(RespValue::Null) => BTreeSet::new(),
            Ok(other) => {
                self.reporter.record("KEYS", &unexpected_reply(&other));
                BTreeSet::new()
            }
            Err(err) => {
                self.reporter.record("KEYS", &err);
                BTreeSet::new()
            }
        }
    }
}

fn unexpected_reply(reply: &RespValue) -> CacheError {
    CacheError::Protocol(format!("unexpected reply frame: {reply:?}"))
}
