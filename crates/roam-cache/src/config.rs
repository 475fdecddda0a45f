//! Configuration for the cache client.

use std::time::Duration;

/// Default maximum number of concurrent connections per pool.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Default deadline for establishing a backend connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default deadline for a single request round trip.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(1);

/// Default number of backend errors logged individually before sampling.
pub const DEFAULT_ERROR_LOG_THRESHOLD: u64 = 100;

/// Default sampling interval for errors past the threshold.
pub const DEFAULT_ERROR_SAMPLE_INTERVAL: u64 = 100_000;

/// Configuration for a [`CacheClient`](crate::CacheClient).
///
/// Writes always go to the primary endpoint; reads go to the replica unless
/// [`read_from_primary`](Self::read_from_primary) is set. Each endpoint gets
/// its own bounded pool of `pool_size` connections with non-blocking
/// acquisition.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Address of the write/primary endpoint (`host:port`).
    pub primary_addr: String,

    /// Address of the read/replica endpoint (`host:port`).
    pub replica_addr: String,

    /// Maximum concurrent connections per pool.
    pub pool_size: usize,

    /// Deadline for establishing a connection.
    pub connect_timeout: Duration,

    /// Deadline for one request round trip on an established connection.
    pub io_timeout: Duration,

    /// Route reads through the primary pool. Trades read latency headroom
    /// for read-your-writes consistency; by default reads may lag writes
    /// by the replica's replication delay.
    pub read_from_primary: bool,

    /// How many backend errors are logged individually before sampling.
    pub error_log_threshold: u64,

    /// Log every n-th backend error once past the threshold.
    pub error_sample_interval: u64,
}

impl CacheConfig {
    /// Configuration for a primary/replica endpoint pair.
    pub fn new(primary_addr: impl Into<String>, replica_addr: impl Into<String>) -> Self {
        Self {
            primary_addr: primary_addr.into(),
            replica_addr: replica_addr.into(),
            pool_size: DEFAULT_POOL_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
            read_from_primary: false,
            error_log_threshold: DEFAULT_ERROR_LOG_THRESHOLD,
            error_sample_interval: DEFAULT_ERROR_SAMPLE_INTERVAL,
        }
    }

    /// Configuration where one endpoint serves both reads and writes.
    pub fn single(addr: impl Into<String>) -> Self {
        let addr = addr.into();
        Self::new(addr.clone(), addr)
    }

    /// Set the maximum concurrent connections per pool.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }

    /// Set the connect deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the request round-trip deadline.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Route reads through the primary pool.
    pub fn with_read_from_primary(mut self, strict: bool) -> Self {
        self.read_from_primary = strict;
        self
    }

    /// Tune the rate-limited error reporter.
    pub fn with_error_reporting(mut self, threshold: u64, sample_interval: u64) -> Self {
        self.error_log_threshold = threshold;
        self.error_sample_interval = sample_interval.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CacheConfig::new("primary:6379", "replica:6379");
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.io_timeout, DEFAULT_IO_TIMEOUT);
        assert!(!config.read_from_primary);
        assert_eq!(config.error_log_threshold, 100);
        assert_eq!(config.error_sample_interval, 100_000);
    }

    #[test]
    fn single_endpoint_shares_address() {
        let config = CacheConfig::single("cache:6379");
        assert_eq!(config.primary_addr, config.replica_addr);
    }

    #[test]
    fn pool_size_is_never_zero() {
        let config = CacheConfig::single("cache:6379").with_pool_size(0);
        assert_eq!(config.pool_size, 1);
    }
}
