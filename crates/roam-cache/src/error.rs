//! Error types for cache client operations.

use std::time::Duration;

/// Error type for backend transport and protocol failures.
///
/// These errors never cross the public operation boundary of
/// [`CacheClient`](crate::CacheClient): read operations absorb them into
/// `None`, mutating operations into `false`, with the rate-limited reporter
/// deciding what reaches the logs.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Network or socket failure while talking to the backend.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend sent a frame the protocol codec cannot make sense of.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The backend answered with an explicit error reply.
    #[error("backend error reply: {0}")]
    Backend(String),

    /// A connect or request round trip exceeded its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// All pooled connections are in use; acquisition never queues.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// The client was destroyed and its pools released.
    #[error("client has been destroyed")]
    Closed,
}

/// Error type for value encode/decode failures.
///
/// A decode failure on a read path is treated as a cache miss by callers,
/// never as a partial value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON (de)serialization failure.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is not valid base64.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Text-safe payload is not valid UTF-8.
    #[error("payload is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type for fallible internal cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
