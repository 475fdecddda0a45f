//! Bounded, non-blocking connection pool for one logical backend endpoint.
//!
//! Acquisition is a `try_acquire` on a semaphore sized to the pool: when all
//! permits are out the operation fails immediately instead of queueing, so an
//! outage or a load spike bounds added latency instead of stacking waiters.
//! A healthy connection goes back on the idle list after the round trip; any
//! transport error discards it and the next request dials fresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, trace};

use crate::error::CacheError;
use crate::resp::{RespCodec, RespValue};

type Connection = Framed<TcpStream, RespCodec>;

pub(crate) struct ConnectionPool {
    /// "primary" or "replica", for log context.
    label: &'static str,
    addr: String,
    connect_timeout: Duration,
    io_timeout: Duration,
    permits: Semaphore,
    idle: Mutex<Vec<Connection>>,
    closed: AtomicBool,
}

impl ConnectionPool {
    pub(crate) fn new(
        label: &'static str,
        addr: String,
        size: usize,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Self {
        Self {
            label,
            addr,
            connect_timeout,
            io_timeout,
            permits: Semaphore::new(size.max(1)),
            idle: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// One scoped request round trip: acquire a pool slot (failing fast when
    /// none is free), borrow or dial a connection, send the command, read the
    /// reply. The slot is released on every exit path; the connection is
    /// returned to the idle list only when the round trip succeeded.
    pub(crate) async fn request(&self, command: RespValue) -> Result<RespValue, CacheError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        let _permit = self
            .permits
            .try_acquire()
            .map_err(|_| CacheError::PoolExhausted)?;

        let pooled = self.idle.lock().pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => self.dial().await?,
        };

        match self.round_trip(&mut conn, command).await {
            Ok(reply) => {
                if !self.closed.load(Ordering::Acquire) {
                    self.idle.lock().push(conn);
                }
                match reply {
                    RespValue::Error(message) => Err(CacheError::Backend(message)),
                    other => Ok(other),
                }
            }
            Err(err) => {
                debug!(pool = self.label, addr = %self.addr, error = %err, "discarding backend connection");
                Err(err)
            }
        }
    }

    async fn dial(&self) -> Result<Connection, CacheError> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| CacheError::Timeout(self.connect_timeout))??;
        stream.set_nodelay(true)?;
        trace!(pool = self.label, addr = %self.addr, "opened backend connection");
        Ok(Framed::new(stream, RespCodec))
    }

    async fn round_trip(
        &self,
        conn: &mut Connection,
        command: RespValue,
    ) -> Result<RespValue, CacheError> {
        timeout(self.io_timeout, conn.send(command))
            .await
            .map_err(|_| CacheError::Timeout(self.io_timeout))??;
        match timeout(self.io_timeout, conn.next()).await {
            Ok(Some(reply)) => reply,
            Ok(None) => Err(CacheError::Protocol(
                "backend closed the connection".to_string(),
            )),
            Err(_) => Err(CacheError::Timeout(self.io_timeout)),
        }
    }

    /// Refuse further acquisitions and drop all idle connections. In-flight
    /// round trips finish; their connections are not re-pooled.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.idle.lock().clear();
        debug!(pool = self.label, addr = %self.addr, "connection pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    const FAST: Duration = Duration::from_millis(500);

    fn pool_for(addr: String, size: usize) -> ConnectionPool {
        ConnectionPool::new("primary", addr, size, FAST, FAST)
    }

    /// Minimal backend: answers every frame on every connection with `reply`.
    async fn spawn_stub(reply: RespValue) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let reply = reply.clone();
                tokio::spawn(async move {
                    let mut framed = Framed::new(stream, RespCodec);
                    while let Some(Ok(_)) = framed.next().await {
                        if framed.send(reply.clone()).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn request_round_trips_and_reuses_the_connection() {
        let addr = spawn_stub(RespValue::Simple("OK".to_string())).await;
        let pool = pool_for(addr, 2);

        let ping = RespValue::command(&[b"SET", b"k", b"v"]);
        assert_eq!(
            pool.request(ping.clone()).await.unwrap(),
            RespValue::Simple("OK".to_string())
        );
        assert_eq!(pool.idle.lock().len(), 1);

        // Second request reuses the idle connection instead of dialing.
        assert!(pool.request(ping).await.is_ok());
        assert_eq!(pool.idle.lock().len(), 1);
    }

    #[tokio::test]
    async fn exhausted_pool_fails_immediately() {
        let addr = spawn_stub(RespValue::Simple("OK".to_string())).await;
        let pool = pool_for(addr, 1);

        let _held = pool.permits.try_acquire().unwrap();
        let result = pool.request(RespValue::command(&[b"GET", b"k"])).await;
        assert!(matches!(result, Err(CacheError::PoolExhausted)));
    }

    #[tokio::test]
    async fn closed_pool_refuses_requests() {
        let addr = spawn_stub(RespValue::Simple("OK".to_string())).await;
        let pool = pool_for(addr, 1);
        pool.close();
        let result = pool.request(RespValue::command(&[b"GET", b"k"])).await;
        assert!(matches!(result, Err(CacheError::Closed)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let pool = pool_for(addr, 1);
        let result = pool.request(RespValue::command(&[b"GET", b"k"])).await;
        assert!(result.is_err());
        assert!(pool.idle.lock().is_empty());
    }

    #[tokio::test]
    async fn backend_error_reply_keeps_the_connection() {
        let addr = spawn_stub(RespValue::Error("ERR wrong type".to_string())).await;
        let pool = pool_for(addr, 1);

        let result = pool.request(RespValue::command(&[b"GET", b"k"])).await;
        assert!(matches!(result, Err(CacheError::Backend(_))));
        // An error reply is a healthy conversation; the connection survives.
        assert_eq!(pool.idle.lock().len(), 1);
    }
}
