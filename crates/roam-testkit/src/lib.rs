//! In-process mock cache backend for integration tests.
//!
//! [`MockBackend`] binds a real TCP listener on a loopback port and speaks
//! the same wire protocol as a production backend (GET / SET / DEL / KEYS /
//! EXPIRE), backed by an in-memory map with optional per-key deadlines. Tests
//! point a `CacheClient` at [`MockBackend::addr`] and can inspect or seed the
//! stored state directly, bypassing the client under test.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tracing::trace;

use roam_cache::resp::{RespCodec, RespValue};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn live(&self) -> bool {
        self.expires_at
            .map_or(true, |deadline| Instant::now() < deadline)
    }
}

type State = Arc<Mutex<HashMap<String, Entry>>>;

/// Install a tracing subscriber honouring `RUST_LOG` so test runs can surface
/// client logs. Safe to call from every test; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A loopback TCP server speaking the cache wire protocol.
///
/// The accept loop is aborted when the backend is dropped, so a test that
/// wants an unreachable endpoint can spawn one, note its address, and drop it.
pub struct MockBackend {
    addr: SocketAddr,
    state: State,
    accept_task: JoinHandle<()>,
}

impl MockBackend {
    /// Bind a listener on an ephemeral loopback port and start serving.
    pub async fn spawn() -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let state: State = Arc::new(Mutex::new(HashMap::new()));

        let accept_state = state.clone();
        let accept_task = tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                trace!(%peer, "mock backend accepted connection");
                tokio::spawn(serve_connection(stream, accept_state.clone()));
            }
        });

        Self {
            addr,
            state,
            accept_task,
        }
    }

    /// Address for a client to connect to, as `host:port`.
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Read a stored value directly, bypassing the wire protocol.
    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        let state = self.state.lock();
        state
            .get(key)
            .filter(|entry| entry.live())
            .map(|entry| entry.value.clone())
    }

    /// Seed a key directly, bypassing the wire protocol.
    pub fn insert_raw(&self, key: &str, value: &[u8]) {
        self.state.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: None,
            },
        );
    }

    /// All live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut keys: Vec<String> = state
            .iter()
            .filter(|(_, entry)| entry.live())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.state.lock().values().filter(|e| e.live()).count()
    }

    /// Whether the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve_connection(stream: TcpStream, state: State) {
    let mut framed = Framed::new(stream, RespCodec);
    while let Some(Ok(frame)) = framed.next().await {
        let reply = dispatch(frame, &state);
        if framed.send(reply).await.is_err() {
            break;
        }
    }
}

fn dispatch(frame: RespValue, state: &State) -> RespValue {
    let Some(parts) = command_parts(frame) else {
        return RespValue::Error("ERR expected an array of bulk strings".to_string());
    };
    let Some((name, args)) = parts.split_first() else {
        return RespValue::Error("ERR empty command".to_string());
    };

    match name.to_ascii_uppercase().as_slice() {
        b"GET" => match args {
            [key] => match lookup(state, key) {
                Some(value) => RespValue::bulk(value),
                None => RespValue::Null,
            },
            _ => arity_error("GET"),
        },
        b"SET" => match args {
            [key, value] => {
                state.lock().insert(
                    text(key),
                    Entry {
                        value: value.to_vec(),
                        expires_at: None,
                    },
                );
                RespValue::Simple("OK".to_string())
            }
            _ => arity_error("SET"),
        },
        b"DEL" => {
            if args.is_empty() {
                return arity_error("DEL");
            }
            let mut store = state.lock();
            let removed = args
                .iter()
                .filter(|key| store.remove(&text(key)).is_some())
                .count();
            RespValue::Integer(removed as i64)
        }
        b"KEYS" => match args {
            [pattern] => {
                let pattern = text(pattern);
                let prefix = pattern.strip_suffix('*').unwrap_or(&pattern);
                let store = state.lock();
                let mut matched: Vec<String> = store
                    .iter()
                    .filter(|(key, entry)| entry.live() && key.starts_with(prefix))
                    .map(|(key, _)| key.clone())
                    .collect();
                matched.sort();
                RespValue::Array(
                    matched
                        .into_iter()
                        .map(|key| RespValue::Bulk(Bytes::from(key.into_bytes())))
                        .collect(),
                )
            }
            _ => arity_error("KEYS"),
        },
        b"EXPIRE" => match args {
            [key, seconds] => {
                let Ok(seconds) = text(seconds).parse::<u64>() else {
                    return RespValue::Error("ERR invalid expire seconds".to_string());
                };
                let key = text(key);
                let mut store = state.lock();
                if seconds == 0 {
                    let existed = store.remove(&key).is_some();
                    return RespValue::Integer(existed as i64);
                }
                match store.get_mut(&key) {
                    Some(entry) if entry.live() => {
                        entry.expires_at = Some(Instant::now() + Duration::from_secs(seconds));
                        RespValue::Integer(1)
                    }
                    _ => RespValue::Integer(0),
                }
            }
            _ => arity_error("EXPIRE"),
        },
        other => RespValue::Error(format!(
            "ERR unknown command '{}'",
            String::from_utf8_lossy(other)
        )),
    }
}

fn lookup(state: &State, key: &[u8]) -> Option<Vec<u8>> {
    let key = text(key);
    let mut store = state.lock();
    match store.get(&key) {
        Some(entry) if entry.live() => Some(entry.value.clone()),
        Some(_) => {
            store.remove(&key);
            None
        }
        None => None,
    }
}

fn command_parts(frame: RespValue) -> Option<Vec<Vec<u8>>> {
    match frame {
        RespValue::Array(items) => items
            .into_iter()
            .map(|item| match item {
                RespValue::Bulk(data) => Some(data.to_vec()),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

fn text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn arity_error(command: &str) -> RespValue {
    RespValue::Error(format!("ERR wrong number of arguments for '{command}'"))
}
