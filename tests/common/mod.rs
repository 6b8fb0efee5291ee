//! Shared utilities for integration tests: mock backends and a proxy harness.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::any,
    Json, Router,
};
use failover_proxy::{HttpServer, ProxyConfig, Shutdown};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    /// Status returned by `/health`; change it to flip health.
    pub health_status: Arc<AtomicU16>,
    /// Health probes received.
    pub probes: Arc<AtomicUsize>,
    /// Non-health requests received.
    pub hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_health(&self, status: u16) {
        self.health_status.store(status, Ordering::SeqCst);
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct EchoState {
    name: &'static str,
    backend: MockBackend,
}

async fn health(State(state): State<EchoState>) -> StatusCode {
    state.backend.probes.fetch_add(1, Ordering::SeqCst);
    StatusCode::from_u16(state.backend.health_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Echoes the request it received as JSON. `/status/{code}` answers with that code.
async fn echo(
    State(state): State<EchoState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(&'static str, &'static str); 1], Json<Value>) {
    state.backend.hits.fetch_add(1, Ordering::SeqCst);
    let status = uri
        .path()
        .strip_prefix("/status/")
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    (
        status,
        [("x-backend", state.name)],
        Json(json!({
            "backend": state.name,
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "headers": headers,
            "body": String::from_utf8_lossy(&body),
        })),
    )
}

/// Start an echo backend whose `/health` answers `health_status`.
pub async fn spawn_backend(name: &'static str, health_status: u16) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = MockBackend {
        addr: listener.local_addr().unwrap(),
        health_status: Arc::new(AtomicU16::new(health_status)),
        probes: Arc::new(AtomicUsize::new(0)),
        hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route("/health", any(health))
        .fallback(echo)
        .with_state(EchoState {
            name,
            backend: backend.clone(),
        });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    backend
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Accepts connections and never answers.
pub async fn spawn_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Passes health probes but drops every other request without answering.
/// Returns the address and a counter of dropped requests.
pub async fn spawn_dropping_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let dropped = Arc::new(AtomicUsize::new(0));
    let counter = dropped.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                if head.starts_with("GET /health ") {
                    let _ = socket
                        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                        .await;
                    let _ = socket.shutdown().await;
                } else {
                    counter.fetch_add(1, Ordering::SeqCst);
                    drop(socket);
                }
            });
        }
    });
    (addr, dropped)
}

/// Passes health probes but never answers any other request.
/// Returns the address and a counter of stalled requests.
pub async fn spawn_hanging_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stalled = Arc::new(AtomicUsize::new(0));
    let counter = stalled.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                if head.starts_with("GET /health ") {
                    let _ = socket
                        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                        .await;
                    let _ = socket.shutdown().await;
                } else {
                    counter.fetch_add(1, Ordering::SeqCst);
                    std::future::pending::<()>().await;
                }
            });
        }
    });
    (addr, stalled)
}

/// Records the first bytes of every connection, then hangs up.
pub async fn spawn_recording_listener() -> (SocketAddr, tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 16];
            if let Ok(n) = socket.read(&mut buf).await {
                let _ = tx.send(buf[..n].to_vec());
            }
        }
    });
    (addr, rx)
}

/// Config listing `backends` in order, with a short probe timeout.
pub fn config_for(backends: &[String]) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backends = backends
        .iter()
        .map(|a| failover_proxy::config::BackendConfig::new(a.clone()))
        .collect();
    config.health_check.timeout_ms = 500;
    config
}

/// A proxy running on an ephemeral port.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_proxy(server: HttpServer) -> RunningProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    RunningProxy { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}
