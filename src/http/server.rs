//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `/health` for the proxy itself, everything
//!   else forwarded
//! - Wire up middleware (tracing, request ID)
//! - Choose the liveness source (live probing or cached snapshot)
//! - Run selection → forwarding for each inbound request
//! - Bind server to listener and shut down gracefully

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{header, request::Parts, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{HealthMode, ProxyConfig};
use crate::error::ProxyError;
use crate::health::{HealthMonitor, HealthTable, HttpProber, LivenessProber};
use crate::http::forward::Forwarder;
use crate::load_balancer::{registry::Registry, FirstHealthy, SelectionOutcome, SelectionPolicy};

/// Largest request body kept in memory so it can be replayed on re-selection.
pub const REPLAY_BODY_LIMIT: usize = 1024 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub policy: Arc<dyn SelectionPolicy>,
    pub prober: Arc<dyn LivenessProber>,
    pub forwarder: Forwarder,
    pub reselect_attempts: u32,
}

/// HTTP server for the failover proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    monitor: Option<HealthMonitor>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let registry = Registry::from_config(&config.backends);
        let http_prober: Arc<dyn LivenessProber> = Arc::new(HttpProber::new(
            config.health_check.path.clone(),
            config.health_check.timeout(),
        ));

        let (prober, monitor) = match config.health_check.mode {
            HealthMode::Live => (http_prober, None),
            HealthMode::Cached => {
                let table = Arc::new(HealthTable::new(config.health_check.max_staleness()));
                let monitor = HealthMonitor::new(
                    registry.clone(),
                    http_prober,
                    table.clone(),
                    config.health_check.interval(),
                );
                (table as Arc<dyn LivenessProber>, Some(monitor))
            }
        };

        Self::assemble(config, registry, prober, monitor)
    }

    /// Create a server that takes liveness verdicts from `prober` instead of
    /// probing over HTTP. No background refresher is started.
    pub fn with_prober(config: ProxyConfig, prober: Arc<dyn LivenessProber>) -> Self {
        let registry = Registry::from_config(&config.backends);
        Self::assemble(config, registry, prober, None)
    }

    fn assemble(
        config: ProxyConfig,
        registry: Registry,
        prober: Arc<dyn LivenessProber>,
        monitor: Option<HealthMonitor>,
    ) -> Self {
        let state = AppState {
            registry,
            policy: Arc::new(FirstHealthy::new()),
            prober,
            forwarder: Forwarder::new(config.forwarding.timeout()),
            reselect_attempts: config.forwarding.reselect_attempts,
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            monitor,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", any(self_health))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The fully layered router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        if let Some(monitor) = self.monitor {
            // Health must be known before the first request is forwarded.
            monitor.refresh().await;
            let monitor_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                monitor.run(monitor_shutdown).await;
            });
        }

        tracing::info!(
            address = %addr,
            backends = self.config.backends.len(),
            mode = ?self.config.health_check.mode,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Liveness of the proxy process itself; backend state is irrelevant.
async fn self_health() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Proxy is running\n",
    )
}

/// Inbound body, either streamed once or held for replay.
enum Payload {
    Streaming(Option<Body>),
    Buffered(Bytes),
}

impl Payload {
    fn next_body(&mut self) -> Body {
        match self {
            Payload::Streaming(body) => body.take().unwrap_or_else(Body::empty),
            Payload::Buffered(bytes) => Body::from(bytes.clone()),
        }
    }
}

/// A body can be replayed if it is small and declared up front.
fn is_replayable(parts: &Parts) -> bool {
    if !parts.method.is_idempotent() {
        return false;
    }
    if parts.headers.contains_key(header::TRANSFER_ENCODING) {
        return false;
    }
    match parts.headers.get(header::CONTENT_LENGTH) {
        None => true,
        Some(len) => len
            .to_str()
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .is_some_and(|n| n <= REPLAY_BODY_LIMIT),
    }
}

/// Main proxy handler.
/// Selects a backend and forwards the request; re-selects after a transport
/// failure only when configured to and the body can be replayed.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();

    let replay = state.reselect_attempts > 0 && is_replayable(&parts);
    let mut payload = if replay {
        match axum::body::to_bytes(body, REPLAY_BODY_LIMIT).await {
            Ok(bytes) => Payload::Buffered(bytes),
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
                return (StatusCode::BAD_REQUEST, "Failed to read request body\n").into_response();
            }
        }
    } else {
        Payload::Streaming(Some(body))
    };
    let max_attempts = if replay { 1 + state.reselect_attempts } else { 1 };

    let mut excluded = Vec::new();
    let mut last_failure: Option<ProxyError> = None;
    let mut attempt = 0;

    loop {
        attempt += 1;

        let backend = match state
            .policy
            .select(&state.registry, state.prober.as_ref(), &excluded)
            .await
        {
            SelectionOutcome::Selected(backend) => backend,
            SelectionOutcome::NoBackendAvailable => {
                // After a failed attempt, report that failure rather than 503.
                let err = last_failure.unwrap_or(ProxyError::NoBackendAvailable);
                tracing::warn!(request_id = %request_id, attempt, error = %err, "No backend available");
                return err.into_response();
            }
        };

        match state
            .forwarder
            .forward(&backend, &parts, payload.next_body(), client_addr)
            .await
        {
            Ok(response) => return response,
            Err(err @ ProxyError::ForwardingFailure { .. }) if attempt < max_attempts => {
                tracing::warn!(
                    request_id = %request_id,
                    attempt,
                    backend = %backend.address(),
                    error = %err,
                    "Upstream failed, re-selecting"
                );
                excluded.push(backend.position());
                last_failure = Some(err);
            }
            Err(err) => {
                tracing::error!(request_id = %request_id, attempt, error = %err, "Upstream error");
                return err.into_response();
            }
        }
    }
}
