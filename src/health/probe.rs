//! Liveness probing.
//!
//! # Responsibilities
//! - Issue one bounded `GET {address}{path}` against a backend
//! - Collapse every failure mode into `Liveness::Unhealthy`
//!
//! # Design Decisions
//! - Exactly 200 counts as healthy; any other status does not
//! - One attempt per call, no retries, nothing cached
//! - The timeout covers connection establishment and the response head

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tokio::time;

use crate::http::client::{build_client, HttpClient};
use crate::load_balancer::backend::Backend;

/// Outcome of a single liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Healthy,
    Unhealthy,
}

impl Liveness {
    pub fn is_healthy(self) -> bool {
        self == Liveness::Healthy
    }
}

/// Source of liveness verdicts used by selection.
#[async_trait]
pub trait LivenessProber: Send + Sync {
    /// Report whether `backend` can currently take traffic. Never fails.
    async fn probe(&self, backend: &Backend) -> Liveness;
}

/// Probes backends over HTTP.
#[derive(Clone)]
pub struct HttpProber {
    client: HttpClient,
    path: String,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(),
            path: path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl LivenessProber for HttpProber {
    async fn probe(&self, backend: &Backend) -> Liveness {
        let url = backend.probe_url(&self.path);

        let request = match Request::builder()
            .method(Method::GET)
            .uri(url.as_str())
            .header(header::USER_AGENT, "failover-proxy-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(address = %backend.address(), error = %e, "Health check failed: invalid probe URL");
                return Liveness::Unhealthy;
            }
        };

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status() == StatusCode::OK => {
                tracing::debug!(address = %backend.address(), "Health check passed");
                Liveness::Healthy
            }
            Ok(Ok(response)) => {
                tracing::warn!(address = %backend.address(), status = %response.status(), "Health check failed: non-200 status");
                Liveness::Unhealthy
            }
            Ok(Err(e)) => {
                tracing::warn!(address = %backend.address(), error = %e, "Health check failed: connection error");
                Liveness::Unhealthy
            }
            Err(_) => {
                tracing::warn!(address = %backend.address(), timeout = ?self.timeout, "Health check failed: timeout");
                Liveness::Unhealthy
            }
        }
    }
}
