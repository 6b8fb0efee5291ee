//! Request-path error taxonomy.
//!
//! Every backend-facing failure is resolved into one of these variants
//! before a response is written. Probe failures never appear here; the
//! prober folds them into `Liveness::Unhealthy`.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Failure of a single proxied request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Every configured backend failed its probe (or none are configured).
    #[error("No healthy backend servers available")]
    NoBackendAvailable,

    /// The selected backend's configured address cannot be used as a target.
    #[error("Invalid backend server URL {address:?}: {reason}")]
    InvalidBackendConfiguration { address: String, reason: String },

    /// The selected backend refused or dropped the connection.
    #[error("Forwarding to {address} failed: {reason}")]
    ForwardingFailure { address: String, reason: String },

    /// The selected backend did not answer within the forward timeout.
    #[error("Backend {address} timed out")]
    ForwardTimeout { address: String },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoBackendAvailable => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::InvalidBackendConfiguration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::ForwardingFailure { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::ForwardTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Body sent to the caller. Backend addresses stay in the logs.
    fn public_message(&self) -> &'static str {
        match self {
            ProxyError::NoBackendAvailable => "No healthy backend servers available\n",
            ProxyError::InvalidBackendConfiguration { .. } => "Invalid backend server URL\n",
            ProxyError::ForwardingFailure { .. } => "Bad gateway\n",
            ProxyError::ForwardTimeout { .. } => "Gateway timeout\n",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.public_message()));
        *response.status_mut() = self.status();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_keeps_config_defect_distinct() {
        assert_eq!(
            ProxyError::NoBackendAvailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        let invalid = ProxyError::InvalidBackendConfiguration {
            address: "::".into(),
            reason: "relative URL without a base".into(),
        };
        assert_eq!(invalid.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ProxyError::ForwardingFailure {
                address: "http://a".into(),
                reason: "reset".into()
            }
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn response_carries_descriptive_body() {
        let response = ProxyError::NoBackendAvailable.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"No healthy backend servers available\n");
    }
}
