//! Request forwarding.
//!
//! # Responsibilities
//! - Retarget an inbound request at the selected backend
//! - Relay method, end-to-end headers, query and body unchanged
//! - Stream the backend's status, headers and body back
//!
//! # Design Decisions
//! - Bodies stream in both directions; nothing is buffered here
//! - Hop-by-hop headers are connection-scoped and never relayed, except
//!   that a client's `TE: trailers` is passed on
//! - Protocol upgrades are not supported: `Upgrade` is stripped, so a
//!   WebSocket handshake reaches the backend as a plain request
//! - The client IP is appended to `X-Forwarded-For`
//! - A bad backend address is a configuration error (500), never a
//!   transport error (502)

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    request::Parts,
    uri::{Authority, PathAndQuery, Scheme},
    Request, Response, Uri,
};
use tokio::time;
use url::Url;

use crate::error::ProxyError;
use crate::http::client::{build_client, HttpClient};
use crate::load_balancer::backend::Backend;

/// Headers that only describe the current hop.
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Sends inbound requests to a chosen backend.
#[derive(Clone)]
pub struct Forwarder {
    client: HttpClient,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: build_client(),
            timeout,
        }
    }

    /// Forward one request to `backend` and relay its response.
    ///
    /// `parts` is borrowed so the caller can re-issue the request against
    /// another backend.
    pub async fn forward(
        &self,
        backend: &Backend,
        parts: &Parts,
        body: Body,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, ProxyError> {
        let target = backend.target()?;
        let uri = retarget(&target, &parts.uri).map_err(|reason| {
            ProxyError::InvalidBackendConfiguration {
                address: backend.address().to_string(),
                reason,
            }
        })?;

        let mut headers = parts.headers.clone();
        strip_hop_by_hop(&mut headers);
        if accepts_trailers(&parts.headers) {
            headers.insert(header::TE, HeaderValue::from_static("trailers"));
        }
        if let Some(addr) = client_addr {
            append_forwarded_for(&mut headers, addr);
        }

        let mut request = Request::new(body);
        *request.method_mut() = parts.method.clone();
        *request.uri_mut() = uri;
        *request.headers_mut() = headers;

        tracing::info!(
            backend = %backend.address(),
            method = %parts.method,
            uri = %request.uri(),
            "Forwarding request"
        );

        let response = match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(ProxyError::ForwardingFailure {
                    address: backend.address().to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ProxyError::ForwardTimeout {
                    address: backend.address().to_string(),
                })
            }
        };

        let (mut parts, incoming) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(incoming)))
    }
}

/// Point `inbound` at `target`: scheme and authority from the target, path
/// joined onto the target's base path, queries merged.
pub fn retarget(target: &Url, inbound: &Uri) -> Result<Uri, String> {
    let scheme = match target.scheme() {
        "http" => Scheme::HTTP,
        "https" => Scheme::HTTPS,
        other => return Err(format!("unsupported scheme {:?}", other)),
    };
    let host = target.host_str().ok_or_else(|| "missing host".to_string())?;
    let authority = match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let authority = Authority::try_from(authority.as_str()).map_err(|e| e.to_string())?;

    let path = join_path(target.path(), inbound.path());
    let path_and_query = match merge_query(target.query(), inbound.query()) {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };
    let path_and_query =
        PathAndQuery::try_from(path_and_query.as_str()).map_err(|e| e.to_string())?;

    Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| e.to_string())
}

/// Join two path segments with exactly one slash between them.
pub fn join_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Combine the target's query with the inbound one.
pub fn merge_query(target: Option<&str>, inbound: Option<&str>) -> Option<String> {
    let target = target.filter(|q| !q.is_empty());
    let inbound = inbound.filter(|q| !q.is_empty());
    match (target, inbound) {
        (Some(t), Some(i)) => Some(format!("{}&{}", t, i)),
        (Some(q), None) | (None, Some(q)) => Some(q.to_string()),
        (None, None) => None,
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Whether the client's `TE` header asks for trailers.
fn accepts_trailers(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::TE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|t| t.trim().eq_ignore_ascii_case("trailers"))
}

fn append_forwarded_for(headers: &mut HeaderMap, client: SocketAddr) {
    let ip = client.ip().to_string();
    let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, ip),
        None => ip,
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
