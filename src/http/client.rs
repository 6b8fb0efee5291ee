//! Outbound HTTP client shared by the prober and the forwarder.

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Client carrying axum bodies to `http` and `https` backends.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build a client with default pooling. `https` backends are verified
/// against the webpki root store.
pub fn build_client() -> HttpClient {
    let mut http = HttpConnector::new();
    http.set_nodelay(true);
    http.enforce_http(false);

    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new()).build(connector)
}
