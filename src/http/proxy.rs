//! Request forwarding to a backend.
//!
//! # Responsibilities
//! - Rewrite the destination to the backend's scheme and authority
//! - Rewrite `Host`, strip hop-by-hop headers, add X-Forwarded-For
//! - Stream request and response bodies without buffering
//! - Classify transport failures (unreachable / timed out / failed)
//!
//! # Design Decisions
//! - One pooled client shared by all requests; connections are reused
//!   per backend origin
//! - Outbound requests always use HTTP/1.1
//! - The response-head wait is bounded by `upstream_secs`, counted from
//!   the end of the request body; the response body is streamed as it
//!   arrives
//! - Dropping the returned future abandons the backend request

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response, Version};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::{ObservabilityConfig, TimeoutConfig};
use crate::http::inspect::InspectedBody;
use crate::http::request::request_id;
use crate::http::response::ProxyError;
use crate::http::upload::UploadBody;
use crate::routing::Upstream;
use crate::security::headers::{append_forwarded_for, strip_hop_by_hop};

/// Pooled HTTP/HTTPS client used for all backends.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Forwards requests to backends.
#[derive(Clone)]
pub struct ForwardingProxy {
    client: HttpClient,
    upstream_timeout: Duration,
    body_log_limit: Option<usize>,
}

impl ForwardingProxy {
    /// Build the proxy and its connection pool.
    pub fn new(timeouts: &TimeoutConfig, observability: &ObservabilityConfig) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .build(https);

        Self {
            client,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
            body_log_limit: observability
                .log_bodies
                .then_some(observability.body_log_limit),
        }
    }

    /// Send `request` to `upstream` and return its response with a
    /// streaming body.
    pub async fn forward(
        &self,
        request: Request<Body>,
        upstream: &Upstream,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, ProxyError> {
        let request_id = request_id(request.headers());
        let (mut parts, body) = request.into_parts();

        parts.uri = upstream.rewrite_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        let host = HeaderValue::from_str(upstream.authority().as_str())
            .map_err(axum::http::Error::from)?;
        parts.headers.insert(header::HOST, host);
        if let Some(addr) = client_addr {
            append_forwarded_for(&mut parts.headers, addr.ip());
        }

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            uri = %parts.uri,
            "Forwarding request to backend"
        );

        let backend = upstream.to_string();
        let (body, uploaded) = UploadBody::new(body);
        let outbound = Request::from_parts(parts, Body::new(body));

        // The deadline starts once the request body is fully sent.
        let upstream_timeout = self.upstream_timeout;
        let deadline = async move {
            let _ = uploaded.await;
            tokio::time::sleep(upstream_timeout).await;
        };

        let response = tokio::select! {
            result = self.client.request(outbound) => match result {
                Ok(response) => response,
                Err(source) if source.is_connect() => {
                    return Err(ProxyError::BackendUnreachable { backend, source });
                }
                Err(source) => return Err(ProxyError::BackendFailed { backend, source }),
            },
            () = deadline => {
                return Err(ProxyError::BackendTimeout {
                    backend,
                    timeout: upstream_timeout,
                });
            }
        };

        tracing::debug!(
            request_id = %request_id,
            status = %response.status(),
            "Received response from backend"
        );

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);

        let body = match self.body_log_limit {
            Some(limit) => Body::new(InspectedBody::new(body, limit, request_id)),
            None => Body::new(body),
        };

        Ok(Response::from_parts(parts, body))
    }
}
