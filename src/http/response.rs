//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Describe every way a request can fail to reach a backend
//! - Map those failures to appropriate HTTP status codes
//!
//! # Design Decisions
//! - Failures are per-request and never fatal to the process
//! - Backend connect failures return 502 Bad Gateway
//! - Backend timeouts result in 504 Gateway Timeout
//! - A misconfigured backend URL returns 500 for that request only

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::routing::BackendUrlError;

/// Errors raised while dispatching or forwarding a request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("no route matches {0}")]
    RouteNotFound(String),

    #[error("route {route} has an invalid backend: {source}")]
    InvalidBackend {
        route: String,
        #[source]
        source: BackendUrlError,
    },

    #[error("could not build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("backend {backend} unreachable: {source}")]
    BackendUnreachable {
        backend: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("backend {backend} did not respond within {timeout:?}")]
    BackendTimeout { backend: String, timeout: Duration },

    #[error("backend {backend} failed: {source}")]
    BackendFailed {
        backend: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
}

impl ProxyError {
    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::InvalidBackend { .. } | ProxyError::Request(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::BackendUnreachable { .. } | ProxyError::BackendFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::BackendTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Short body text; internal details stay in the logs.
    fn public_message(&self) -> &'static str {
        match self {
            ProxyError::RouteNotFound(_) => "No matching route found",
            ProxyError::InvalidBackend { .. } => "Route backend is misconfigured",
            ProxyError::Request(_) => "Could not build upstream request",
            ProxyError::BackendUnreachable { .. } => "Upstream unreachable",
            ProxyError::BackendTimeout { .. } => "Upstream timed out",
            ProxyError::BackendFailed { .. } => "Upstream request failed",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}
