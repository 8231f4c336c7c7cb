//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener with graceful shutdown
//! - Answer preflight requests without contacting a backend
//! - Dispatch other requests to the routing engine and forwarding proxy
//! - Apply CORS headers to every response, including errors

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::proxy::ForwardingProxy;
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::ProxyError;
use crate::observability::metrics;
use crate::routing::{RouteMatch, Router as RouteTable};
use crate::security::{cors, request_origin, AllowList};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub allow_list: Arc<AllowList>,
    pub proxy: ForwardingProxy,
}

/// HTTP server for the CORS proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let routes = Arc::new(RouteTable::from_config(&config.effective_routes()));
        let allow_list: Arc<AllowList> = Arc::new(config.allowed_origins.iter().collect());
        let proxy = ForwardingProxy::new(&config.timeouts, &config.observability);

        tracing::info!(
            routes = routes.len(),
            wildcard_origin = allow_list.is_wildcard(),
            "Dispatcher initialized"
        );

        let state = AppState {
            routes,
            allow_list,
            proxy,
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for serving on a custom transport or in tests.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, accepting connections on
    /// the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
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

/// Entry point for every request.
///
/// OPTIONS is answered directly; everything else is routed and forwarded.
/// CORS headers are applied to whatever response results.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().clone();
    let origin = request_origin(request.headers()).map(str::to_owned);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        origin = origin.as_deref().unwrap_or(""),
        "Received request"
    );

    let (mut response, route) = if method == Method::OPTIONS {
        (StatusCode::OK.into_response(), "preflight")
    } else {
        forward_to_route(&state, request, &request_id).await
    };

    let allowed = cors::apply(response.headers_mut(), origin.as_deref(), &state.allow_list);
    if !allowed {
        if let Some(origin) = &origin {
            tracing::debug!(
                request_id = %request_id,
                origin = %origin,
                "Origin not allowed, CORS headers omitted"
            );
        }
    }

    metrics::record_request(method.as_str(), response.status().as_u16(), route, start_time);
    response
}

/// Resolve the route for `request` and forward it.
///
/// Returns the response (backend or error) and the route label.
async fn forward_to_route<'a>(
    state: &'a AppState,
    request: Request<Body>,
    request_id: &str,
) -> (Response, &'a str) {
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let route = match state.routes.resolve(request.uri().path()) {
        RouteMatch::Matched(route) => route,
        RouteMatch::NoMatch => {
            let path = request.uri().path().to_string();
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
            return (ProxyError::RouteNotFound(path).into_response(), "none");
        }
    };

    let upstream = match route.upstream() {
        Ok(upstream) => upstream,
        Err(source) => {
            let error = ProxyError::InvalidBackend {
                route: route.name().to_string(),
                source: source.clone(),
            };
            tracing::error!(request_id = %request_id, error = %error, "Cannot forward request");
            return (error.into_response(), route.name());
        }
    };

    match state.proxy.forward(request, upstream, client_addr).await {
        Ok(response) => (response, route.name()),
        Err(error) => {
            tracing::error!(
                request_id = %request_id,
                route = %route.name(),
                backend = %upstream,
                status = %error.status(),
                error = %error,
                "Upstream error"
            );
            (error.into_response(), route.name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MatchKind, RouteConfig};
    use axum::http::header;
    use tower::ServiceExt;

    fn config(routes: &[(&str, &str)]) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.allowed_origins = vec!["https://a.test".to_string()];
        config.timeouts.connect_secs = 1;
        config.timeouts.upstream_secs = 2;
        for (path, backend) in routes {
            config.routes.push(RouteConfig {
                name: None,
                path: path.to_string(),
                backend: backend.to_string(),
                kind: MatchKind::Prefix,
            });
        }
        config
    }

    #[tokio::test]
    async fn preflight_is_answered_locally() {
        // The backend address is never dialled for OPTIONS.
        let app = HttpServer::new(config(&[("/", "http://192.0.2.1:9")])).app();

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/users")
                    .header(header::ORIGIN, "https://a.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://a.test"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert!(response.headers().contains_key(X_REQUEST_ID));

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn preflight_from_unknown_origin_has_no_cors_headers() {
        let app = HttpServer::new(config(&[])).app();

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header(header::ORIGIN, "https://evil.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn unmatched_path_is_404_with_cors() {
        let app = HttpServer::new(config(&[("/api", "http://192.0.2.1:9")])).app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/unknown")
                    .header(header::ORIGIN, "https://a.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://a.test"
        );
    }

    #[tokio::test]
    async fn invalid_backend_is_500_with_cors() {
        let app = HttpServer::new(config(&[("/", "not-a-url")])).app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/x")
                    .header(header::ORIGIN, "https://a.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://a.test"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn caller_request_id_is_echoed() {
        let app = HttpServer::new(config(&[])).app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nothing")
                    .header(X_REQUEST_ID, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[X_REQUEST_ID], "req-42");
    }
}
