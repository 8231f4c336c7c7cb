//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Request, Response};
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use cors_proxy::config::{MatchKind, ProxyConfig, RouteConfig};
use cors_proxy::http::HttpServer;
use cors_proxy::lifecycle::Shutdown;

pub const ALLOWED_ORIGIN: &str = "https://a.test";

/// Handle to a proxy running on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Base configuration allowing [`ALLOWED_ORIGIN`] with short timeouts.
pub fn config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.allowed_origins = vec![ALLOWED_ORIGIN.to_string()];
    config.timeouts.connect_secs = 1;
    config.timeouts.upstream_secs = 2;
    config
}

pub fn route(path: &str, backend: SocketAddr, kind: MatchKind) -> RouteConfig {
    RouteConfig {
        name: None,
        path: path.to_string(),
        backend: format!("http://{backend}"),
        kind,
    }
}

/// Start the proxy on 127.0.0.1 with an OS-assigned port.
pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Read an HTTP request head from `socket`, discarding it.
async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

async fn bind_backend() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Start a backend that answers every request with `body` and counts
/// accepted connections.
pub async fn start_mock_backend(body: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
    let (listener, addr) = bind_backend().await;
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, connections)
}

/// Start a backend that sends half a status line and then closes.
pub async fn start_resetting_backend() -> SocketAddr {
    let (listener, addr) = bind_backend().await;

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let _ = socket.write_all(b"HTTP/1.1 200 OK\r\nContent-Le").await;
                drop(socket);
            });
        }
    });

    addr
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let (listener, addr) = bind_backend().await;

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            });
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn closed_address() -> SocketAddr {
    let (listener, addr) = bind_backend().await;
    drop(listener);
    addr
}

fn copy_header(from: &axum::http::HeaderMap, name: impl header::AsHeaderName, to: &mut axum::http::HeaderMap, as_name: &'static str) {
    if let Some(value) = from.get(name) {
        to.insert(HeaderName::from_static(as_name), value.clone());
    }
}

/// Start an Axum backend that echoes the request body and reports what
/// it received in `x-echo-*` headers.
pub async fn start_echo_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let (listener, addr) = bind_backend().await;
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = Router::new().fallback(move |request: Request<Body>| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let (parts, body) = request.into_parts();
            let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

            let mut response = Response::new(Body::from(bytes));
            let headers = response.headers_mut();
            headers.insert(
                "x-echo-method",
                HeaderValue::from_str(parts.method.as_str()).unwrap(),
            );
            headers.insert(
                "x-echo-uri",
                HeaderValue::from_str(&parts.uri.to_string()).unwrap(),
            );
            copy_header(&parts.headers, header::HOST, headers, "x-echo-host");
            copy_header(&parts.headers, "x-forwarded-for", headers, "x-echo-forwarded-for");
            copy_header(&parts.headers, "x-request-id", headers, "x-echo-request-id");
            copy_header(&parts.headers, header::AUTHORIZATION, headers, "x-echo-authorization");
            response
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, hits)
}
