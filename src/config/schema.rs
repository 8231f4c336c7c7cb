//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::MatchKind;

/// Root configuration for the CORS proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (interface and port).
    pub listener: ListenerConfig,

    /// Origins allowed to read proxied responses. `"*"` permits any origin.
    pub allowed_origins: Vec<String>,

    /// Catch-all backend, treated as a prefix route on `/` after `routes`.
    pub backend: Option<String>,

    /// Route definitions, evaluated in order.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Build a single-backend configuration from the command-line pair
    /// `<allowed_origins> <backend_url>`.
    pub fn from_args(allowed_origins: &str, backend_url: &str) -> Self {
        Self {
            allowed_origins: allowed_origins
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            backend: Some(backend_url.to_string()),
            ..Self::default()
        }
    }

    /// Routes in evaluation order, with the catch-all backend appended.
    pub fn effective_routes(&self) -> Vec<RouteConfig> {
        let mut routes = self.routes.clone();
        if let Some(backend) = &self.backend {
            routes.push(RouteConfig {
                name: Some("default".to_string()),
                path: "/".to_string(),
                backend: backend.clone(),
                kind: MatchKind::Prefix,
            });
        }
        routes
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to listen on (IP address or host name).
    pub listen: String,

    /// Port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        if self.listen.contains(':') && !self.listen.starts_with('[') {
            format!("[{}]:{}", self.listen, self.port)
        } else {
            format!("{}:{}", self.listen, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            listen: "localhost".to_string(),
            port: 4001,
        }
    }
}

/// Route configuration mapping a path pattern to a backend URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics. Defaults to the path.
    #[serde(default)]
    pub name: Option<String>,

    /// Path pattern (e.g. "/api").
    pub path: String,

    /// Absolute backend URL (e.g. "http://127.0.0.1:3000").
    pub backend: String,

    /// Match kind (default: prefix).
    #[serde(default, rename = "match")]
    pub kind: MatchKind,
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the backend to produce response headers once the
    /// request body has been sent, in seconds.
    pub upstream_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            idle_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log a prefix of each backend response body at debug level.
    pub log_bodies: bool,

    /// Maximum number of body bytes captured for logging.
    pub body_log_limit: usize,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_bodies: false,
            body_log_limit: 4096,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
