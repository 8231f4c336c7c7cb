//! CORS-injecting reverse proxy library.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (dispatch)
//!                        │
//!                        ├─ OPTIONS ──▶ security::cors ──▶ 200, no backend contact
//!                        │
//!                        └─ other ──▶ routing (exact, then prefix)
//!                                        │
//!                                        ├─ no match ──▶ 404
//!                                        ▼
//!                                    http::proxy ──────────────▶ Backend
//!                                        │
//!     Client Response                    ▼
//!     ◀────────────── security::cors ◀── response / 5xx error
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
