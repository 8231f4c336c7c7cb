//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, dispatch)
//!     → OPTIONS: answered in place
//!     → otherwise: routing decides backend
//!     → proxy.rs (rewrite, forward, stream back)
//!     → response.rs (map failures to status codes)
//!     → CORS headers applied
//!     → Send to client
//! ```

pub mod inspect;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod upload;

pub use proxy::ForwardingProxy;
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::HttpServer;
