//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (read Origin, check against allow-list)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-For)
//!     → Pass to routing / forwarding
//!
//! Outgoing response (preflight, proxied, or error):
//!     → headers.rs (strip hop-by-hop)
//!     → cors.rs (reflect allowed origin)
//! ```
//!
//! # Design Decisions
//! - Pure functions over explicit inputs; no global state
//! - Disallowed origins are not rejected server-side

pub mod cors;
pub mod headers;
pub mod origin;

pub use origin::{is_allowed, request_origin, AllowList};
