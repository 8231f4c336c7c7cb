//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (route lookup)
//!     → matcher.rs (exact pass, then prefix pass)
//!     → Return: matched Route or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[] (config order)
//!     → Compile matchers, parse backend URLs (backend.rs)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (literal exact/prefix matching only)
//! - Deterministic: same input always matches same route
//! - Exact matches beat prefix matches; otherwise first match wins

pub mod backend;
pub mod matcher;
pub mod router;

pub use backend::{BackendUrlError, Upstream};
pub use matcher::{MatchKind, PathMatcher, PatternError};
pub use router::{resolve, Route, RouteMatch, Router};
