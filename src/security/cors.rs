//! CORS response headers.
//!
//! # Responsibilities
//! - Write the four `Access-Control-Allow-*` headers for allowed origins
//! - Leave the response untouched for everyone else
//!
//! # Design Decisions
//! - The request origin is reflected, never `*`, so credentialed
//!   requests keep working under a wildcard allow-list
//! - Disallowed origins are not rejected; the browser enforces CORS
//! - Headers are replaced, not appended, so applying twice is a no-op

use axum::http::{header, HeaderMap, HeaderValue};

use crate::security::origin::{is_allowed, AllowList};

/// Value of `Access-Control-Allow-Methods`.
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Value of `Access-Control-Allow-Headers`.
pub const ALLOW_HEADERS: &str = "Accept, Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization, x-tenant-id, x-request-id";

/// Value of `Access-Control-Allow-Credentials`.
pub const ALLOW_CREDENTIALS: &str = "true";

/// Set CORS headers on `headers` if `origin` is allowed.
///
/// Returns whether headers were written.
pub fn apply(headers: &mut HeaderMap, origin: Option<&str>, allow_list: &AllowList) -> bool {
    if !is_allowed(origin, allow_list) {
        return false;
    }
    let Some(origin) = origin.and_then(|o| HeaderValue::from_str(o).ok()) else {
        return false;
    };

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static(ALLOW_CREDENTIALS),
    );
    true
}
