//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every backend is an absolute http(s) URL
//! - Check that every path pattern is a supported exact/prefix pattern
//! - Validate value ranges (timeouts > 0, origin list present)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderValue;

use crate::config::schema::ProxyConfig;
use crate::routing::backend::{BackendUrlError, Upstream};
use crate::routing::matcher::{PathMatcher, PatternError};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("allowed_origins must list at least one origin (or \"*\")")]
    MissingOrigins,

    #[error("allowed origin {0:?} is not a valid header value")]
    InvalidOrigin(String),

    #[error("no routes configured: set `backend` or add [[routes]]")]
    NoRoutes,

    #[error("route {route}: backend {url:?} rejected: {source}")]
    InvalidBackend {
        route: String,
        url: String,
        #[source]
        source: BackendUrlError,
    },

    #[error("route {route}: {source}")]
    InvalidPattern {
        route: String,
        #[source]
        source: PatternError,
    },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.allowed_origins.is_empty() {
        errors.push(ValidationError::MissingOrigins);
    }
    for origin in &config.allowed_origins {
        if origin.is_empty() || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    let routes = config.effective_routes();
    if routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }
    for route in &routes {
        let name = route.name.clone().unwrap_or_else(|| route.path.clone());

        if let Err(source) = PathMatcher::compile(route.kind, route.path.as_str()) {
            errors.push(ValidationError::InvalidPattern {
                route: name.clone(),
                source,
            });
        }
        if let Err(source) = Upstream::parse(&route.backend) {
            errors.push(ValidationError::InvalidBackend {
                route: name,
                url: route.backend.clone(),
                source,
            });
        }
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("upstream_secs", timeouts.upstream_secs),
        ("idle_secs", timeouts.idle_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
