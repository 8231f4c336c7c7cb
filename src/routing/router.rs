//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes in configuration order
//! - Look up the route for a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Two passes: exact equality first, then prefix, each in config order
//! - Explicit NoMatch rather than silent default
//! - A route whose backend URL failed to parse still matches; the
//!   dispatcher turns it into a 500 for that request

use crate::config::RouteConfig;
use crate::routing::backend::{BackendUrlError, Upstream};
use crate::routing::matcher::{PathMatcher, PatternError};

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    matcher: PathMatcher,
    backend: Result<Upstream, BackendUrlError>,
}

impl Route {
    /// Compile a route from its configuration.
    ///
    /// Only the pattern can fail here; a bad backend URL is kept and
    /// reported through [`Route::upstream`].
    pub fn compile(config: &RouteConfig) -> Result<Self, PatternError> {
        let matcher = PathMatcher::compile(config.kind, config.path.as_str())?;
        Ok(Self {
            name: config.name.clone().unwrap_or_else(|| config.path.clone()),
            matcher,
            backend: Upstream::parse(&config.backend),
        })
    }

    /// Configured name, or the path pattern when none was given.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compiled path pattern.
    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    /// The backend to forward to, or why it cannot be used.
    pub fn upstream(&self) -> Result<&Upstream, &BackendUrlError> {
        self.backend.as_ref()
    }
}

/// Outcome of resolving a path.
#[derive(Debug, Clone, Copy)]
pub enum RouteMatch<'a> {
    Matched(&'a Route),
    NoMatch,
}

/// Select the route for `path`: first exact match in order, otherwise the
/// first prefix match in order.
pub fn resolve<'a>(path: &str, routes: &'a [Route]) -> RouteMatch<'a> {
    if let Some(route) = routes.iter().find(|r| r.matcher.matches_exact(path)) {
        return RouteMatch::Matched(route);
    }

    routes
        .iter()
        .find(|r| r.matcher.matches_prefix(path))
        .map_or(RouteMatch::NoMatch, RouteMatch::Matched)
}

/// Immutable route table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Build the table from configuration.
    ///
    /// Routes with malformed patterns are skipped with a warning.
    pub fn from_config(configs: &[RouteConfig]) -> Self {
        let mut routes = Vec::with_capacity(configs.len());

        for config in configs {
            match Route::compile(config) {
                Ok(route) => {
                    if let Err(e) = route.upstream() {
                        tracing::warn!(
                            route = %route.name(),
                            backend = %config.backend,
                            error = %e,
                            "Route has an invalid backend; requests to it will fail"
                        );
                    }
                    routes.push(route);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %config.path,
                        error = %e,
                        "Skipping route with malformed pattern"
                    );
                }
            }
        }

        tracing::debug!(route_count = routes.len(), "Route table compiled");
        Self { routes }
    }

    /// Resolve `path` against the table.
    pub fn resolve(&self, path: &str) -> RouteMatch<'_> {
        resolve(path, &self.routes)
    }

    /// Compiled routes in configuration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of compiled routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True if no route survived compilation.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
