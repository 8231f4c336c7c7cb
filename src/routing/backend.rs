//! Backend (upstream) address abstraction.
//!
//! # Responsibilities
//! - Parse a configured backend URL once
//! - Keep the scheme and authority used to rewrite outbound requests
//!
//! # Design Decisions
//! - Only scheme and authority are taken from the backend URL; the
//!   inbound path and query are forwarded untouched
//! - Only `http` and `https` backends are accepted

use std::fmt;
use std::str::FromStr;

use axum::http::uri::{Authority, Scheme};
use axum::http::Uri;
use url::Url;

/// Reasons a backend URL cannot be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendUrlError {
    #[error("invalid URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme `{0}` (expected http or https)")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("invalid authority `{0}`")]
    InvalidAuthority(String),
}

/// A parsed backend target.
#[derive(Debug, Clone)]
pub struct Upstream {
    url: Url,
    scheme: Scheme,
    authority: Authority,
}

impl Upstream {
    /// Parse an absolute backend URL such as `http://127.0.0.1:3000`.
    pub fn parse(raw: &str) -> Result<Self, BackendUrlError> {
        let url = Url::parse(raw)?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(BackendUrlError::UnsupportedScheme(other.to_string())),
        };

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or(BackendUrlError::MissingHost)?;

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority)
            .map_err(|_| BackendUrlError::InvalidAuthority(authority.clone()))?;

        Ok(Self {
            url,
            scheme,
            authority,
        })
    }

    /// The URL as configured.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `http` or `https`.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Host and optional port, also used as the outbound `Host` header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Point `uri` at this backend, keeping its path and query.
    pub fn rewrite_uri(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}
