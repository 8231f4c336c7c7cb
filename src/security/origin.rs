//! Origin allow-list.
//!
//! # Design Decisions
//! - Exact, case-sensitive comparison; no scheme or port normalization
//! - `"*"` in the list permits every present origin
//! - An absent or empty `Origin` is never allowed, even with `"*"`

use std::collections::HashSet;

use axum::http::{header, HeaderMap};

/// Literal that permits every origin.
pub const WILDCARD: &str = "*";

/// Configured set of origins allowed to read proxied responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    any: bool,
    origins: HashSet<String>,
}

impl AllowList {
    /// True if the list contains `"*"`.
    pub fn is_wildcard(&self) -> bool {
        self.any
    }

    /// True if nothing at all is allowed.
    pub fn is_empty(&self) -> bool {
        !self.any && self.origins.is_empty()
    }

    /// See [`is_allowed`].
    pub fn permits(&self, origin: Option<&str>) -> bool {
        match origin {
            Some(origin) if !origin.is_empty() => self.any || self.origins.contains(origin),
            _ => false,
        }
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::default();
        for origin in iter {
            let origin = origin.into();
            if origin == WILDCARD {
                list.any = true;
            } else {
                list.origins.insert(origin);
            }
        }
        list
    }
}

/// Decide whether `origin` may read the response.
pub fn is_allowed(origin: Option<&str>, allow_list: &AllowList) -> bool {
    allow_list.permits(origin)
}

/// The request's `Origin` header, if present, non-empty, and valid UTF-8.
pub fn request_origin(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .filter(|origin| !origin.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn exact_match_only() {
        let list: AllowList = ["https://a.test", "http://localhost:3000"].into_iter().collect();

        assert!(is_allowed(Some("https://a.test"), &list));
        assert!(is_allowed(Some("http://localhost:3000"), &list));
        assert!(!is_allowed(Some("https://A.test"), &list));
        assert!(!is_allowed(Some("https://a.test:443"), &list));
        assert!(!is_allowed(Some("http://a.test"), &list));
        assert!(!is_allowed(Some("https://evil.test"), &list));
    }

    #[test]
    fn wildcard_allows_any_present_origin() {
        let list: AllowList = ["*"].into_iter().collect();
        assert!(list.is_wildcard());

        for origin in ["https://a.test", "null", "http://127.0.0.1:8080", "anything"] {
            assert!(is_allowed(Some(origin), &list), "{origin} should be allowed");
        }
    }

    #[test]
    fn absent_origin_is_never_allowed() {
        let wildcard: AllowList = ["*"].into_iter().collect();
        let listed: AllowList = ["https://a.test"].into_iter().collect();

        assert!(!is_allowed(None, &wildcard));
        assert!(!is_allowed(None, &listed));
        assert!(!is_allowed(Some(""), &wildcard));
        assert!(!is_allowed(Some("https://a.test"), &AllowList::default()));
    }

    #[test]
    fn extracts_origin_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_origin(&headers), None);

        headers.insert(header::ORIGIN, HeaderValue::from_static(""));
        assert_eq!(request_origin(&headers), None);

        headers.insert(header::ORIGIN, HeaderValue::from_static("https://a.test"));
        assert_eq!(request_origin(&headers), Some("https://a.test"));

        headers.insert(header::ORIGIN, HeaderValue::from_bytes(b"https://\xff.test").unwrap());
        assert_eq!(request_origin(&headers), None);
    }
}
