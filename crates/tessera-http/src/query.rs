//! Query strings and canonical URIs
//!
//! Ordered key/value query parameters with two renderings: the default
//! wire form, which leaves datetime-range literals (`[ ] ( ) : ,`) raw so
//! interval filters like `createdAt=[2015-01-01,2015-02-01)` survive
//! untouched, and the canonical form used for request signing, where
//! everything is percent-encoded and pairs are sorted by key.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use url::Url;

use tessera_core::{Error, Result};

/// Encode set for the default rendering: RFC 3986 unreserved characters,
/// the search wildcard `*`, and the datetime-range literals stay raw.
const DEFAULT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'*')
    .remove(b'[')
    .remove(b']')
    .remove(b'(')
    .remove(b')')
    .remove(b':')
    .remove(b',');

/// Encode set for the canonical rendering: only unreserved characters
/// survive unencoded.
const CANONICAL_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// An ordered collection of query parameters.
///
/// Insertion order and original casing are preserved; `set` replaces an
/// existing key in place rather than reordering it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    /// Create an empty query string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (`a=1&b=2`). Percent-escapes are decoded;
    /// parameters without a value get an empty one.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut query = Self::new();
        for part in raw.trim_start_matches('?').split('&') {
            if part.is_empty() {
                continue;
            }
            let (key, value) = match part.split_once('=') {
                Some((k, v)) => (k, v),
                None => (part, ""),
            };
            let key = percent_decode_str(key).decode_utf8_lossy().into_owned();
            let value = percent_decode_str(value).decode_utf8_lossy().into_owned();
            query.pairs.push((key, value));
        }
        query
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Get the value for a key, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a key to a value. Replaces an existing entry in place,
    /// otherwise appends.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Append a pair without replacing existing entries for the key.
    /// Repeated keys are legal on the wire (`color=red&color=blue`).
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(index).1)
    }

    /// Merge another query string into this one. Keys from `other` win on
    /// collision; their casing is preserved as given in `other`.
    pub fn merge(&mut self, other: &QueryString) {
        for (key, value) in &other.pairs {
            self.set(key.clone(), value.clone());
        }
    }

    /// Iterate over the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render in canonical form: fully percent-encoded, including the
    /// datetime-range literals, with pairs sorted lexicographically by key.
    #[must_use]
    pub fn to_canonical_string(&self) -> String {
        let mut sorted: Vec<&(String, String)> = self.pairs.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        sorted
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, CANONICAL_SET),
                    utf8_percent_encode(v, CANONICAL_SET)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .pairs
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, DEFAULT_SET),
                    utf8_percent_encode(v, DEFAULT_SET)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        f.write_str(&rendered)
    }
}

impl FromIterator<(String, String)> for QueryString {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut query = Self::new();
        for (key, value) in iter {
            query.set(key, value);
        }
        query
    }
}

/// An absolute resource URI plus its query parameters.
///
/// The scheme and host are normalized to lowercase by the URL parser, so
/// the identity-map key derived from a canonical URI is stable across
/// differently-cased inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUri {
    url: Url,
    query: QueryString,
}

impl CanonicalUri {
    /// Parse an absolute href. Fails with [`Error::InvalidConfig`] when the
    /// input is relative or has no host.
    pub fn from_absolute(href: &str) -> Result<Self> {
        let mut url = Url::parse(href).map_err(|e| Error::InvalidConfig {
            message: format!("invalid absolute href '{href}': {e}"),
        })?;
        if url.host_str().is_none() {
            return Err(Error::InvalidConfig {
                message: format!("href '{href}' has no host"),
            });
        }
        let query = url.query().map(QueryString::parse).unwrap_or_default();
        url.set_query(None);
        Ok(Self { url, query })
    }

    /// Resolve an href against a base URL. Absolute hrefs are taken as-is;
    /// relative ones are joined onto the base.
    pub fn resolve(base: &Url, href: &str) -> Result<Self> {
        if href.starts_with("http://") || href.starts_with("https://") {
            return Self::from_absolute(href);
        }
        let joined = base.join(href).map_err(|e| Error::InvalidConfig {
            message: format!("cannot resolve '{href}' against '{base}': {e}"),
        })?;
        Self::from_absolute(joined.as_str())
    }

    /// The href without its query string.
    #[must_use]
    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    /// The query parameters.
    #[must_use]
    pub fn query(&self) -> &QueryString {
        &self.query
    }

    /// Mutable access to the query parameters.
    pub fn query_mut(&mut self) -> &mut QueryString {
        &mut self.query
    }

    /// Case-insensitive key identifying this resource in the identity map.
    /// The query string is not part of resource identity.
    #[must_use]
    pub fn identity_key(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_lowercase()
    }

    /// Render the full URI in canonical (signing) form.
    #[must_use]
    pub fn to_canonical_string(&self) -> String {
        if self.query.is_empty() {
            self.url.to_string()
        } else {
            format!("{}?{}", self.url, self.query.to_canonical_string())
        }
    }
}

impl fmt::Display for CanonicalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            write!(f, "{}", self.url)
        } else {
            write!(f, "{}?{}", self.url, self.query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_get() {
        let query = QueryString::parse("orderBy=email&limit=25");
        assert_eq!(query.get("orderBy"), Some("email"));
        assert_eq!(query.get("limit"), Some("25"));
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut query = QueryString::parse("a=1&b=2&c=3");
        query.set("b", "9");
        assert_eq!(query.to_string(), "a=1&b=9&c=3");
    }

    #[test]
    fn test_merge_override_priority() {
        let mut base = QueryString::parse("limit=25&orderBy=email");
        let overrides = QueryString::parse("limit=50&expand=groups");
        base.merge(&overrides);
        assert_eq!(base.to_string(), "limit=50&orderBy=email&expand=groups");
    }

    #[test]
    fn test_default_rendering_keeps_range_literals() {
        let mut query = QueryString::new();
        query.set("createdAt", "[2015-01-01T00:00:00Z,2015-02-01T00:00:00Z)");
        assert_eq!(
            query.to_string(),
            "createdAt=[2015-01-01T00:00:00Z,2015-02-01T00:00:00Z)"
        );
    }

    #[test]
    fn test_default_rendering_keeps_wildcards_and_encodes_spaces() {
        let mut query = QueryString::new();
        query.set("email", "tk421*");
        query.set("q", "darth vader");
        assert_eq!(query.to_string(), "email=tk421*&q=darth%20vader");
    }

    #[test]
    fn test_canonical_rendering_encodes_everything_and_sorts() {
        let mut query = QueryString::new();
        query.set("orderBy", "email");
        query.set("createdAt", "[2015,2016)");
        assert_eq!(
            query.to_canonical_string(),
            "createdAt=%5B2015%2C2016%29&orderBy=email"
        );
    }

    #[test]
    fn test_casing_preserved() {
        let query = QueryString::parse("orderBy=GivenName");
        assert_eq!(query.to_string(), "orderBy=GivenName");
    }

    #[test]
    fn test_canonical_uri_splits_query() {
        let uri = CanonicalUri::from_absolute("https://API.example.com/v1/accounts?limit=25")
            .unwrap();
        assert_eq!(uri.href(), "https://api.example.com/v1/accounts");
        assert_eq!(uri.query().get("limit"), Some("25"));
    }

    #[test]
    fn test_identity_key_case_insensitive() {
        let a = CanonicalUri::from_absolute("https://api.example.com/v1/Accounts/abc").unwrap();
        let b = CanonicalUri::from_absolute("https://api.example.com/v1/accounts/ABC").unwrap();
        assert_ne!(a.href(), b.href()); // path casing survives on the wire
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_resolve_relative_href() {
        let base = Url::parse("https://api.example.com/v1/").unwrap();
        let uri = CanonicalUri::resolve(&base, "accounts/abc").unwrap();
        assert_eq!(uri.href(), "https://api.example.com/v1/accounts/abc");
    }

    #[test]
    fn test_relative_without_base_fails() {
        let result = CanonicalUri::from_absolute("/v1/accounts/abc");
        assert!(result.is_err());
    }
}
