//! Request authentication capability
//!
//! Signing is pluggable: the data store applies a [`RequestAuthenticator`]
//! to every outgoing request before execution. [`BasicRequestAuthenticator`]
//! is the reference implementation; digest schemes can consume the
//! canonical query-string rendering from [`crate::query::QueryString`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use tessera_core::Result;

use crate::message::HttpRequest;

/// API key id/secret pair.
///
/// The [`Debug`] impl redacts the secret to prevent accidental credential
/// exposure in log output.
#[derive(Clone)]
pub struct ApiKeyCredentials {
    id: String,
    secret: String,
}

impl ApiKeyCredentials {
    /// Create credentials from an id/secret pair.
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }

    /// The API key id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The API key secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("id", &self.id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Applies authentication to an outgoing wire request.
pub trait RequestAuthenticator: Send + Sync {
    /// Mutate the request to carry authentication material.
    fn authenticate(&self, request: &mut HttpRequest) -> Result<()>;
}

/// HTTP Basic authentication over an API key pair.
#[derive(Debug, Clone)]
pub struct BasicRequestAuthenticator {
    credentials: ApiKeyCredentials,
}

impl BasicRequestAuthenticator {
    /// Create an authenticator for the given credentials.
    #[must_use]
    pub fn new(credentials: ApiKeyCredentials) -> Self {
        Self { credentials }
    }
}

impl RequestAuthenticator for BasicRequestAuthenticator {
    fn authenticate(&self, request: &mut HttpRequest) -> Result<()> {
        let token = STANDARD.encode(format!(
            "{}:{}",
            self.credentials.id, self.credentials.secret
        ));
        request.headers.set("Authorization", format!("Basic {token}"));
        Ok(())
    }
}

/// No-op authenticator for anonymous or test use.
#[derive(Debug, Clone, Default)]
pub struct NoopAuthenticator;

impl RequestAuthenticator for NoopAuthenticator {
    fn authenticate(&self, _request: &mut HttpRequest) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::HttpMethod;
    use crate::query::CanonicalUri;

    #[test]
    fn test_basic_authenticator_sets_header() {
        let authenticator =
            BasicRequestAuthenticator::new(ApiKeyCredentials::new("my-id", "my-secret"));
        let mut request = HttpRequest::new(
            HttpMethod::Get,
            CanonicalUri::from_absolute("https://api.example.com/v1/tenants/current").unwrap(),
        );
        authenticator.authenticate(&mut request).unwrap();
        let header = request.headers.get("Authorization").unwrap();
        assert!(header.starts_with("Basic "));
        // base64("my-id:my-secret")
        assert_eq!(header, "Basic bXktaWQ6bXktc2VjcmV0");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = ApiKeyCredentials::new("my-id", "super-secret");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("my-id"));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
