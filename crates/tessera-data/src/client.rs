//! SDK client
//!
//! The entry point wiring credentials, transport, cache, and the data
//! store together.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use tessera_core::{Error, Result};
use tessera_http::{
    ApiKeyCredentials, BasicRequestAuthenticator, HttpTransport, RequestAuthenticator,
};

use crate::resources::Tenant;
use crate::store::{DataStore, DataStoreConfig};

/// A Tessera API client.
///
/// Cheap to clone; clones share the underlying data store, identity map,
/// and connection pool.
#[derive(Clone)]
pub struct Client {
    data_store: DataStore,
}

impl Client {
    /// Start building a client for the given API base URL.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            config: DataStoreConfig::new(base_url),
            credentials: None,
            transport: None,
            authenticator: None,
        }
    }

    /// The resource data store behind this client.
    #[must_use]
    pub fn data_store(&self) -> &DataStore {
        &self.data_store
    }

    /// Fetch the current tenant (the one the credentials belong to).
    pub async fn current_tenant(&self, cancel: &CancellationToken) -> Result<Tenant> {
        self.data_store
            .get_resource("tenants/current", cancel)
            .await
    }

    /// Verify connectivity and credentials with a lightweight call.
    pub async fn test_connection(&self, cancel: &CancellationToken) -> Result<()> {
        self.current_tenant(cancel).await.map(|_| ())
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    config: DataStoreConfig,
    credentials: Option<ApiKeyCredentials>,
    transport: Option<Arc<dyn HttpTransport>>,
    authenticator: Option<Arc<dyn RequestAuthenticator>>,
}

impl ClientBuilder {
    /// Authenticate with an API key pair.
    #[must_use]
    pub fn with_api_key(mut self, credentials: ApiKeyCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replace the whole data-store configuration.
    #[must_use]
    pub fn with_config(mut self, config: DataStoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Disable the identity-map cache: repeated materializations of one
    /// href stop sharing state.
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.config.cache_enabled = false;
        self
    }

    /// Inject a transport (testing, instrumentation).
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Inject a custom request authenticator, overriding the API key.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn RequestAuthenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<Client> {
        let authenticator: Arc<dyn RequestAuthenticator> = match (self.authenticator, self.credentials)
        {
            (Some(authenticator), _) => authenticator,
            (None, Some(credentials)) => Arc::new(BasicRequestAuthenticator::new(credentials)),
            (None, None) => {
                return Err(Error::InvalidConfig {
                    message: "no credentials configured: provide an API key or an authenticator"
                        .to_string(),
                })
            }
        };
        let mut builder = DataStore::builder(self.config).with_authenticator(authenticator);
        if let Some(transport) = self.transport {
            builder = builder.with_transport(transport);
        }
        let data_store = builder.build()?;
        info!(base_url = %data_store.base_url(), "tessera client ready");
        Ok(Client { data_store })
    }
}
