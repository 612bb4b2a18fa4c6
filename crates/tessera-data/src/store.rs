//! Data store
//!
//! The top-level façade composing the pipeline: turns an href plus a
//! desired type into a materialized, identity-linked resource, and turns
//! local mutations into create/update/delete calls pushed through the
//! filter chain, the retrying executor, and the field converters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use tessera_cache::{CacheConfig, CacheProvider, InMemoryCache, NullCache};
use tessera_core::{Error, PropertyValue, Result};
use tessera_http::{
    CanonicalUri, ExecutorConfig, Headers, HttpMethod, HttpRequest, HttpTransport,
    NoopAuthenticator, QueryString, ReqwestTransport, RequestAuthenticator, RequestExecutor,
};

use crate::collection::CollectionPage;
use crate::convert::ConverterChain;
use crate::data::{ResourceData, SharedResourceData};
use crate::filter::{
    DataFilter, FilterChain, ResourceAction, ResourceRequest, ResourceResult, TerminalExecutor,
};
use crate::identity::IdentityMap;
use crate::kind::ResourceKind;
use crate::query::Expansion;
use crate::resources::Resource;
use crate::serializer::{JsonSerializer, Serializer};

/// Configuration for a [`DataStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataStoreConfig {
    /// Base URL of the remote API (e.g. `https://api.example.com/v1/`).
    pub base_url: String,

    /// Retry/backoff settings for the request executor.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Identity-map expiration settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Whether the identity map caches at all; when false the null cache
    /// is used and repeated materializations never link.
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,

    /// Largest page the server will serve (default: 100). Larger `limit`
    /// requests are satisfied with multiple page fetches.
    #[serde(default = "default_page_size_ceiling")]
    pub page_size_ceiling: u32,

    /// HTTP request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_page_size_ceiling() -> u32 {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl DataStoreConfig {
    /// Create a config for the given base URL with defaults elsewhere.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            executor: ExecutorConfig::default(),
            cache: CacheConfig::default(),
            cache_enabled: default_cache_enabled(),
            page_size_ceiling: default_page_size_ceiling(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "base_url must not be empty".to_string(),
            });
        }
        Url::parse(&self.base_url).map_err(|e| Error::InvalidConfig {
            message: format!("base_url is not a valid URL: {e}"),
        })?;
        if self.page_size_ceiling == 0 {
            return Err(Error::InvalidConfig {
                message: "page_size_ceiling must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Per-request options: expansion terms merged into the query string.
///
/// Save and delete operations reject non-empty options, since their
/// expansion selectors have no corresponding query parameter.
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    expansions: Vec<Expansion>,
}

impl ResourceOptions {
    /// Create empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand a link.
    #[must_use]
    pub fn expand(mut self, name: impl Into<String>) -> Self {
        self.expansions.push(Expansion::link(name));
        self
    }

    /// Expand a collection link with a sub-range.
    #[must_use]
    pub fn expand_collection(mut self, name: impl Into<String>, offset: u32, limit: u32) -> Self {
        self.expansions.push(Expansion::collection(name, offset, limit));
        self
    }

    /// Whether any expansions were requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expansions.is_empty()
    }

    /// Compile to query parameters, validating against the kind's links.
    pub(crate) fn to_query(&self, kind: ResourceKind) -> Result<QueryString> {
        let mut query = QueryString::new();
        if self.expansions.is_empty() {
            return Ok(query);
        }
        let mut rendered = Vec::with_capacity(self.expansions.len());
        for expansion in &self.expansions {
            expansion.validate(kind)?;
            rendered.push(expansion.compile_term());
        }
        query.set("expand", rendered.join(","));
        Ok(query)
    }
}

struct Inner {
    base: Url,
    executor: RequestExecutor,
    serializer: Arc<dyn Serializer>,
    converters: ConverterChain,
    identity: IdentityMap,
    chain: FilterChain,
    authenticator: Arc<dyn RequestAuthenticator>,
    page_size_ceiling: u32,
}

#[async_trait]
impl TerminalExecutor for Inner {
    async fn execute(
        &self,
        request: ResourceRequest,
        cancel: &CancellationToken,
    ) -> Result<ResourceResult> {
        let method = match request.action {
            ResourceAction::Create | ResourceAction::Update => HttpMethod::Post,
            ResourceAction::Read => HttpMethod::Get,
            ResourceAction::Delete => HttpMethod::Delete,
        };
        let mut headers = Headers::new();
        headers.set("Accept", "application/json");
        let body = if matches!(
            request.action,
            ResourceAction::Create | ResourceAction::Update
        ) {
            headers.set("Content-Type", "application/json");
            Some(self.serializer.to_string(&request.properties)?)
        } else {
            None
        };
        let mut http_request = HttpRequest {
            method,
            uri: request.uri.clone(),
            headers,
            body,
        };
        self.authenticator.authenticate(&mut http_request)?;

        let response = self.executor.execute(&http_request, cancel).await?;
        trace!(
            method = %method,
            uri = %request.uri,
            status = response.status,
            "resource request executed"
        );

        if !response.is_success() {
            return Err(self.decode_error(&response));
        }

        if response.has_empty_body() {
            // 202 means the server accepted the work and will echo nothing;
            // deletes are contractually bodiless. Anything else promised a
            // resource representation.
            if response.status == 202 || request.action == ResourceAction::Delete {
                return Ok(ResourceResult {
                    action: request.action,
                    uri: request.uri,
                    status: response.status,
                    properties: Map::new(),
                });
            }
            return Err(Error::Resource {
                status: response.status,
                code: None,
                developer_message: format!(
                    "unable to obtain resource data from the API server: the {} response \
                     contained no resource representation",
                    response.status
                ),
            });
        }

        let properties = self
            .serializer
            .parse(response.body.as_deref().unwrap_or_default())?;
        Ok(ResourceResult {
            action: request.action,
            uri: request.uri,
            status: response.status,
            properties,
        })
    }
}

impl Inner {
    fn decode_error(&self, response: &tessera_http::HttpResponse) -> Error {
        let body = response.body.as_deref().unwrap_or_default();
        let parsed = self.serializer.parse(body).unwrap_or_default();
        let code = parsed.get("code").and_then(Value::as_u64);
        let developer_message = parsed
            .get("developerMessage")
            .or_else(|| parsed.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("the API server returned an error")
            .to_string();
        Error::Resource {
            status: response.status,
            code,
            developer_message,
        }
    }
}

/// The resource data store. Cheap to clone; clones share the identity
/// map, executor, and filter chain.
#[derive(Clone)]
pub struct DataStore {
    inner: Arc<Inner>,
}

impl DataStore {
    /// Start building a data store.
    #[must_use]
    pub fn builder(config: DataStoreConfig) -> DataStoreBuilder {
        DataStoreBuilder {
            config,
            transport: None,
            serializer: None,
            authenticator: None,
            converters: None,
            filters: FilterChain::new(),
        }
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    pub(crate) fn page_size_ceiling(&self) -> u32 {
        self.inner.page_size_ceiling
    }

    fn resolve(&self, href: &str) -> Result<CanonicalUri> {
        CanonicalUri::resolve(&self.inner.base, href)
    }

    async fn run(
        &self,
        request: ResourceRequest,
        cancel: &CancellationToken,
    ) -> Result<ResourceResult> {
        self.inner
            .chain
            .execute(request, &*self.inner, cancel)
            .await
    }

    // ── Materialization ───────────────────────────────────────────────

    /// Fetch and materialize the resource at `href`.
    pub async fn get_resource<T: Resource>(
        &self,
        href: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.get_resource_with_options(href, &ResourceOptions::new(), cancel)
            .await
    }

    /// Fetch and materialize with expansion options.
    pub async fn get_resource_with_options<T: Resource>(
        &self,
        href: &str,
        options: &ResourceOptions,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let mut uri = self.resolve(href)?;
        uri.query_mut().merge(&options.to_query(T::KIND)?);
        trace!(kind = %T::KIND, uri = %uri, "materializing resource");
        let request = ResourceRequest::new(ResourceAction::Read, uri, T::KIND);
        let result = self.run(request, cancel).await?;
        let record = self.hydrate(T::KIND, &result.properties);
        Ok(T::from_parts(self.clone(), record))
    }

    /// Create an empty, unlinked resource with no href.
    #[must_use]
    pub fn instantiate<T: Resource>(&self) -> T {
        T::from_parts(self.clone(), crate::data::shared(ResourceData::new()))
    }

    /// Create an unlinked resource referencing an existing href without
    /// fetching it.
    pub fn instantiate_with_href<T: Resource>(&self, href: &str) -> Result<T> {
        let uri = self.resolve(href)?;
        Ok(T::from_parts(
            self.clone(),
            crate::data::shared(ResourceData::with_href(uri.href())),
        ))
    }

    // ── Persistence ───────────────────────────────────────────────────

    /// Persist a new resource under a parent collection href. On success
    /// the resource's record gains the server-assigned href, is linked
    /// into the identity map, and its change tracking resets.
    pub async fn create<T: Resource>(
        &self,
        parent_href: &str,
        resource: &T,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.create_with_options(parent_href, resource, &ResourceOptions::new(), cancel)
            .await
    }

    /// Persist a new resource, expanding links in the echoed response.
    pub async fn create_with_options<T: Resource>(
        &self,
        parent_href: &str,
        resource: &T,
        options: &ResourceOptions,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let mut uri = self.resolve(parent_href)?;
        uri.query_mut().merge(&options.to_query(T::KIND)?);
        let diff = {
            let data = resource.data().read().expect("resource data lock poisoned");
            properties_to_wire(&data.updated_properties())
        };
        debug!(kind = %T::KIND, uri = %uri, properties = diff.len(), "creating resource");
        let request =
            ResourceRequest::new(ResourceAction::Create, uri, T::KIND).with_properties(diff);
        let result = self.run(request, cancel).await?;

        let materialized = self
            .inner
            .converters
            .materialize(&result.properties, T::KIND);
        {
            let mut data = resource.data().write().expect("resource data lock poisoned");
            data.clear_pending();
            data.refresh(materialized);
        }
        let record = Arc::clone(resource.data());
        let href = record
            .read()
            .expect("resource data lock poisoned")
            .href()
            .map(str::to_string);
        let record = match href {
            Some(href) => {
                // Register the record so later materializations of this href link.
                let canonical = self.link_record(&href, &record);
                debug!(kind = %T::KIND, href = %href, "resource created");
                canonical
            }
            None => {
                // 202 with an empty body: accepted, nothing echoed.
                debug!(kind = %T::KIND, status = result.status, "resource creation accepted");
                record
            }
        };
        Ok(T::from_parts(self.clone(), record))
    }

    /// Persist staged changes: the dirty-property diff plus the
    /// custom-data protocol (pending deletes first, additions inline).
    pub async fn save<T: Resource>(&self, resource: &T, cancel: &CancellationToken) -> Result<()> {
        self.save_with_options(resource, &ResourceOptions::new(), cancel)
            .await
    }

    /// Save with options. Expansion selectors are not supported on save
    /// and fail with an unsupported-operation error.
    pub async fn save_with_options<T: Resource>(
        &self,
        resource: &T,
        options: &ResourceOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if !options.is_empty() {
            return Err(Error::unsupported(
                "expansion options are not supported on save operations",
            ));
        }
        let href = resource.href().ok_or_else(|| {
            Error::unsupported("cannot save a resource that has not been created")
        })?;

        let (mut diff, own_deletes) = {
            let data = resource.data().read().expect("resource data lock poisoned");
            (
                properties_to_wire(&data.updated_properties()),
                data.pending_deletes(),
            )
        };

        // Custom-data protocol: removals go out as DELETE sub-requests
        // scoped to individual keys, additions ride in the diff. When the
        // saved resource IS the custom data, its own staged removals
        // flush against its own href; otherwise the linked customData
        // child record supplies them.
        let custom_data = if T::KIND == ResourceKind::CustomData {
            self.flush_deletes(&href, &own_deletes, cancel).await?;
            None
        } else {
            self.custom_data_record_for(&href)
        };
        if let Some(record) = &custom_data {
            let (cd_href, deletes, additions) = {
                let data = record.read().expect("resource data lock poisoned");
                (
                    data.href().map(str::to_string),
                    data.pending_deletes(),
                    data.updated_properties(),
                )
            };
            if let Some(cd_href) = cd_href {
                self.flush_deletes(&cd_href, &deletes, cancel).await?;
            }
            if !additions.is_empty() {
                diff.insert(
                    "customData".to_string(),
                    Value::Object(properties_to_wire(&additions)),
                );
            }
        }

        if diff.is_empty() {
            // Nothing staged beyond the flushed removals; clear the
            // delete markers and return.
            resource
                .data()
                .write()
                .expect("resource data lock poisoned")
                .clear_pending();
            if let Some(record) = &custom_data {
                record
                    .write()
                    .expect("resource data lock poisoned")
                    .clear_pending();
            }
            return Ok(());
        }

        let uri = self.resolve(&href)?;
        debug!(kind = %T::KIND, uri = %uri, properties = diff.len(), "saving resource");
        let request =
            ResourceRequest::new(ResourceAction::Update, uri, T::KIND).with_properties(diff);
        let result = self.run(request, cancel).await?;

        let materialized = self
            .inner
            .converters
            .materialize(&result.properties, T::KIND);
        {
            let mut data = resource.data().write().expect("resource data lock poisoned");
            data.clear_pending();
            data.refresh(materialized);
        }
        if let Some(record) = &custom_data {
            record
                .write()
                .expect("resource data lock poisoned")
                .clear_pending();
        }
        debug!(kind = %T::KIND, href = %href, "resource saved");
        Ok(())
    }

    /// Delete the remote resource and evict it from the identity map.
    pub async fn delete<T: Resource>(
        &self,
        resource: &T,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let href = resource.href().ok_or_else(|| {
            Error::unsupported("cannot delete a resource that has not been created")
        })?;
        self.delete_href(&href, T::KIND, cancel).await
    }

    /// Delete the resource at `href`.
    pub async fn delete_href(
        &self,
        href: &str,
        kind: ResourceKind,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let uri = self.resolve(href)?;
        debug!(kind = %kind, uri = %uri, "deleting resource");
        let request = ResourceRequest::new(ResourceAction::Delete, uri.clone(), kind);
        self.run(request, cancel).await?;
        self.inner.identity.evict(&uri.identity_key());
        self.inner
            .identity
            .evict(&format!("{}/customData", uri.identity_key()));
        debug!(kind = %kind, uri = %uri, "resource deleted");
        Ok(())
    }

    // ── Blocking twins ────────────────────────────────────────────────

    /// Blocking counterpart of [`DataStore::get_resource`].
    pub fn get_resource_blocking<T: Resource>(&self, href: &str) -> Result<T> {
        crate::blocking::block_on(self.get_resource(href, &CancellationToken::new()))
    }

    /// Blocking counterpart of [`DataStore::create`].
    pub fn create_blocking<T: Resource>(&self, parent_href: &str, resource: &T) -> Result<T> {
        crate::blocking::block_on(self.create(parent_href, resource, &CancellationToken::new()))
    }

    /// Blocking counterpart of [`DataStore::save`].
    pub fn save_blocking<T: Resource>(&self, resource: &T) -> Result<()> {
        crate::blocking::block_on(self.save(resource, &CancellationToken::new()))
    }

    /// Blocking counterpart of [`DataStore::delete`].
    pub fn delete_blocking<T: Resource>(&self, resource: &T) -> Result<()> {
        crate::blocking::block_on(self.delete(resource, &CancellationToken::new()))
    }

    // ── Internals ─────────────────────────────────────────────────────

    /// Materialize raw response properties into an identity-linked record.
    pub(crate) fn hydrate(
        &self,
        kind: ResourceKind,
        raw: &Map<String, Value>,
    ) -> SharedResourceData {
        let materialized = self.inner.converters.materialize(raw, kind);
        let href = materialized
            .get("href")
            .and_then(PropertyValue::as_str)
            .map(str::to_string);
        match href {
            Some(href) => {
                let key = self.identity_key_for(&href);
                let seed = materialized.clone();
                let record = self
                    .inner
                    .identity
                    .get_or_add(&key, move || ResourceData::from_properties(seed));
                record
                    .write()
                    .expect("resource data lock poisoned")
                    .refresh(materialized);
                record
            }
            None => crate::data::shared(ResourceData::from_properties(materialized)),
        }
    }

    /// Fetch one collection page at `uri` (query string included).
    pub(crate) async fn fetch_page(
        &self,
        uri: CanonicalUri,
        kind: ResourceKind,
        cancel: &CancellationToken,
    ) -> Result<CollectionPage> {
        trace!(kind = %kind, uri = %uri, "fetching collection page");
        let request = ResourceRequest::new(ResourceAction::Read, uri, kind);
        let result = self.run(request, cancel).await?;
        CollectionPage::from_properties(&result.properties)
    }

    /// The custom-data record for a parent resource href, linked through
    /// the identity map so aliased facades share staged changes.
    pub(crate) fn custom_data_record(&self, parent_href: &str) -> SharedResourceData {
        let cd_href = format!("{}/customData", parent_href.trim_end_matches('/'));
        let key = self.identity_key_for(&cd_href);
        self.inner
            .identity
            .get_or_add(&key, || ResourceData::with_href(cd_href.clone()))
    }

    fn custom_data_record_for(&self, parent_href: &str) -> Option<SharedResourceData> {
        let cd_href = format!("{}/customData", parent_href.trim_end_matches('/'));
        self.inner.identity.get(&self.identity_key_for(&cd_href))
    }

    fn identity_key_for(&self, href: &str) -> String {
        CanonicalUri::from_absolute(href)
            .map(|uri| uri.identity_key())
            .unwrap_or_else(|_| href.trim_end_matches('/').to_lowercase())
    }

    fn link_record(&self, href: &str, record: &SharedResourceData) -> SharedResourceData {
        let key = self.identity_key_for(href);
        let canonical = self.inner.identity.link(&key, Arc::clone(record));
        if !Arc::ptr_eq(&canonical, record) {
            // A record for this href already existed; mirror the fresh
            // state into the mapped record and hand that one back.
            let snapshot = {
                let data = record.read().expect("resource data lock poisoned");
                data.property_names()
                    .filter_map(|name| data.get(name).map(|v| (name.to_string(), v.clone())))
                    .collect::<HashMap<_, _>>()
            };
            canonical
                .write()
                .expect("resource data lock poisoned")
                .refresh(snapshot);
        }
        canonical
    }

    async fn flush_deletes(
        &self,
        custom_data_href: &str,
        keys: &[String],
        cancel: &CancellationToken,
    ) -> Result<()> {
        for key in keys {
            let target = format!("{}/{}", custom_data_href.trim_end_matches('/'), key);
            let uri = self.resolve(&target)?;
            debug!(uri = %uri, "deleting custom data key");
            let request = ResourceRequest::new(ResourceAction::Delete, uri, ResourceKind::CustomData);
            self.run(request, cancel).await?;
        }
        Ok(())
    }
}

/// Render a materialized property map into its wire JSON form.
fn properties_to_wire(properties: &HashMap<String, PropertyValue>) -> Map<String, Value> {
    properties
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect()
}

/// Builder for [`DataStore`].
pub struct DataStoreBuilder {
    config: DataStoreConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    serializer: Option<Arc<dyn Serializer>>,
    authenticator: Option<Arc<dyn RequestAuthenticator>>,
    converters: Option<ConverterChain>,
    filters: FilterChain,
}

impl DataStoreBuilder {
    /// Inject a transport (defaults to [`ReqwestTransport`]).
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Inject a serializer (defaults to [`JsonSerializer`]).
    #[must_use]
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Inject a request authenticator (defaults to no authentication).
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn RequestAuthenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Replace the field-converter chain.
    #[must_use]
    pub fn with_converters(mut self, converters: ConverterChain) -> Self {
        self.converters = Some(converters);
        self
    }

    /// Append an interceptor to the filter chain.
    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn DataFilter>) -> Self {
        self.filters = self.filters.with_filter(filter);
        self
    }

    /// Validate and build the data store.
    pub fn build(self) -> Result<DataStore> {
        self.config.validate()?;
        let base = Url::parse(&self.config.base_url).map_err(|e| Error::InvalidConfig {
            message: format!("base_url is not a valid URL: {e}"),
        })?;
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(Duration::from_secs(
                self.config.request_timeout_secs,
            ))?),
        };
        let executor = RequestExecutor::new(transport, &self.config.executor);
        let provider: Box<dyn CacheProvider<SharedResourceData>> = if self.config.cache_enabled {
            Box::new(InMemoryCache::new(&self.config.cache))
        } else {
            Box::new(NullCache::new())
        };
        Ok(DataStore {
            inner: Arc::new(Inner {
                base,
                executor,
                serializer: self.serializer.unwrap_or_else(|| Arc::new(JsonSerializer)),
                converters: self.converters.unwrap_or_else(ConverterChain::default_chain),
                identity: IdentityMap::new(provider),
                chain: self.filters,
                authenticator: self
                    .authenticator
                    .unwrap_or_else(|| Arc::new(NoopAuthenticator)),
                page_size_ceiling: self.config.page_size_ceiling,
            }),
        })
    }
}
