//! Filter chain
//!
//! An ordered, extensible pipeline of interceptors around the actual HTTP
//! call. Each filter receives the request plus an explicit chain cursor;
//! it either short-circuits by producing a [`ResourceResult`] itself or
//! forwards via [`FilterCursor::proceed`]. When the cursor runs past the
//! last filter it invokes the terminal executor, which performs the
//! serialize -> HTTP call -> deserialize sequence.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use tessera_core::Result;
use tessera_http::CanonicalUri;

use crate::kind::ResourceKind;

/// CRUD action a resource-data request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Create,
    Read,
    Update,
    Delete,
}

/// A resource-data request travelling down the filter chain.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub action: ResourceAction,
    pub uri: CanonicalUri,
    pub kind: ResourceKind,
    /// Wire-shaped body: the dirty-property diff for create/update,
    /// empty otherwise.
    pub properties: Map<String, Value>,
}

impl ResourceRequest {
    /// Create a bodiless request.
    #[must_use]
    pub fn new(action: ResourceAction, uri: CanonicalUri, kind: ResourceKind) -> Self {
        Self {
            action,
            uri,
            kind,
            properties: Map::new(),
        }
    }

    /// Attach a body diff.
    #[must_use]
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }
}

/// The terminal outcome of a chain execution.
#[derive(Debug, Clone)]
pub struct ResourceResult {
    pub action: ResourceAction,
    pub uri: CanonicalUri,
    pub status: u16,
    /// Decoded response body; empty for bodiless responses (202/204).
    pub properties: Map<String, Value>,
}

/// An interceptor in the pipeline.
#[async_trait]
pub trait DataFilter: Send + Sync {
    /// Handle the request: short-circuit by returning a result, or
    /// forward with `next.proceed(request, cancel).await`.
    async fn filter(
        &self,
        request: ResourceRequest,
        next: FilterCursor<'_>,
        cancel: &CancellationToken,
    ) -> Result<ResourceResult>;
}

/// Performs the actual HTTP call at the end of the chain.
#[async_trait]
pub trait TerminalExecutor: Send + Sync {
    async fn execute(
        &self,
        request: ResourceRequest,
        cancel: &CancellationToken,
    ) -> Result<ResourceResult>;
}

/// An ordered filter pipeline. Filters run in the order they were added;
/// the first filter not to forward determines the result.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn DataFilter>>,
}

impl FilterChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy this chain with one more filter appended.
    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn DataFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Number of filters in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run a request through the chain, ending at `terminal`.
    pub async fn execute(
        &self,
        request: ResourceRequest,
        terminal: &dyn TerminalExecutor,
        cancel: &CancellationToken,
    ) -> Result<ResourceResult> {
        let cursor = FilterCursor {
            filters: &self.filters,
            terminal,
            index: 0,
        };
        cursor.proceed(request, cancel).await
    }
}

/// Explicit position in a chain execution, handed to each filter.
pub struct FilterCursor<'a> {
    filters: &'a [Arc<dyn DataFilter>],
    terminal: &'a dyn TerminalExecutor,
    index: usize,
}

impl FilterCursor<'_> {
    /// Invoke the next filter, or the terminal executor past the end.
    pub async fn proceed(
        self,
        request: ResourceRequest,
        cancel: &CancellationToken,
    ) -> Result<ResourceResult> {
        if let Some(filter) = self.filters.get(self.index) {
            let next = FilterCursor {
                filters: self.filters,
                terminal: self.terminal,
                index: self.index + 1,
            };
            filter.filter(request, next, cancel).await
        } else {
            self.terminal.execute(request, cancel).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingTerminal {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TerminalExecutor for RecordingTerminal {
        async fn execute(
            &self,
            request: ResourceRequest,
            _cancel: &CancellationToken,
        ) -> Result<ResourceResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ResourceResult {
                action: request.action,
                uri: request.uri,
                status: 200,
                properties: request.properties,
            })
        }
    }

    /// Tags the body so execution order is observable.
    struct TaggingFilter {
        tag: &'static str,
    }

    #[async_trait]
    impl DataFilter for TaggingFilter {
        async fn filter(
            &self,
            mut request: ResourceRequest,
            next: FilterCursor<'_>,
            cancel: &CancellationToken,
        ) -> Result<ResourceResult> {
            let order = request
                .properties
                .get("order")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            request
                .properties
                .insert("order".to_string(), json!(format!("{order}{}", self.tag)));
            next.proceed(request, cancel).await
        }
    }

    struct ShortCircuitFilter;

    #[async_trait]
    impl DataFilter for ShortCircuitFilter {
        async fn filter(
            &self,
            request: ResourceRequest,
            _next: FilterCursor<'_>,
            _cancel: &CancellationToken,
        ) -> Result<ResourceResult> {
            Ok(ResourceResult {
                action: request.action,
                uri: request.uri,
                status: 299,
                properties: Map::new(),
            })
        }
    }

    fn request() -> ResourceRequest {
        ResourceRequest::new(
            ResourceAction::Read,
            CanonicalUri::from_absolute("https://api.example.com/v1/accounts/a1").unwrap(),
            ResourceKind::Account,
        )
    }

    #[tokio::test]
    async fn test_filters_run_in_order_then_terminal() {
        let chain = FilterChain::new()
            .with_filter(Arc::new(TaggingFilter { tag: "a" }))
            .with_filter(Arc::new(TaggingFilter { tag: "b" }))
            .with_filter(Arc::new(TaggingFilter { tag: "c" }));
        let terminal = RecordingTerminal {
            calls: AtomicUsize::new(0),
        };
        let result = chain
            .execute(request(), &terminal, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.properties["order"], json!("abc"));
        assert_eq!(terminal.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_rest_of_chain() {
        let chain = FilterChain::new()
            .with_filter(Arc::new(TaggingFilter { tag: "a" }))
            .with_filter(Arc::new(ShortCircuitFilter))
            .with_filter(Arc::new(TaggingFilter { tag: "never" }));
        let terminal = RecordingTerminal {
            calls: AtomicUsize::new(0),
        };
        let result = chain
            .execute(request(), &terminal, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.status, 299);
        assert_eq!(terminal.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_copy_extension_preserves_order() {
        let base = FilterChain::new().with_filter(Arc::new(TaggingFilter { tag: "a" }));
        let extended = base.clone().with_filter(Arc::new(TaggingFilter { tag: "b" }));
        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);

        let terminal = RecordingTerminal {
            calls: AtomicUsize::new(0),
        };
        let result = extended
            .execute(request(), &terminal, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.properties["order"], json!("ab"));
    }
}
