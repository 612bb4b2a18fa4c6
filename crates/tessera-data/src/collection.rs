//! Collection queries
//!
//! Deferred, auto-paginating queries over collection resources. Shaping
//! calls mutate the pending query AST without issuing a request; the
//! first enumeration issues a GET carrying exactly the accumulated query
//! string (no pagination defaults are injected), and subsequent pages are
//! fetched transparently by advancing `offset` past the items seen so
//! far. Enumeration continues while pages come back non-empty, so a
//! result set landing exactly on a page boundary costs one trailing
//! empty-page fetch — the price of noticing items appended concurrently
//! on the server.

use futures::stream::Stream;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

use tessera_core::{Error, Result};
use tessera_http::CanonicalUri;

use crate::query::{Criterion, Expansion, QueryAst};
use crate::resources::Resource;
use crate::store::DataStore;

/// One decoded collection response page.
#[derive(Debug, Clone)]
pub struct CollectionPage {
    pub href: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub size: Option<u64>,
    pub items: Vec<Map<String, Value>>,
}

impl CollectionPage {
    /// Decode the collection wire shape
    /// (`{href, offset, limit, size, items: [...]}`).
    pub(crate) fn from_properties(properties: &Map<String, Value>) -> Result<Self> {
        let items = match properties.get("items") {
            Some(Value::Array(raw)) => raw
                .iter()
                .map(|item| {
                    item.as_object().cloned().ok_or_else(|| {
                        Error::Serialization(<serde_json::Error as serde::de::Error>::custom(
                            "collection items must be JSON objects",
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };
        Ok(Self {
            href: properties
                .get("href")
                .and_then(Value::as_str)
                .map(str::to_string),
            offset: properties.get("offset").and_then(Value::as_u64),
            limit: properties.get("limit").and_then(Value::as_u64),
            size: properties.get("size").and_then(Value::as_u64),
            items,
        })
    }
}

/// A deferred query over a collection of `T`.
///
/// Nothing touches the network until enumeration (`stream`, `to_vec`, or
/// a result operator); every shaping call before that point only mutates
/// the pending query.
pub struct CollectionQuery<T> {
    store: DataStore,
    uri: CanonicalUri,
    ast: QueryAst,
    cancel: CancellationToken,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> CollectionQuery<T> {
    pub(crate) fn new(store: DataStore, uri: CanonicalUri) -> Self {
        Self {
            store,
            uri,
            ast: QueryAst::new(),
            cancel: CancellationToken::new(),
            _marker: PhantomData,
        }
    }

    /// Propagate a cancellation token into every fetch this query issues.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Free-text filter (`q`). Last write wins.
    #[must_use]
    pub fn filter(mut self, term: impl Into<String>) -> Self {
        self.ast.set_filter(term);
        self
    }

    /// Add an attribute criterion; criteria AND together.
    pub fn where_matches(mut self, criterion: Criterion) -> Result<Self> {
        self.ast.add_criterion(criterion)?;
        Ok(self)
    }

    /// Ascending order term.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.ast.add_order(field, false);
        self
    }

    /// Descending order term.
    #[must_use]
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.ast.add_order(field, true);
        self
    }

    /// Subsequent ascending order term; reads better after `order_by`.
    #[must_use]
    pub fn then_by(self, field: impl Into<String>) -> Self {
        self.order_by(field)
    }

    /// Subsequent descending order term.
    #[must_use]
    pub fn then_by_desc(self, field: impl Into<String>) -> Self {
        self.order_by_desc(field)
    }

    /// Expand a link on each returned item.
    pub fn expand(mut self, name: impl Into<String>) -> Result<Self> {
        self.ast.add_expansion(Expansion::link(name), T::KIND)?;
        Ok(self)
    }

    /// Expand a collection link with a sub-range on each returned item.
    pub fn expand_collection(
        mut self,
        name: impl Into<String>,
        offset: u32,
        limit: u32,
    ) -> Result<Self> {
        self.ast
            .add_expansion(Expansion::collection(name, offset, limit), T::KIND)?;
        Ok(self)
    }

    /// Cap the total number of items enumerated (`limit`). Last write
    /// wins; values above the server's page ceiling are satisfied with
    /// multiple page fetches.
    #[must_use]
    pub fn take(mut self, count: u32) -> Self {
        self.ast.set_limit(count);
        self
    }

    /// Skip items (`offset`). Last write wins.
    #[must_use]
    pub fn skip(mut self, count: u32) -> Self {
        self.ast.set_offset(count);
        self
    }

    /// The query string the first request would carry. Useful for
    /// diagnostics; does not issue a request.
    #[must_use]
    pub fn to_query_string(&self) -> tessera_http::QueryString {
        self.ast.to_query_string()
    }

    fn into_cursor(self) -> PageCursor<T> {
        let remaining = self.ast.limit().map(u64::from);
        PageCursor {
            store: self.store,
            uri: self.uri,
            ast: self.ast,
            cancel: self.cancel,
            items_seen: 0,
            remaining,
            first: true,
            done: false,
            _marker: PhantomData,
        }
    }

    // ── Enumeration ───────────────────────────────────────────────────

    /// Enumerate lazily, fetching pages as the stream is polled.
    pub fn stream(self) -> impl Stream<Item = Result<T>> {
        let cursor = self.into_cursor();
        futures::stream::try_unfold(
            (cursor, VecDeque::new()),
            |(mut cursor, mut buffer)| async move {
                loop {
                    if let Some(raw) = buffer.pop_front() {
                        let item = cursor.materialize(&raw);
                        return Ok(Some((item, (cursor, buffer))));
                    }
                    match cursor.next_batch().await? {
                        Some(batch) => buffer.extend(batch),
                        None => return Ok(None),
                    }
                }
            },
        )
    }

    /// Enumerate fully into a vector.
    pub async fn to_vec(self) -> Result<Vec<T>> {
        let mut cursor = self.into_cursor();
        let mut items = Vec::new();
        while let Some(batch) = cursor.next_batch().await? {
            items.extend(batch.iter().map(|raw| cursor.materialize(raw)));
        }
        Ok(items)
    }

    /// First item; error when the collection is empty.
    pub async fn first(self) -> Result<T> {
        self.first_or_none().await?.ok_or(Error::NoElements)
    }

    /// First item, or `None` when the collection is empty.
    pub async fn first_or_none(self) -> Result<Option<T>> {
        let mut cursor = self.take(1).into_cursor();
        let batch = cursor.next_batch().await?.unwrap_or_default();
        Ok(batch.first().map(|raw| cursor.materialize(raw)))
    }

    /// The only item; errors on empty and on more than one element.
    pub async fn single(self) -> Result<T> {
        self.single_or_none().await?.ok_or(Error::NoElements)
    }

    /// The only item, `None` on empty; errors on more than one element.
    pub async fn single_or_none(self) -> Result<Option<T>> {
        // limit=2: enough to detect a second element without paging.
        let mut cursor = self.take(2).into_cursor();
        let batch = cursor.next_batch().await?.unwrap_or_default();
        match batch.len() {
            0 => Ok(None),
            1 => Ok(Some(cursor.materialize(&batch[0]))),
            _ => Err(Error::MultipleElements),
        }
    }

    /// Whether the collection has any items.
    pub async fn any(self) -> Result<bool> {
        let mut cursor = self.take(1).into_cursor();
        let batch = cursor.next_batch().await?.unwrap_or_default();
        Ok(!batch.is_empty())
    }

    /// Total size of the collection as reported by the server. No `limit`
    /// parameter is injected.
    pub async fn count(self) -> Result<u64> {
        let mut cursor = self.into_cursor();
        let (size, fetched) = cursor.first_page_size().await?;
        Ok(size.unwrap_or(fetched))
    }

    // ── Blocking twins ────────────────────────────────────────────────

    /// Blocking counterpart of [`CollectionQuery::to_vec`].
    pub fn to_vec_blocking(self) -> Result<Vec<T>> {
        crate::blocking::block_on(self.to_vec())
    }

    /// Blocking counterpart of [`CollectionQuery::first`].
    pub fn first_blocking(self) -> Result<T> {
        crate::blocking::block_on(self.first())
    }

    /// Blocking counterpart of [`CollectionQuery::single`].
    pub fn single_blocking(self) -> Result<T> {
        crate::blocking::block_on(self.single())
    }

    /// Blocking counterpart of [`CollectionQuery::any`].
    pub fn any_blocking(self) -> Result<bool> {
        crate::blocking::block_on(self.any())
    }

    /// Blocking counterpart of [`CollectionQuery::count`].
    pub fn count_blocking(self) -> Result<u64> {
        crate::blocking::block_on(self.count())
    }
}

/// Pagination state shared by the stream and the eager operators.
struct PageCursor<T> {
    store: DataStore,
    uri: CanonicalUri,
    ast: QueryAst,
    cancel: CancellationToken,
    items_seen: u64,
    /// Items still owed to the caller under an explicit `limit`.
    remaining: Option<u64>,
    first: bool,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> PageCursor<T> {
    fn materialize(&self, raw: &Map<String, Value>) -> T {
        let record = self.store.hydrate(T::KIND, raw);
        T::from_parts(self.store.clone(), record)
    }

    /// Fetch the next page of raw items, or `None` when exhausted.
    async fn next_batch(&mut self) -> Result<Option<Vec<Map<String, Value>>>> {
        if self.done {
            return Ok(None);
        }
        let ceiling = u64::from(self.store.page_size_ceiling());
        let mut query = self.ast.to_query_string();
        let mut requested: Option<u64> = None;

        if let Some(remaining) = self.remaining {
            let page = remaining.min(ceiling);
            query.set("limit", page.to_string());
            requested = Some(page);
        }
        if self.first {
            // First call carries exactly what the caller configured.
            self.first = false;
        } else {
            let offset = u64::from(self.ast.offset().unwrap_or(0)) + self.items_seen;
            query.set("offset", offset.to_string());
        }

        let mut uri = self.uri.clone();
        uri.query_mut().merge(&query);
        let page = self.store.fetch_page(uri, T::KIND, &self.cancel).await?;

        let count = page.items.len() as u64;
        self.items_seen += count;
        if let Some(remaining) = &mut self.remaining {
            *remaining = remaining.saturating_sub(count);
            if *remaining == 0 {
                self.done = true;
            }
        }
        if count == 0 {
            self.done = true;
            return Ok(None);
        }
        if let Some(requested) = requested {
            if count < requested {
                // Short page: end of data.
                self.done = true;
            }
        }
        Ok(Some(page.items))
    }

    /// Issue the first page fetch and report the server-stated size.
    async fn first_page_size(&mut self) -> Result<(Option<u64>, u64)> {
        let mut query = self.ast.to_query_string();
        query.remove("limit");
        self.first = false;
        let mut uri = self.uri.clone();
        uri.query_mut().merge(&query);
        let page = self.store.fetch_page(uri, T::KIND, &self.cancel).await?;
        Ok((page.size, page.items.len() as u64))
    }
}
