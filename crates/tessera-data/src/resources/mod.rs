//! Typed resource facades
//!
//! A facade is a thin typed wrapper proxying property access to its
//! shared [`ResourceData`](crate::data::ResourceData) record. Facades for
//! the same href obtained through the same data store alias one record
//! via the identity map: mutating one is immediately visible on the
//! others.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use tessera_core::{Error, Link, PropertyValue, Result};
use tessera_http::CanonicalUri;

use crate::collection::CollectionQuery;
use crate::data::SharedResourceData;
use crate::kind::ResourceKind;
use crate::store::DataStore;

mod account;
mod application;
mod custom_data;
mod directory;
mod group;
mod organization;
mod tenant;

pub use account::Account;
pub use application::Application;
pub use custom_data::CustomData;
pub use directory::Directory;
pub use group::Group;
pub use organization::Organization;
pub use tenant::Tenant;

/// A typed facade over a shared resource-data record.
pub trait Resource: Sized + Send + Sync {
    /// The resource kind this facade maps to. Exactly one facade type
    /// per kind.
    const KIND: ResourceKind;

    /// Build a facade over a record.
    fn from_parts(store: DataStore, data: SharedResourceData) -> Self;

    /// The shared record backing this facade.
    fn data(&self) -> &SharedResourceData;

    /// The data store this facade operates through.
    fn store(&self) -> &DataStore;

    /// The resource href, once known.
    fn href(&self) -> Option<String> {
        self.data()
            .read()
            .expect("resource data lock poisoned")
            .href()
            .map(str::to_string)
    }

    /// Whether this facade wraps a never-persisted record.
    fn is_new(&self) -> bool {
        self.data()
            .read()
            .expect("resource data lock poisoned")
            .is_new()
    }

    /// Read a property.
    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        self.data()
            .read()
            .expect("resource data lock poisoned")
            .get(name)
            .cloned()
    }

    /// Read a string property.
    fn get_string(&self, name: &str) -> Option<String> {
        self.get_property(name)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// Read a timestamp property.
    fn get_timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get_property(name).and_then(|v| v.as_timestamp())
    }

    /// Read a link property.
    fn get_link(&self, name: &str) -> Option<Link> {
        self.get_property(name).and_then(|v| v.as_link().cloned())
    }

    /// Write a property, staging it for the next save. Visible through
    /// every facade aliasing the record.
    fn set_property(&self, name: &str, value: impl Into<PropertyValue>) {
        self.data()
            .write()
            .expect("resource data lock poisoned")
            .set(name, value.into());
    }

    /// Server-maintained creation timestamp.
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.get_timestamp("createdAt")
    }

    /// Server-maintained modification timestamp.
    fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.get_timestamp("modifiedAt")
    }
}

/// Materialize a linked resource by following a link property.
pub(crate) async fn follow_link<P: Resource, T: Resource>(
    parent: &P,
    name: &str,
    cancel: &CancellationToken,
) -> Result<T> {
    let link = parent.get_link(name).ok_or_else(|| {
        Error::unsupported(format!("resource has no materialized '{name}' link"))
    })?;
    parent.store().get_resource(&link.href, cancel).await
}

/// Build a deferred collection query for a collection link, falling back
/// to the conventional `{href}/{name}` path when the link property has
/// not been materialized.
pub(crate) fn collection_link<P: Resource, T: Resource>(
    parent: &P,
    name: &str,
) -> Result<CollectionQuery<T>> {
    let href = match parent.get_link(name) {
        Some(link) => link.href,
        None => {
            let base = parent.href().ok_or_else(|| {
                Error::unsupported(format!(
                    "cannot query '{name}' on a resource that has not been created"
                ))
            })?;
            format!("{}/{name}", base.trim_end_matches('/'))
        }
    };
    let uri = CanonicalUri::resolve(parent.store().base_url(), &href)?;
    Ok(CollectionQuery::new(parent.store().clone(), uri))
}

/// Obtain the identity-linked custom-data facade for a persisted parent.
pub(crate) fn custom_data_of<P: Resource>(parent: &P) -> Result<CustomData> {
    let href = parent.href().ok_or_else(|| {
        Error::unsupported("custom data is available once the resource has been created")
    })?;
    let record = parent.store().custom_data_record(&href);
    Ok(CustomData::from_parts(parent.store().clone(), record))
}

/// Shared `Debug` rendering for facades: kind plus href.
pub(crate) fn debug_facade(
    f: &mut std::fmt::Formatter<'_>,
    kind: ResourceKind,
    data: &SharedResourceData,
) -> std::fmt::Result {
    let data = data.read().expect("resource data lock poisoned");
    f.debug_struct(kind.as_str())
        .field("href", &data.href())
        .finish_non_exhaustive()
}
