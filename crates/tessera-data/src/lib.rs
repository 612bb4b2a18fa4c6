//! # Tessera Data
//!
//! The resource data pipeline behind the Tessera SDK.
//!
//! This crate maps HTTP JSON payloads to typed, mutable, change-tracked
//! resources; keeps multiple materializations of one remote resource
//! reference-linked through an identity map; compiles fluent query
//! builders into REST query strings with transparent pagination; and
//! pushes every operation through an interceptor chain ending in the
//! retrying request executor.
//!
//! ## Architecture
//!
//! - [`data`] - change-tracked [`ResourceData`](data::ResourceData) records
//! - [`identity`] - one shared record per canonical href
//! - [`convert`] - field-converter chain (links, statuses, timestamps)
//! - [`filter`] - interceptor pipeline around the HTTP call
//! - [`store`] - the [`DataStore`] façade: materialize, create, save, delete
//! - [`query`] / [`collection`] - deferred, auto-paginating collection queries
//! - [`resources`] - typed facades (Account, Directory, Group, ...)
//! - [`client`] - the SDK entry point
//!
//! ## Example
//!
//! ```ignore
//! use tessera_data::{Client, Field};
//! use tessera_http::ApiKeyCredentials;
//!
//! let client = Client::builder("https://api.example.com/v1/")
//!     .with_api_key(ApiKeyCredentials::new(id, secret))
//!     .build()?;
//!
//! let tenant = client.current_tenant(&cancel).await?;
//! let admins = tenant
//!     .accounts()?
//!     .where_matches(Field::named("email").starts_with("admin"))?
//!     .order_by("email")
//!     .to_vec()
//!     .await?;
//! ```

mod blocking;

pub mod client;
pub mod collection;
pub mod convert;
pub mod data;
pub mod filter;
pub mod identity;
pub mod kind;
pub mod query;
pub mod resources;
pub mod serializer;
pub mod store;

// Re-exports
pub use client::{Client, ClientBuilder};
pub use collection::CollectionQuery;
pub use convert::{ConverterChain, FieldConverter};
pub use data::{ResourceData, SharedResourceData};
pub use filter::{DataFilter, FilterChain, FilterCursor, ResourceAction, ResourceRequest, ResourceResult};
pub use identity::IdentityMap;
pub use kind::{AccountStatus, LinkShape, ResourceKind, ResourceStatus};
pub use query::{Criterion, Expansion, Field, QueryAst};
pub use resources::{
    Account, Application, CustomData, Directory, Group, Organization, Resource, Tenant,
};
pub use serializer::{JsonSerializer, Serializer};
pub use store::{DataStore, DataStoreBuilder, DataStoreConfig, ResourceOptions};
