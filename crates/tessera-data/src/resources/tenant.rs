//! Tenant resource

use tessera_core::Result;

use crate::collection::CollectionQuery;
use crate::data::SharedResourceData;
use crate::kind::ResourceKind;
use crate::store::DataStore;

use super::{
    collection_link, custom_data_of, debug_facade, Account, Application, CustomData, Directory,
    Group, Organization, Resource,
};

/// The top-level tenant owning every other resource.
pub struct Tenant {
    store: DataStore,
    data: SharedResourceData,
}

impl Resource for Tenant {
    const KIND: ResourceKind = ResourceKind::Tenant;

    fn from_parts(store: DataStore, data: SharedResourceData) -> Self {
        Self { store, data }
    }

    fn data(&self) -> &SharedResourceData {
        &self.data
    }

    fn store(&self) -> &DataStore {
        &self.store
    }
}

impl std::fmt::Debug for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        debug_facade(f, Self::KIND, &self.data)
    }
}

impl Tenant {
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.get_string("name")
    }

    /// Globally unique tenant key.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        self.get_string("key")
    }

    pub fn custom_data(&self) -> Result<CustomData> {
        custom_data_of(self)
    }

    pub fn accounts(&self) -> Result<CollectionQuery<Account>> {
        collection_link(self, "accounts")
    }

    pub fn applications(&self) -> Result<CollectionQuery<Application>> {
        collection_link(self, "applications")
    }

    pub fn directories(&self) -> Result<CollectionQuery<Directory>> {
        collection_link(self, "directories")
    }

    pub fn groups(&self) -> Result<CollectionQuery<Group>> {
        collection_link(self, "groups")
    }

    pub fn organizations(&self) -> Result<CollectionQuery<Organization>> {
        collection_link(self, "organizations")
    }
}
