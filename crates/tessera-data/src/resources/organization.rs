//! Organization resource

use tokio_util::sync::CancellationToken;

use tessera_core::Result;

use crate::collection::CollectionQuery;
use crate::data::SharedResourceData;
use crate::kind::{ResourceKind, ResourceStatus};
use crate::store::DataStore;

use super::{
    collection_link, custom_data_of, debug_facade, Account, CustomData, Group, Resource,
};

/// An organization grouping account stores under one name key.
pub struct Organization {
    store: DataStore,
    data: SharedResourceData,
}

impl Resource for Organization {
    const KIND: ResourceKind = ResourceKind::Organization;

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

impl std::fmt::Debug for Organization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        debug_facade(f, Self::KIND, &self.data)
    }
}

impl Organization {
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.get_string("name")
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.set_property("name", name.into());
    }

    /// URL-friendly unique key.
    #[must_use]
    pub fn name_key(&self) -> Option<String> {
        self.get_string("nameKey")
    }

    pub fn set_name_key(&self, name_key: impl Into<String>) {
        self.set_property("nameKey", name_key.into());
    }

    #[must_use]
    pub fn status(&self) -> Option<ResourceStatus> {
        self.get_string("status")?.parse().ok()
    }

    pub fn set_status(&self, status: ResourceStatus) {
        self.set_property("status", status.as_str());
    }

    pub fn custom_data(&self) -> Result<CustomData> {
        custom_data_of(self)
    }

    pub fn accounts(&self) -> Result<CollectionQuery<Account>> {
        collection_link(self, "accounts")
    }

    pub fn groups(&self) -> Result<CollectionQuery<Group>> {
        collection_link(self, "groups")
    }

    pub async fn save(&self, cancel: &CancellationToken) -> Result<()> {
        self.store.save(self, cancel).await
    }

    pub async fn delete(self, cancel: &CancellationToken) -> Result<()> {
        self.store.delete(&self, cancel).await
    }
}
