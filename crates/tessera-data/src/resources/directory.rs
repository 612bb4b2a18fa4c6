//! Directory resource

use tokio_util::sync::CancellationToken;

use tessera_core::Result;

use crate::collection::CollectionQuery;
use crate::data::SharedResourceData;
use crate::kind::{ResourceKind, ResourceStatus};
use crate::store::DataStore;

use super::{
    collection_link, custom_data_of, debug_facade, follow_link, Account, CustomData, Group,
    Resource, Tenant,
};

/// A directory of accounts and groups.
pub struct Directory {
    store: DataStore,
    data: SharedResourceData,
}

impl Resource for Directory {
    const KIND: ResourceKind = ResourceKind::Directory;

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

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        debug_facade(f, Self::KIND, &self.data)
    }
}

impl Directory {
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.get_string("name")
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.set_property("name", name.into());
    }

    #[must_use]
    pub fn description(&self) -> Option<String> {
        self.get_string("description")
    }

    pub fn set_description(&self, description: impl Into<String>) {
        self.set_property("description", description.into());
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

    pub async fn tenant(&self, cancel: &CancellationToken) -> Result<Tenant> {
        follow_link(self, "tenant", cancel).await
    }

    /// Deferred query over the directory's accounts.
    pub fn accounts(&self) -> Result<CollectionQuery<Account>> {
        collection_link(self, "accounts")
    }

    /// Deferred query over the directory's groups.
    pub fn groups(&self) -> Result<CollectionQuery<Group>> {
        collection_link(self, "groups")
    }

    /// Create a new account in this directory.
    pub async fn create_account(
        &self,
        account: &Account,
        cancel: &CancellationToken,
    ) -> Result<Account> {
        let href = self.collection_href("accounts")?;
        self.store.create(&href, account, cancel).await
    }

    /// Create a new group in this directory.
    pub async fn create_group(&self, group: &Group, cancel: &CancellationToken) -> Result<Group> {
        let href = self.collection_href("groups")?;
        self.store.create(&href, group, cancel).await
    }

    fn collection_href(&self, name: &str) -> Result<String> {
        match self.get_link(name) {
            Some(link) => Ok(link.href),
            None => {
                let base = self.href().ok_or_else(|| {
                    tessera_core::Error::unsupported(
                        "cannot create into a directory that has not been created",
                    )
                })?;
                Ok(format!("{}/{name}", base.trim_end_matches('/')))
            }
        }
    }

    pub async fn save(&self, cancel: &CancellationToken) -> Result<()> {
        self.store.save(self, cancel).await
    }

    pub async fn delete(self, cancel: &CancellationToken) -> Result<()> {
        self.store.delete(&self, cancel).await
    }
}
