//! Account resource

use tokio_util::sync::CancellationToken;

use tessera_core::Result;

use crate::collection::CollectionQuery;
use crate::data::SharedResourceData;
use crate::kind::{AccountStatus, ResourceKind};
use crate::store::DataStore;

use super::{
    collection_link, custom_data_of, debug_facade, follow_link, CustomData, Directory, Group,
    Resource, Tenant,
};

/// A user account within a directory.
pub struct Account {
    store: DataStore,
    data: SharedResourceData,
}

impl Resource for Account {
    const KIND: ResourceKind = ResourceKind::Account;

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

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        debug_facade(f, Self::KIND, &self.data)
    }
}

impl Account {
    /// The login name, unique within the owning directory.
    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.get_string("username")
    }

    pub fn set_username(&self, username: impl Into<String>) {
        self.set_property("username", username.into());
    }

    /// The email address, unique within the owning directory.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.get_string("email")
    }

    pub fn set_email(&self, email: impl Into<String>) {
        self.set_property("email", email.into());
    }

    /// Stage a password change. The server never echoes this back.
    pub fn set_password(&self, password: impl Into<String>) {
        self.set_property("password", password.into());
    }

    #[must_use]
    pub fn given_name(&self) -> Option<String> {
        self.get_string("givenName")
    }

    pub fn set_given_name(&self, given_name: impl Into<String>) {
        self.set_property("givenName", given_name.into());
    }

    #[must_use]
    pub fn middle_name(&self) -> Option<String> {
        self.get_string("middleName")
    }

    pub fn set_middle_name(&self, middle_name: impl Into<String>) {
        self.set_property("middleName", middle_name.into());
    }

    #[must_use]
    pub fn surname(&self) -> Option<String> {
        self.get_string("surname")
    }

    pub fn set_surname(&self, surname: impl Into<String>) {
        self.set_property("surname", surname.into());
    }

    /// Server-computed display name.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        self.get_string("fullName")
    }

    #[must_use]
    pub fn status(&self) -> Option<AccountStatus> {
        self.get_string("status")?.parse().ok()
    }

    pub fn set_status(&self, status: AccountStatus) {
        self.set_property("status", status.as_str());
    }

    /// The account's custom-data sub-resource, shared through the
    /// identity map with every other facade for this account.
    pub fn custom_data(&self) -> Result<CustomData> {
        custom_data_of(self)
    }

    /// Materialize the owning directory.
    pub async fn directory(&self, cancel: &CancellationToken) -> Result<Directory> {
        follow_link(self, "directory", cancel).await
    }

    /// Materialize the owning tenant.
    pub async fn tenant(&self, cancel: &CancellationToken) -> Result<Tenant> {
        follow_link(self, "tenant", cancel).await
    }

    /// Deferred query over the account's groups.
    pub fn groups(&self) -> Result<CollectionQuery<Group>> {
        collection_link(self, "groups")
    }

    /// Persist staged changes.
    pub async fn save(&self, cancel: &CancellationToken) -> Result<()> {
        self.store.save(self, cancel).await
    }

    /// Blocking counterpart of [`Account::save`].
    pub fn save_blocking(&self) -> Result<()> {
        self.store.save_blocking(self)
    }

    /// Delete the account remotely and drop it from the identity map.
    pub async fn delete(self, cancel: &CancellationToken) -> Result<()> {
        self.store.delete(&self, cancel).await
    }

    /// Blocking counterpart of [`Account::delete`].
    pub fn delete_blocking(self) -> Result<()> {
        self.store.delete_blocking(&self)
    }
}
