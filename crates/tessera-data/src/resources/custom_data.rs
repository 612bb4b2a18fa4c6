//! Custom data sub-resource

use tokio_util::sync::CancellationToken;

use tessera_core::{PropertyValue, Result};

use crate::data::SharedResourceData;
use crate::kind::ResourceKind;
use crate::store::DataStore;

use super::{debug_facade, Resource};

/// Schema-less key/value storage attached to a resource.
///
/// Values are restricted to the primitive family (bool, integer, float,
/// string); reserved names and structured values are rejected before
/// anything is staged. `put` and `remove` stage changes locally;
/// [`CustomData::save`] (or a save of the parent resource) sends the
/// staged additions as a diff and each staged removal as a DELETE scoped
/// to `{href}/{key}`. A key removed and then re-put before saving emits
/// only the update.
pub struct CustomData {
    store: DataStore,
    data: SharedResourceData,
}

impl Resource for CustomData {
    const KIND: ResourceKind = ResourceKind::CustomData;

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

impl std::fmt::Debug for CustomData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        debug_facade(f, Self::KIND, &self.data)
    }
}

impl CustomData {
    /// Read a custom-data value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        self.get_property(name)
    }

    /// Stage a value. Cancels any pending removal of the same key.
    ///
    /// Fails with a value-out-of-range error for reserved names and
    /// non-primitive values; nothing is staged in that case.
    pub fn put(&self, name: &str, value: impl Into<PropertyValue>) -> Result<()> {
        let value = value.into();
        PropertyValue::validate_custom_data_entry(name, &value)?;
        self.data
            .write()
            .expect("resource data lock poisoned")
            .set(name, value);
        Ok(())
    }

    /// Stage the removal of a key, returning its current value.
    pub fn remove(&self, name: &str) -> Option<PropertyValue> {
        self.data
            .write()
            .expect("resource data lock poisoned")
            .remove(name)
    }

    /// Whether a key is currently present (staged or persisted).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.data
            .read()
            .expect("resource data lock poisoned")
            .contains(name)
    }

    /// Currently visible keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let data = self.data.read().expect("resource data lock poisoned");
        let mut keys: Vec<String> = data.property_names().map(str::to_string).collect();
        keys.sort();
        keys
    }

    /// Persist staged additions and removals.
    pub async fn save(&self, cancel: &CancellationToken) -> Result<()> {
        self.store.save(self, cancel).await
    }

    /// Blocking counterpart of [`CustomData::save`].
    pub fn save_blocking(&self) -> Result<()> {
        self.store.save_blocking(self)
    }
}
