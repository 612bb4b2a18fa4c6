//! Resource data records
//!
//! [`ResourceData`] is the mutable, change-tracked property bag underlying
//! every typed resource facade. One logical remote resource maps to one
//! record; facades hold a [`SharedResourceData`] handle into the identity
//! map's arena rather than owning state, so aliasing is explicit.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tessera_core::PropertyValue;

/// Shared handle to a resource-data record.
///
/// Facades produced for the same href alias the same record; mutations
/// through one facade are visible on every other.
pub type SharedResourceData = Arc<RwLock<ResourceData>>;

/// The canonical mutable state of one remote resource instance.
#[derive(Debug, Default)]
pub struct ResourceData {
    href: Option<String>,
    properties: HashMap<String, PropertyValue>,
    dirty: HashSet<String>,
    pending_deletes: HashSet<String>,
    is_new: bool,
}

impl ResourceData {
    /// Create an empty record for a not-yet-persisted resource.
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_new: true,
            ..Self::default()
        }
    }

    /// Create an empty record carrying an href (a reference to a known
    /// remote resource whose state has not been fetched).
    #[must_use]
    pub fn with_href(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::default()
        }
    }

    /// Create a record hydrated from materialized properties. The `href`
    /// property, when present, becomes the record's href.
    #[must_use]
    pub fn from_properties(properties: HashMap<String, PropertyValue>) -> Self {
        let href = properties
            .get("href")
            .and_then(PropertyValue::as_str)
            .map(str::to_string);
        Self {
            href,
            properties,
            dirty: HashSet::new(),
            pending_deletes: HashSet::new(),
            is_new: false,
        }
    }

    /// The record's href, if persisted or instantiated with one.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Set the href (assigned by the server on create).
    pub fn set_href(&mut self, href: impl Into<String>) {
        let href = href.into();
        self.properties
            .insert("href".to_string(), PropertyValue::from(href.clone()));
        self.href = Some(href);
    }

    /// Whether this record has never been persisted.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Get a property value. Names are case-sensitive.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Whether a property is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Set a property, recording it as dirty. A set cancels any pending
    /// delete of the same key (update wins).
    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        self.pending_deletes.remove(&name);
        self.dirty.insert(name.clone());
        self.properties.insert(name, value);
    }

    /// Set a property without marking it dirty (server-sourced hydration).
    pub fn set_clean(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.properties.insert(name.into(), value);
    }

    /// Remove a property, staging a pending delete and cancelling any
    /// local update of the same key. Returns the removed value.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.dirty.remove(name);
        self.pending_deletes.insert(name.to_string());
        self.properties.remove(name)
    }

    /// Property names in no particular order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Exactly the properties set since the last save: the diff payload.
    #[must_use]
    pub fn updated_properties(&self) -> HashMap<String, PropertyValue> {
        self.dirty
            .iter()
            .filter_map(|name| {
                self.properties
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    /// Whether any local changes are staged.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.dirty.is_empty() || !self.pending_deletes.is_empty()
    }

    /// Keys staged for deletion.
    #[must_use]
    pub fn pending_deletes(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.pending_deletes.iter().cloned().collect();
        keys.sort();
        keys
    }

    /// Clear the dirty and pending-delete sets after a successful save.
    /// Every facade aliasing this record observes the cleared state.
    pub fn clear_pending(&mut self) {
        self.dirty.clear();
        self.pending_deletes.clear();
        self.is_new = false;
    }

    /// Refresh from server-sourced properties. Locally dirty keys keep
    /// their staged values; everything else is overwritten.
    pub fn refresh(&mut self, fresh: HashMap<String, PropertyValue>) {
        for (name, value) in fresh {
            if !self.dirty.contains(&name) {
                if name == "href" {
                    if let Some(href) = value.as_str() {
                        self.href = Some(href.to_string());
                    }
                }
                self.properties.insert(name, value);
            }
        }
        self.is_new = false;
    }
}

/// Wrap a record in a shared handle.
#[must_use]
pub fn shared(data: ResourceData) -> SharedResourceData {
    Arc::new(RwLock::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_new_and_empty() {
        let data = ResourceData::new();
        assert!(data.is_new());
        assert!(data.href().is_none());
        assert!(!data.has_pending_changes());
    }

    #[test]
    fn test_set_marks_dirty() {
        let mut data = ResourceData::new();
        data.set("email", PropertyValue::from("tk421@empire.gov"));
        let diff = data.updated_properties();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff["email"].as_str(), Some("tk421@empire.gov"));
    }

    #[test]
    fn test_diff_contains_exactly_changed_keys() {
        let mut data = ResourceData::from_properties(
            [
                ("href".to_string(), PropertyValue::from("https://api.example.com/accounts/a1")),
                ("email".to_string(), PropertyValue::from("old@example.com")),
                ("givenName".to_string(), PropertyValue::from("Old")),
                ("surname".to_string(), PropertyValue::from("Name")),
            ]
            .into_iter()
            .collect(),
        );
        data.set("email", PropertyValue::from("new@example.com"));
        data.set("givenName", PropertyValue::from("New"));
        let diff = data.updated_properties();
        let mut keys: Vec<&str> = diff.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["email", "givenName"]);
    }

    #[test]
    fn test_remove_stages_delete_and_cancels_update() {
        let mut data = ResourceData::from_properties(
            [("color".to_string(), PropertyValue::from("red"))]
                .into_iter()
                .collect(),
        );
        data.set("color", PropertyValue::from("blue"));
        data.remove("color");
        assert!(data.updated_properties().is_empty());
        assert_eq!(data.pending_deletes(), vec!["color".to_string()]);
        assert!(data.get("color").is_none());
    }

    #[test]
    fn test_set_cancels_pending_delete() {
        let mut data = ResourceData::from_properties(
            [("color".to_string(), PropertyValue::from("red"))]
                .into_iter()
                .collect(),
        );
        data.remove("color");
        data.set("color", PropertyValue::from("green"));
        assert!(data.pending_deletes().is_empty());
        assert_eq!(
            data.updated_properties()["color"].as_str(),
            Some("green")
        );
    }

    #[test]
    fn test_clear_pending_after_save() {
        let mut data = ResourceData::new();
        data.set("name", PropertyValue::from("x"));
        data.remove("other");
        data.clear_pending();
        assert!(!data.has_pending_changes());
        assert!(!data.is_new());
    }

    #[test]
    fn test_refresh_preserves_dirty_values() {
        let mut data = ResourceData::from_properties(
            [("email".to_string(), PropertyValue::from("a@example.com"))]
                .into_iter()
                .collect(),
        );
        data.set("email", PropertyValue::from("local@example.com"));
        data.refresh(
            [
                ("email".to_string(), PropertyValue::from("server@example.com")),
                ("surname".to_string(), PropertyValue::from("Server")),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(data.get("email").unwrap().as_str(), Some("local@example.com"));
        assert_eq!(data.get("surname").unwrap().as_str(), Some("Server"));
    }

    #[test]
    fn test_property_names_case_sensitive() {
        let mut data = ResourceData::new();
        data.set("givenName", PropertyValue::from("Luke"));
        assert!(data.get("givenname").is_none());
        assert!(data.get("givenName").is_some());
    }

    #[test]
    fn test_shared_handle_aliases() {
        let handle = shared(ResourceData::new());
        let alias = Arc::clone(&handle);
        handle
            .write()
            .unwrap()
            .set("email", PropertyValue::from("x@example.com"));
        assert_eq!(
            alias.read().unwrap().get("email").unwrap().as_str(),
            Some("x@example.com")
        );
    }
}
