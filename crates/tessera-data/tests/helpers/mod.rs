//! Shared helpers for data-store integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::MockServer;

use tessera_data::{DataStore, DataStoreConfig};

/// Build a data store pointed at a wiremock server.
pub fn data_store(server: &MockServer) -> DataStore {
    DataStore::builder(DataStoreConfig::new(server.uri()))
        .build()
        .expect("data store config is valid")
}

/// Build a data store with the identity map disabled.
pub fn uncached_data_store(server: &MockServer) -> DataStore {
    let mut config = DataStoreConfig::new(server.uri());
    config.cache_enabled = false;
    DataStore::builder(config).build().expect("config is valid")
}

/// A realistic account representation.
pub fn account_json(base: &str, id: &str) -> Value {
    json!({
        "href": format!("{base}/accounts/{id}"),
        "username": id,
        "email": format!("{id}@kessel.test"),
        "givenName": "Test",
        "surname": "Account",
        "status": "ENABLED",
        "createdAt": "2015-01-01T00:00:00.000Z",
        "modifiedAt": "2015-01-01T00:00:00.000Z",
        "directory": { "href": format!("{base}/directories/d1") },
        "tenant": { "href": format!("{base}/tenants/t1") },
        "groups": { "href": format!("{base}/accounts/{id}/groups") },
        "customData": { "href": format!("{base}/accounts/{id}/customData") },
    })
}

/// A collection page of sequentially numbered accounts.
pub fn accounts_page(base: &str, start: usize, count: usize, total: usize) -> Value {
    let items: Vec<Value> = (start..start + count)
        .map(|i| account_json(base, &format!("acct{i}")))
        .collect();
    json!({
        "href": format!("{base}/directories/d1/accounts"),
        "offset": start,
        "limit": 25,
        "size": total,
        "items": items,
    })
}
