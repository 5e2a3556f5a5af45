//! Integration tests for Threadline.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory tests
//! cargo test -p threadline-integration-tests
//!
//! # Include the PostgreSQL-backed tests
//! STOREFRONT_DATABASE_URL=postgres://... cargo test -p threadline-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `reconcile` - Guest-to-account reconciliation against the in-memory stores
//! - `catalog_import` - Catalog administration against the in-memory store
//! - `pg_documents` - The `PostgreSQL` document store (requires a database)
//!
//! This crate also provides the fixtures those tests share.

use serde_json::Value;

use threadline_core::{DesignId, DocumentPath, Fields, GUEST_BAG_KEY, GUEST_WISHLIST_KEY};
use threadline_storefront::store::{DocumentStore, MemoryDocumentStore, MemoryGuestStore};

/// Convert a JSON object literal into document fields.
///
/// # Panics
///
/// Panics if `value` is not an object.
#[must_use]
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Store a catalog design at `designs/{id}`.
///
/// # Panics
///
/// Panics if the ID is invalid or the write fails.
pub async fn seed_design(store: &MemoryDocumentStore, id: &str, body: Value) {
    let path = DocumentPath::design(&DesignId::new(id)).expect("valid design id");
    store
        .set_document(&path, fields(body))
        .await
        .expect("seed design");
}

/// Guest state with the given raw values under the bag and wishlist keys.
#[must_use]
pub fn guest_with(bag: Option<&str>, wishlist: Option<&str>) -> MemoryGuestStore {
    let entries = [(GUEST_BAG_KEY, bag), (GUEST_WISHLIST_KEY, wishlist)]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)));
    MemoryGuestStore::with_entries(entries)
}
