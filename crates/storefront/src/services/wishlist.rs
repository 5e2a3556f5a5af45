//! Wishlists for signed-in users.
//!
//! Each entry lives at `users/{user}/wishlist/{design}` and holds a full copy
//! of the catalog document at save time plus `id` and `saved_at`. Keying by
//! design ID makes saves idempotent: saving again overwrites the snapshot.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use threadline_core::{CollectionPath, DesignId, DocumentPath, Fields, PathError, UserId};

use crate::store::{Document, DocumentStore, StoreError};

/// Snapshot field holding the design ID.
pub const ID_FIELD: &str = "id";
/// Snapshot field holding the save time (RFC 3339, UTC).
pub const SAVED_AT_FIELD: &str = "saved_at";

/// Errors saving a wishlist entry.
#[derive(Debug, Error)]
pub enum WishlistError {
    /// The user or design ID is not a valid path segment.
    #[error("invalid wishlist path: {0}")]
    Path(#[from] PathError),

    /// Reading the catalog document failed.
    #[error("failed to fetch design {design_id}: {source}")]
    Fetch {
        design_id: DesignId,
        #[source]
        source: StoreError,
    },

    /// Writing the wishlist entry failed.
    #[error("failed to save wishlist entry {design_id}: {source}")]
    Write {
        design_id: DesignId,
        #[source]
        source: StoreError,
    },
}

/// Result of saving a design to a wishlist.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The snapshot that was written.
    Saved(Fields),
    /// No catalog document exists for the design; nothing was written.
    DesignNotFound,
}

/// Format a save time the way wishlist snapshots store it.
#[must_use]
pub fn format_saved_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Wishlist operations over `users/{user}/wishlist`.
pub struct WishlistService<'a, D> {
    store: &'a D,
}

impl<'a, D: DocumentStore> WishlistService<'a, D> {
    /// Create a wishlist service over `store`.
    #[must_use]
    pub const fn new(store: &'a D) -> Self {
        Self { store }
    }

    /// Snapshot `design` from the catalog into the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError` if an ID is invalid or the catalog read or
    /// wishlist write fails. A missing design is not an error.
    #[instrument(skip(self), fields(user_id = %user, design_id = %design))]
    pub async fn save(&self, user: &UserId, design: &DesignId) -> Result<SaveOutcome, WishlistError> {
        let catalog_path = DocumentPath::design(design)?;
        let entry_path = DocumentPath::wishlist_entry(user, design)?;

        let catalog = self
            .store
            .get_document(&catalog_path)
            .await
            .map_err(|source| WishlistError::Fetch {
                design_id: design.clone(),
                source,
            })?;
        let Some(mut snapshot) = catalog else {
            return Ok(SaveOutcome::DesignNotFound);
        };

        snapshot.insert(ID_FIELD.to_owned(), Value::String(design.to_string()));
        snapshot.insert(
            SAVED_AT_FIELD.to_owned(),
            Value::String(format_saved_at(Utc::now())),
        );

        self.store
            .set_document(&entry_path, snapshot.clone())
            .await
            .map_err(|source| WishlistError::Write {
                design_id: design.clone(),
                source,
            })?;

        Ok(SaveOutcome::Saved(snapshot))
    }

    /// Remove `design` from the wishlist. Returns whether it was saved.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if an ID is invalid or the delete fails.
    pub async fn remove(&self, user: &UserId, design: &DesignId) -> Result<bool, StoreError> {
        let path = DocumentPath::wishlist_entry(user, design)?;
        self.store.delete_document(&path).await
    }

    /// Whether `design` is on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if an ID is invalid or the read fails.
    pub async fn contains(&self, user: &UserId, design: &DesignId) -> Result<bool, StoreError> {
        let path = DocumentPath::wishlist_entry(user, design)?;
        Ok(self.store.get_document(&path).await?.is_some())
    }

    /// All wishlist snapshots, ordered by design ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the listing fails.
    pub async fn list(&self, user: &UserId) -> Result<Vec<Document>, StoreError> {
        let collection = CollectionPath::user_wishlist(user)?;
        self.store.list_documents(&collection).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::MemoryDocumentStore;

    async fn seed(store: &MemoryDocumentStore, id: &str, fields: Value) {
        let path = DocumentPath::design(&DesignId::new(id)).unwrap();
        store
            .set_document(&path, fields.as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_save_snapshots_catalog() {
        let store = MemoryDocumentStore::new();
        seed(&store, "rose", json!({"name": "Rose Hoop", "price": "42.00"})).await;
        let wishlist = WishlistService::new(&store);
        let user = UserId::new("u1");

        let outcome = wishlist.save(&user, &DesignId::new("rose")).await.unwrap();
        let SaveOutcome::Saved(snapshot) = outcome else {
            panic!("expected saved");
        };
        assert_eq!(snapshot["name"], "Rose Hoop");
        assert_eq!(snapshot["id"], "rose");
        assert!(snapshot.contains_key(SAVED_AT_FIELD));
        assert!(wishlist.contains(&user, &DesignId::new("rose")).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_missing_design_writes_nothing() {
        let store = MemoryDocumentStore::new();
        let wishlist = WishlistService::new(&store);

        let outcome = wishlist
            .save(&UserId::new("u1"), &DesignId::new("ghost"))
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::DesignNotFound);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_twice_overwrites() {
        let store = MemoryDocumentStore::new();
        seed(&store, "rose", json!({"name": "Rose Hoop"})).await;
        let wishlist = WishlistService::new(&store);
        let user = UserId::new("u1");
        let rose = DesignId::new("rose");

        wishlist.save(&user, &rose).await.unwrap();
        wishlist.save(&user, &rose).await.unwrap();

        assert_eq!(wishlist.list(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryDocumentStore::new();
        seed(&store, "rose", json!({"name": "Rose Hoop"})).await;
        let wishlist = WishlistService::new(&store);
        let user = UserId::new("u1");
        let rose = DesignId::new("rose");

        wishlist.save(&user, &rose).await.unwrap();
        assert!(wishlist.remove(&user, &rose).await.unwrap());
        assert!(!wishlist.remove(&user, &rose).await.unwrap());
    }

    #[tokio::test]
    async fn test_write_failure_is_classified() {
        let store = MemoryDocumentStore::new();
        seed(&store, "rose", json!({"name": "Rose Hoop"})).await;
        store.fail_writes_at("users/u1/wishlist/rose").await;
        let wishlist = WishlistService::new(&store);

        let err = wishlist
            .save(&UserId::new("u1"), &DesignId::new("rose"))
            .await
            .unwrap_err();
        assert!(matches!(err, WishlistError::Write { .. }));
    }

    #[test]
    fn test_saved_at_format() {
        let at = DateTime::parse_from_rfc3339("2026-10-19T12:00:00.123456789Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_saved_at(at), "2026-10-19T12:00:00.123456789Z");
    }
}
