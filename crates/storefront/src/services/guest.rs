//! Guest bag and wishlist state.
//!
//! Guest state is a pair of JSON arrays held in a [`GuestStore`]:
//!
//! ```text
//! guestBagStorageKey      = [{"id": "...", "_displayDetails": {...}, "fabric": "silk", ...}]
//! guestWishlistStorageKey = ["rose-hoop", "monogram-classic"]
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use threadline_core::{DesignId, Fields, GUEST_BAG_KEY, GUEST_WISHLIST_KEY};

use crate::models::GuestBagItem;
use crate::store::{GuestStore, StoreError};

/// Errors reading or writing guest state.
#[derive(Debug, Error)]
pub enum GuestStateError {
    /// The guest store itself failed.
    #[error("guest store error: {0}")]
    Store(#[from] StoreError),

    /// The stored value is not valid JSON of the expected shape.
    #[error("{key} is not valid: {source}")]
    Parse {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The stored value is valid JSON but not an array.
    #[error("{key} is not a list")]
    NotAList { key: &'static str },
}

/// A decoded guest list.
///
/// Elements that do not have the expected shape are dropped and counted in
/// `malformed`; one bad element never hides the rest of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestList<T> {
    pub items: Vec<T>,
    pub malformed: usize,
}

impl<T> GuestList<T> {
    /// True when the stored array had no elements at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.malformed == 0
    }
}

/// Read and decode the list stored under `key`.
///
/// Returns `Ok(None)` when the key is absent. An empty array decodes to an
/// empty list; callers decide whether that is a no-op.
///
/// # Errors
///
/// Returns `GuestStateError` if the store fails, the value is not JSON, or is
/// not an array. Individual elements of the wrong shape are not errors.
pub async fn read_list<G, T>(
    store: &G,
    key: &'static str,
) -> Result<Option<GuestList<T>>, GuestStateError>
where
    G: GuestStore,
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    let value: Value =
        serde_json::from_str(&raw).map_err(|source| GuestStateError::Parse { key, source })?;
    let Value::Array(elements) = value else {
        return Err(GuestStateError::NotAList { key });
    };

    let mut list = GuestList {
        items: Vec::with_capacity(elements.len()),
        malformed: 0,
    };
    for (index, element) in elements.into_iter().enumerate() {
        match serde_json::from_value(element) {
            Ok(item) => list.items.push(item),
            Err(e) => {
                tracing::debug!(key, index, error = %e, "Dropping malformed guest list element");
                list.malformed += 1;
            }
        }
    }

    Ok(Some(list))
}

async fn write_list<G, T>(store: &G, key: &'static str, items: &[T]) -> Result<(), GuestStateError>
where
    G: GuestStore,
    T: serde::Serialize,
{
    let raw = serde_json::to_string(items).map_err(|source| GuestStateError::Parse { key, source })?;
    store.set(key, raw).await?;
    Ok(())
}

/// The guest's shopping bag.
pub struct GuestBag<'a, G> {
    store: &'a G,
}

impl<'a, G: GuestStore> GuestBag<'a, G> {
    /// Bag view over `store`.
    #[must_use]
    pub const fn new(store: &'a G) -> Self {
        Self { store }
    }

    /// All well-formed items; empty when nothing has been added.
    ///
    /// # Errors
    ///
    /// Returns `GuestStateError` if the stored bag cannot be read.
    pub async fn items(&self) -> Result<Vec<GuestBagItem>, GuestStateError> {
        Ok(read_list(self.store, GUEST_BAG_KEY)
            .await?
            .map(|list| list.items)
            .unwrap_or_default())
    }

    /// Append a draft, assigning a local `id` if it has none. Returns the new
    /// item count.
    ///
    /// # Errors
    ///
    /// Returns `GuestStateError` if the stored bag cannot be read or written.
    pub async fn add(&self, fields: Fields) -> Result<usize, GuestStateError> {
        let mut items = self.items().await?;

        let mut item = GuestBagItem::from(fields);
        item.id
            .get_or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        items.push(item);

        write_list(self.store, GUEST_BAG_KEY, &items).await?;
        Ok(items.len())
    }

    /// Number of items in the bag.
    ///
    /// # Errors
    ///
    /// Returns `GuestStateError` if the stored bag cannot be read.
    pub async fn count(&self) -> Result<usize, GuestStateError> {
        Ok(self.items().await?.len())
    }
}

/// The guest's wishlist of design IDs.
pub struct GuestWishlist<'a, G> {
    store: &'a G,
}

impl<'a, G: GuestStore> GuestWishlist<'a, G> {
    /// Wishlist view over `store`.
    #[must_use]
    pub const fn new(store: &'a G) -> Self {
        Self { store }
    }

    /// Saved design IDs in insertion order, skipping non-string elements.
    ///
    /// # Errors
    ///
    /// Returns `GuestStateError` if the stored list cannot be read.
    pub async fn ids(&self) -> Result<Vec<DesignId>, GuestStateError> {
        Ok(read_list(self.store, GUEST_WISHLIST_KEY)
            .await?
            .map(|list| list.items)
            .unwrap_or_default())
    }

    /// Add `design` if absent, remove it if present. Returns whether the
    /// design is saved afterwards.
    ///
    /// # Errors
    ///
    /// Returns `GuestStateError` if the stored list cannot be read or written.
    pub async fn toggle(&self, design: &DesignId) -> Result<bool, GuestStateError> {
        let mut ids = self.ids().await?;
        let saved = if let Some(pos) = ids.iter().position(|id| id == design) {
            ids.remove(pos);
            false
        } else {
            ids.push(design.clone());
            true
        };

        write_list(self.store, GUEST_WISHLIST_KEY, &ids).await?;
        Ok(saved)
    }
}
