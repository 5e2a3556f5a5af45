//! Saved drafts for signed-in users.

use tracing::instrument;

use threadline_core::{CollectionPath, DraftId, Fields, UserId};

use crate::store::{Document, DocumentStore, StoreError};

/// Draft operations over `users/{user}/drafts`.
pub struct DraftService<'a, D> {
    store: &'a D,
}

impl<'a, D: DocumentStore> DraftService<'a, D> {
    /// Create a draft service over `store`.
    #[must_use]
    pub const fn new(store: &'a D) -> Self {
        Self { store }
    }

    /// Save a new draft. Drafts carry no idempotency key: saving the same
    /// configuration twice creates two drafts.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the user ID is not a valid path segment or the
    /// write fails.
    #[instrument(skip(self, draft), fields(user_id = %user))]
    pub async fn create(&self, user: &UserId, draft: Fields) -> Result<DraftId, StoreError> {
        let collection = CollectionPath::user_drafts(user)?;
        let id = self.store.create_document(&collection, draft).await?;
        Ok(DraftId::new(id))
    }

    /// All of the user's drafts, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the listing fails.
    pub async fn list(&self, user: &UserId) -> Result<Vec<Document>, StoreError> {
        let collection = CollectionPath::user_drafts(user)?;
        self.store.list_documents(&collection).await
    }

    /// Number of saved drafts; backs the bag count badge for signed-in users.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the listing fails.
    pub async fn count(&self, user: &UserId) -> Result<usize, StoreError> {
        Ok(self.list(user).await?.len())
    }
}
