//! Storage capabilities used by the storefront.
//!
//! Two narrow interfaces sit at the storage seam:
//!
//! - [`DocumentStore`] - hierarchical JSON documents (catalog, drafts, wishlists)
//! - [`GuestStore`] - string key-value state held for an unauthenticated visitor
//!
//! Both are implemented twice: a production backend ([`PgDocumentStore`],
//! [`SessionGuestStore`]) and an in-memory backend ([`MemoryDocumentStore`],
//! [`MemoryGuestStore`]) used by tests and local development.
//!
//! [`PgDocumentStore`]: crate::db::documents::PgDocumentStore

pub mod memory;
pub mod session;

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use threadline_core::{CollectionPath, DocumentPath, Fields, PathError};

pub use memory::{MemoryDocumentStore, MemoryGuestStore};
pub use session::SessionGuestStore;

/// Errors returned by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A path could not be built from the given IDs.
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// Session storage failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The backend refused or could not complete the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A document together with its ID inside a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Final path segment.
    pub id: String,
    /// Document body.
    pub fields: Fields,
}

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum BatchOp {
    /// Create-or-overwrite the document at `path`.
    Set { path: DocumentPath, fields: Fields },
    /// Delete the document at `path` if present.
    Delete { path: DocumentPath },
}

/// A group of writes committed atomically.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    #[must_use]
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Queue a create-or-overwrite.
    pub fn set(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.ops.push(BatchOp::Set { path, fields });
        self
    }

    /// Queue a delete.
    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.ops.push(BatchOp::Delete { path });
        self
    }

    /// Number of queued writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether no writes are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The queued writes, in order.
    #[must_use]
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Consume the batch and return its writes.
    #[must_use]
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Hierarchical JSON document storage.
///
/// Futures are `Send` so operations can be fanned out and joined from
/// request handlers and spawned tasks alike.
pub trait DocumentStore: Send + Sync {
    /// Insert a document with a store-generated ID and return that ID.
    fn create_document(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Read a document; `None` when it does not exist.
    fn get_document(
        &self,
        path: &DocumentPath,
    ) -> impl Future<Output = Result<Option<Fields>, StoreError>> + Send;

    /// Create or overwrite a document.
    fn set_document(
        &self,
        path: &DocumentPath,
        fields: Fields,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete a document; returns whether one existed.
    fn delete_document(
        &self,
        path: &DocumentPath,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// All direct child documents of a collection, ordered by ID.
    fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Child documents whose top-level `field` equals `value`, ordered by ID.
    fn query_equal(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Apply every write in `batch`, or none of them.
    fn commit_batch(&self, batch: WriteBatch)
    -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// String key-value storage for guest state.
pub trait GuestStore: Send + Sync {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}
