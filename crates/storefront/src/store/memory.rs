//! In-memory storage backends.
//!
//! Used by tests and local development. Both stores are cheaply cloneable;
//! clones share the same underlying data.
//!
//! [`MemoryDocumentStore`] supports fault injection so callers can exercise
//! partial-failure paths: reads or writes at a given path can be made to fail,
//! as can the n-th `create_document` call.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use threadline_core::{CollectionPath, DocumentPath, Fields};

use super::{BatchOp, Document, DocumentStore, GuestStore, StoreError, WriteBatch};

#[derive(Default)]
struct Faults {
    reads: HashSet<String>,
    writes: HashSet<String>,
    creates: HashSet<usize>,
}

impl Faults {
    fn check_read(&self, path: &DocumentPath) -> Result<(), StoreError> {
        if self.reads.contains(path.as_str()) {
            return Err(StoreError::Unavailable(format!("injected read fault at {path}")));
        }
        Ok(())
    }

    fn check_write(&self, path: &str, collection: &str) -> Result<(), StoreError> {
        if self.writes.contains(path) || self.writes.contains(collection) {
            return Err(StoreError::Unavailable(format!("injected write fault at {path}")));
        }
        Ok(())
    }
}

#[derive(Default)]
struct State {
    documents: BTreeMap<DocumentPath, Fields>,
    faults: Faults,
    creates: usize,
}

/// In-memory [`DocumentStore`].
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    state: Arc<RwLock<State>>,
    operations: Arc<AtomicUsize>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations issued so far (reads and writes).
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Make every read of the document at `path` fail.
    pub async fn fail_reads_at(&self, path: &str) {
        self.state.write().await.faults.reads.insert(path.to_owned());
    }

    /// Make writes fail at `path`, which may name a document or a collection.
    pub async fn fail_writes_at(&self, path: &str) {
        self.state.write().await.faults.writes.insert(path.to_owned());
    }

    /// Make the n-th `create_document` call (1-based) fail.
    pub async fn fail_create_number(&self, n: usize) {
        self.state.write().await.faults.creates.insert(n);
    }

    /// Remove all injected faults.
    pub async fn clear_faults(&self) {
        self.state.write().await.faults = Faults::default();
    }

    /// Number of documents stored anywhere in the tree.
    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.documents.is_empty()
    }

    fn touch(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn create_document(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<String, StoreError> {
        self.touch();
        let mut state = self.state.write().await;
        state.creates += 1;
        if state.faults.creates.contains(&state.creates) {
            return Err(StoreError::Unavailable(format!(
                "injected fault on create #{} in {collection}",
                state.creates
            )));
        }

        let id = Uuid::new_v4().simple().to_string();
        let path = collection.document(&id)?;
        state
            .faults
            .check_write(path.as_str(), collection.as_str())?;
        state.documents.insert(path, fields);
        Ok(id)
    }

    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Fields>, StoreError> {
        self.touch();
        let state = self.state.read().await;
        state.faults.check_read(path)?;
        Ok(state.documents.get(path).cloned())
    }

    async fn set_document(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.touch();
        let mut state = self.state.write().await;
        state
            .faults
            .check_write(path.as_str(), path.collection().as_str())?;
        state.documents.insert(path.clone(), fields);
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<bool, StoreError> {
        self.touch();
        let mut state = self.state.write().await;
        state
            .faults
            .check_write(path.as_str(), path.collection().as_str())?;
        Ok(state.documents.remove(path).is_some())
    }

    async fn list_documents(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        self.touch();
        let state = self.state.read().await;
        Ok(state
            .documents
            .iter()
            .filter(|(path, _)| collection.contains(path))
            .map(|(path, fields)| Document {
                id: path.id().to_owned(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn query_equal(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        self.touch();
        let state = self.state.read().await;
        Ok(state
            .documents
            .iter()
            .filter(|(path, fields)| collection.contains(path) && fields.get(field) == Some(value))
            .map(|(path, fields)| Document {
                id: path.id().to_owned(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn commit_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.touch();
        let mut state = self.state.write().await;

        // Validate every op before applying any of them.
        for op in batch.ops() {
            let path = match op {
                BatchOp::Set { path, .. } | BatchOp::Delete { path } => path,
            };
            state
                .faults
                .check_write(path.as_str(), path.collection().as_str())?;
        }

        for op in batch.into_ops() {
            match op {
                BatchOp::Set { path, fields } => {
                    state.documents.insert(path, fields);
                }
                BatchOp::Delete { path } => {
                    state.documents.remove(&path);
                }
            }
        }
        Ok(())
    }
}

/// In-memory [`GuestStore`].
#[derive(Clone, Default)]
pub struct MemoryGuestStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryGuestStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Arc::new(RwLock::new(values)),
        }
    }

    /// Whether `key` currently holds a value.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.values.read().await.contains_key(key)
    }
}

impl GuestStore for MemoryGuestStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let store = MemoryDocumentStore::new();
        let drafts = CollectionPath::parse("users/u1/drafts").unwrap();

        let id = store
            .create_document(&drafts, fields(json!({"fabric": "silk"})))
            .await
            .unwrap();

        let docs = store.list_documents(&drafts).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert_eq!(docs[0].fields["fabric"], "silk");
        assert_eq!(store.operation_count(), 2);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryDocumentStore::new();
        let path = DocumentPath::parse("designs/d1").unwrap();

        store.set_document(&path, fields(json!({"v": 1}))).await.unwrap();
        store.set_document(&path, fields(json!({"v": 2}))).await.unwrap();

        assert_eq!(store.len().await, 1);
        let doc = store.get_document(&path).await.unwrap().unwrap();
        assert_eq!(doc["v"], 2);
    }

    #[tokio::test]
    async fn test_list_excludes_nested_and_siblings() {
        let store = MemoryDocumentStore::new();
        for path in ["users/u1/drafts/a", "users/u2/drafts/b", "users/u1/wishlist/c"] {
            let path = DocumentPath::parse(path).unwrap();
            store.set_document(&path, Fields::new()).await.unwrap();
        }

        let drafts = CollectionPath::parse("users/u1/drafts").unwrap();
        let docs = store.list_documents(&drafts).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "a");
    }

    #[tokio::test]
    async fn test_query_equal() {
        let store = MemoryDocumentStore::new();
        let designs = CollectionPath::designs();
        for (id, name) in [("a", "Rose"), ("b", "Tulip"), ("c", "Rose")] {
            let path = designs.document(id).unwrap();
            store
                .set_document(&path, fields(json!({"name": name})))
                .await
                .unwrap();
        }

        let roses = store
            .query_equal(&designs, "name", &json!("Rose"))
            .await
            .unwrap();
        let ids: Vec<_> = roses.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[tokio::test]
    async fn test_injected_create_fault() {
        let store = MemoryDocumentStore::new();
        let drafts = CollectionPath::parse("users/u1/drafts").unwrap();
        store.fail_create_number(2).await;

        assert!(store.create_document(&drafts, Fields::new()).await.is_ok());
        assert!(store.create_document(&drafts, Fields::new()).await.is_err());
        assert!(store.create_document(&drafts, Fields::new()).await.is_ok());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_batch_is_atomic() {
        let store = MemoryDocumentStore::new();
        store.fail_writes_at("designs/bad").await;

        let mut batch = WriteBatch::new();
        batch
            .set(DocumentPath::parse("designs/good").unwrap(), Fields::new())
            .set(DocumentPath::parse("designs/bad").unwrap(), Fields::new());

        assert!(store.commit_batch(batch).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_read_fault() {
        let store = MemoryDocumentStore::new();
        store.fail_reads_at("designs/d1").await;
        let path = DocumentPath::parse("designs/d1").unwrap();
        assert!(matches!(
            store.get_document(&path).await,
            Err(StoreError::Unavailable(_))
        ));

        store.clear_faults().await;
        assert!(store.get_document(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guest_store_roundtrip() {
        let guest = MemoryGuestStore::with_entries([("k", "v")]);
        assert_eq!(guest.get("k").await.unwrap().as_deref(), Some("v"));

        guest.remove("k").await.unwrap();
        guest.remove("k").await.unwrap();
        assert!(!guest.contains_key("k").await);
    }
}
