//! Catalog administration.
//!
//! Designs live in the global `designs` collection. Imports are
//! duplicate-checked one input at a time, then committed together in a
//! single atomic batch.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument};

use threadline_core::{CollectionPath, DesignId, DocumentPath, Fields, PathError};

use crate::models::DesignInput;
use crate::models::design::NAME_FIELD;
use crate::store::{Document, DocumentStore, StoreError, WriteBatch};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Storage failed.
    #[error("catalog store error: {0}")]
    Store(#[from] StoreError),

    /// A design ID is not a valid path segment.
    #[error("invalid design id: {0}")]
    Path(#[from] PathError),
}

/// Why an import input was not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another input in the same import has this ID or name.
    DuplicateInBatch,
    /// A design with this ID already exists.
    IdExists,
    /// A design with this name already exists.
    NameExists,
    /// The name is empty or no usable ID could be derived.
    Invalid,
}

/// An input that was skipped, identified by its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub name: String,
    pub reason: SkipReason,
}

/// Result of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Designs written, in input order.
    pub imported: Vec<DesignId>,
    /// Inputs not written and why.
    pub skipped: Vec<Skipped>,
}

/// Catalog operations over the `designs` collection.
pub struct CatalogService<'a, D> {
    store: &'a D,
}

impl<'a, D: DocumentStore> CatalogService<'a, D> {
    /// Create a catalog service over `store`.
    #[must_use]
    pub const fn new(store: &'a D) -> Self {
        Self { store }
    }

    /// Read one design.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the ID is invalid or the read fails.
    pub async fn get(&self, design: &DesignId) -> Result<Option<Fields>, CatalogError> {
        let path = DocumentPath::design(design)?;
        Ok(self.store.get_document(&path).await?)
    }

    /// All designs, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the listing fails.
    pub async fn list(&self) -> Result<Vec<Document>, CatalogError> {
        Ok(self.store.list_documents(&CollectionPath::designs()).await?)
    }

    /// Delete a design. Existing wishlist snapshots are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the ID is invalid or the delete fails.
    pub async fn delete(&self, design: &DesignId) -> Result<bool, CatalogError> {
        let path = DocumentPath::design(design)?;
        Ok(self.store.delete_document(&path).await?)
    }

    /// Import designs, skipping duplicates, in one atomic write.
    ///
    /// An input is skipped when an earlier input in `inputs` shares its ID or
    /// name, when a design with its ID exists, or when a design with its name
    /// exists. If the final commit fails nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if a duplicate check or the commit fails.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn import(&self, inputs: Vec<DesignInput>) -> Result<ImportSummary, CatalogError> {
        let designs = CollectionPath::designs();
        let mut summary = ImportSummary::default();
        let mut seen_ids = HashSet::new();
        let mut seen_names = HashSet::new();
        let mut batch = WriteBatch::new();

        for mut input in inputs {
            input.name = input.name.trim().to_owned();
            let name = input.name.clone();
            let skip = |reason| Skipped {
                name: name.clone(),
                reason,
            };

            let id = match input.resolved_id() {
                Some(id) if !name.is_empty() => id,
                _ => {
                    summary.skipped.push(skip(SkipReason::Invalid));
                    continue;
                }
            };

            if seen_ids.contains(&id) || seen_names.contains(&name) {
                summary.skipped.push(skip(SkipReason::DuplicateInBatch));
                continue;
            }
            seen_ids.insert(id.clone());
            seen_names.insert(name.clone());

            let path = designs.document(id.as_str())?;
            if self.store.get_document(&path).await?.is_some() {
                summary.skipped.push(skip(SkipReason::IdExists));
                continue;
            }

            let same_name = self
                .store
                .query_equal(&designs, NAME_FIELD, &Value::String(name.clone()))
                .await?;
            if !same_name.is_empty() {
                summary.skipped.push(skip(SkipReason::NameExists));
                continue;
            }

            batch.set(path, input.into_fields());
            summary.imported.push(id);
        }

        if !batch.is_empty() {
            self.store.commit_batch(batch).await?;
        }

        info!(
            imported = summary.imported.len(),
            skipped = summary.skipped.len(),
            "Catalog import committed"
        );
        Ok(summary)
    }
}
