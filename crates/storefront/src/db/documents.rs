//! `PostgreSQL` document store.
//!
//! Every document is one row in `storefront.document`, keyed by its full
//! path. The parent collection path and the final segment are stored
//! alongside so listing a collection is an indexed equality scan.

use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;
use uuid::Uuid;

use threadline_core::{CollectionPath, DocumentPath, Fields};

use crate::store::{BatchOp, Document, DocumentStore, StoreError, WriteBatch};

/// [`DocumentStore`] backed by a `jsonb` table.
#[derive(Clone, Debug)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_documents(rows: Vec<(String, Json<Fields>)>) -> Vec<Document> {
    rows.into_iter()
        .map(|(id, Json(fields))| Document { id, fields })
        .collect()
}

impl DocumentStore for PgDocumentStore {
    #[instrument(skip(self, body), fields(collection = %collection))]
    async fn create_document(
        &self,
        collection: &CollectionPath,
        body: Fields,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let path = collection.document(&id)?;

        sqlx::query(
            r"
            INSERT INTO storefront.document (path, collection, doc_id, fields)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(path.as_str())
        .bind(collection.as_str())
        .bind(&id)
        .bind(Json(&body))
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Fields>, StoreError> {
        let row: Option<Json<Fields>> =
            sqlx::query_scalar("SELECT fields FROM storefront.document WHERE path = $1")
                .bind(path.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|Json(fields)| fields))
    }

    #[instrument(skip(self, body), fields(path = %path))]
    async fn set_document(&self, path: &DocumentPath, body: Fields) -> Result<(), StoreError> {
        upsert(&self.pool, path, &body).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete_document(&self, path: &DocumentPath) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM storefront.document WHERE path = $1")
            .bind(path.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn list_documents(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<(String, Json<Fields>)> = sqlx::query_as(
            r"
            SELECT doc_id, fields
            FROM storefront.document
            WHERE collection = $1
            ORDER BY doc_id
            ",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(into_documents(rows))
    }

    #[instrument(skip(self, value), fields(collection = %collection, field = %field))]
    async fn query_equal(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<(String, Json<Fields>)> = sqlx::query_as(
            r"
            SELECT doc_id, fields
            FROM storefront.document
            WHERE collection = $1 AND fields -> $2 = $3
            ORDER BY doc_id
            ",
        )
        .bind(collection.as_str())
        .bind(field)
        .bind(Json(value))
        .fetch_all(&self.pool)
        .await?;

        Ok(into_documents(rows))
    }

    #[instrument(skip(self, batch), fields(ops = batch.len()))]
    async fn commit_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for op in batch.into_ops() {
            match op {
                BatchOp::Set { path, fields } => {
                    upsert(&mut *tx, &path, &fields).await?;
                }
                BatchOp::Delete { path } => {
                    sqlx::query("DELETE FROM storefront.document WHERE path = $1")
                        .bind(path.as_str())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn upsert<'e, E>(executor: E, path: &DocumentPath, fields: &Fields) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r"
        INSERT INTO storefront.document (path, collection, doc_id, fields)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (path) DO UPDATE
            SET fields = excluded.fields,
                updated_at = now()
        ",
    )
    .bind(path.as_str())
    .bind(path.collection().as_str())
    .bind(path.id())
    .bind(Json(fields))
    .execute(executor)
    .await?;

    Ok(())
}
