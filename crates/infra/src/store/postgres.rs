//! Postgres-backed document store.
//!
//! Bodies are stored as JSONB in `documents`; unique fields are claimed as rows
//! of `document_keys` whose primary key rejects a second owner.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) on `document_keys` | `23505` | `Duplicate` |
//! | Any other | - | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use super::{DocumentStore, StoreError, UniqueKey};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id UUID NOT NULL,
        body JSONB NOT NULL,
        PRIMARY KEY (collection, id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS document_keys (
        collection TEXT NOT NULL,
        field TEXT NOT NULL,
        value TEXT NOT NULL,
        id UUID NOT NULL,
        PRIMARY KEY (collection, field, value)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS document_keys_owner ON document_keys (collection, id)",
];

/// Postgres-backed document store.
///
/// Every write runs in one transaction together with its key bookkeeping.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: Arc<PgPool>,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Connect and make sure the schema exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

async fn claim_keys(
    tx: &mut Transaction<'_, Postgres>,
    collection: &str,
    id: Uuid,
    keys: &[UniqueKey],
) -> Result<(), StoreError> {
    for key in keys {
        sqlx::query("INSERT INTO document_keys (collection, field, value, id) VALUES ($1, $2, $3, $4)")
            .bind(collection)
            .bind(key.field)
            .bind(&key.value)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate {
                        field: key.field.to_string(),
                        value: key.value.clone(),
                    }
                } else {
                    map_sqlx_error("claim_key", e)
                }
            })?;
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self, body, keys), err)]
    async fn insert(&self, collection: &str, id: Uuid, body: JsonValue, keys: &[UniqueKey]) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(&body)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_document", e))?;
        claim_keys(&mut tx, collection, id, keys).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self, body, keys), err)]
    async fn replace(&self, collection: &str, id: Uuid, body: JsonValue, keys: &[UniqueKey]) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;

        let updated = sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .bind(&body)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_document", e))?;
        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound);
        }

        sqlx::query("DELETE FROM document_keys WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("release_keys", e))?;
        claim_keys(&mut tx, collection, id, keys).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_document", e))?;

        row.map(|r| r.try_get::<JsonValue, _>("body"))
            .transpose()
            .map_err(|e| map_sqlx_error("decode_document", e))
    }

    async fn list(&self, collection: &str) -> Result<Vec<JsonValue>, StoreError> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = $1 ORDER BY id ASC")
            .bind(collection)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_documents", e))?;

        rows.iter()
            .map(|r| r.try_get::<JsonValue, _>("body"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_document", e))
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;

        sqlx::query("DELETE FROM document_keys WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("release_keys", e))?;
        let deleted = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_document", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(deleted.rows_affected() > 0)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed during {operation}")),
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
