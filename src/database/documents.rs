use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::manager::DatabaseManager;
use crate::services::{CollaboratorError, DocumentPath, DocumentStore, RoleStore};

/// Profile documents stored one table per collection, keyed by `id`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PgDocumentStore {
    async fn get_role(&self, uid: &str) -> Result<Option<String>, CollaboratorError> {
        let row = sqlx::query("SELECT role FROM users WHERE id = $1")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        // A profile without a role column value still exists; it just is not an admin.
        Ok(match row {
            Some(row) => Some(row.try_get::<Option<String>, _>("role")?.unwrap_or_default()),
            None => None,
        })
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn delete(&self, path: &DocumentPath) -> Result<(), CollaboratorError> {
        let table = DatabaseManager::quote_identifier(&path.collection)
            .map_err(|_| CollaboratorError::InvalidPath(path.to_string()))?;

        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(&path.id)
            .execute(&self.pool)
            .await?;

        // Deleting an absent document is not an error.
        tracing::debug!("Deleted {} row(s) for {}", result.rows_affected(), path);
        Ok(())
    }
}
