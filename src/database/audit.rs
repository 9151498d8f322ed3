use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::services::{AuditEntry, AuditLog, AuditRecord, CollaboratorError};

/// Append-only `admin_logs` table. `created_at` comes from the database clock.
#[derive(Clone)]
pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditRecord, CollaboratorError> {
        let id = Uuid::new_v4();
        let row = sqlx::query(
            r#"
            INSERT INTO admin_logs (id, admin_uid, action, target_uid, created_at)
            VALUES ($1, $2, $3, $4, now())
            RETURNING created_at
            "#,
        )
        .bind(id)
        .bind(&entry.actor_uid)
        .bind(entry.action.as_str())
        .bind(&entry.target_uid)
        .fetch_one(&self.pool)
        .await?;

        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        Ok(AuditRecord { id, created_at })
    }
}
