//! PostgreSQL-based template backend.
//!
//! Templates live in the `message_templates` table, one row per building and
//! category. Saves are `INSERT ... ON CONFLICT DO UPDATE`, so the last write
//! wins and `created_at` survives overwrites.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::postgres::{PostgresPool, PostgresPoolError};

use super::backend::{StoreError, TemplateBackend};
use super::types::{template_id, Category, MessageTemplate};

const SCHEMA_SQL: &str = include_str!("../../../migrations/0001_message_templates.sql");

const SELECT_COLUMNS: &str = "id, condo_id, category, title, content, is_active, is_mandatory, \
     created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id: String,
    condo_id: String,
    category: String,
    title: String,
    content: String,
    is_active: bool,
    is_mandatory: Option<bool>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for MessageTemplate {
    type Error = StoreError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .parse::<Category>()
            .map_err(|e| StoreError::Corrupt {
                id: row.id.clone(),
                reason: e.to_string(),
            })?;

        Ok(MessageTemplate {
            id: row.id,
            condo_id: row.condo_id,
            category,
            title: row.title,
            content: row.content,
            is_active: row.is_active,
            is_mandatory: row.is_mandatory,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<PostgresPoolError> for StoreError {
    fn from(err: PostgresPoolError) -> Self {
        match err {
            PostgresPoolError::Sqlx(e) => StoreError::Postgres(e),
            PostgresPoolError::CircuitOpen => {
                StoreError::Unavailable("PostgreSQL circuit breaker is open".to_string())
            }
        }
    }
}

/// PostgreSQL-based template backend.
pub struct PostgresTemplateBackend {
    pool: Arc<PostgresPool>,
}

impl PostgresTemplateBackend {
    pub fn new(pool: Arc<PostgresPool>) -> Self {
        Self { pool }
    }

    /// Create the `message_templates` table if missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(self.pool.pool()).await?;
        tracing::info!("message_templates schema ready");
        Ok(())
    }
}

#[async_trait]
impl TemplateBackend for PostgresTemplateBackend {
    fn backend_type(&self) -> &'static str {
        "postgres"
    }

    async fn list_for_condo(&self, condo_id: &str) -> Result<Vec<MessageTemplate>, StoreError> {
        let condo_id = condo_id.to_string();
        let sql = format!(
            "SELECT {} FROM message_templates WHERE condo_id = $1 ORDER BY category",
            SELECT_COLUMNS
        );

        let rows: Vec<TemplateRow> = self
            .pool
            .execute(move |pool| async move {
                sqlx::query_as::<_, TemplateRow>(&sql)
                    .bind(&condo_id)
                    .fetch_all(&pool)
                    .await
            })
            .await?;

        rows.into_iter().map(MessageTemplate::try_from).collect()
    }

    async fn get(
        &self,
        condo_id: &str,
        category: Category,
    ) -> Result<Option<MessageTemplate>, StoreError> {
        let id = template_id(condo_id, category);
        let sql = format!("SELECT {} FROM message_templates WHERE id = $1", SELECT_COLUMNS);

        let row: Option<TemplateRow> = self
            .pool
            .execute(move |pool| async move {
                sqlx::query_as::<_, TemplateRow>(&sql)
                    .bind(&id)
                    .fetch_optional(&pool)
                    .await
            })
            .await?;

        row.map(MessageTemplate::try_from).transpose()
    }

    async fn upsert(&self, template: &MessageTemplate) -> Result<(), StoreError> {
        let template = template.clone();
        let id = template.id.clone();

        self.pool
            .execute(move |pool| async move {
                sqlx::query(
                    r#"
                    INSERT INTO message_templates
                        (id, condo_id, category, title, content, is_active, is_mandatory,
                         created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    ON CONFLICT (id) DO UPDATE SET
                        title = EXCLUDED.title,
                        content = EXCLUDED.content,
                        is_active = EXCLUDED.is_active,
                        is_mandatory = COALESCE(EXCLUDED.is_mandatory, message_templates.is_mandatory),
                        updated_at = EXCLUDED.updated_at
                    "#,
                )
                .bind(&template.id)
                .bind(&template.condo_id)
                .bind(template.category.as_str())
                .bind(&template.title)
                .bind(&template.content)
                .bind(template.is_active)
                .bind(template.is_mandatory)
                .bind(template.created_at)
                .bind(template.updated_at)
                .execute(&pool)
                .await
            })
            .await?;

        tracing::debug!(template_id = %id, "Template upserted to PostgreSQL");
        Ok(())
    }

    async fn upsert_unlocked(&self, template: &MessageTemplate) -> Result<bool, StoreError> {
        let template = template.clone();
        let id = template.id.clone();

        let result = self
            .pool
            .execute(move |pool| async move {
                sqlx::query(
                    r#"
                    INSERT INTO message_templates
                        (id, condo_id, category, title, content, is_active, is_mandatory,
                         created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    ON CONFLICT (id) DO UPDATE SET
                        title = EXCLUDED.title,
                        content = EXCLUDED.content,
                        is_active = EXCLUDED.is_active,
                        is_mandatory = COALESCE(EXCLUDED.is_mandatory, message_templates.is_mandatory),
                        updated_at = EXCLUDED.updated_at
                    WHERE NOT COALESCE(message_templates.is_mandatory, FALSE)
                    "#,
                )
                .bind(&template.id)
                .bind(&template.condo_id)
                .bind(template.category.as_str())
                .bind(&template.title)
                .bind(&template.content)
                .bind(template.is_active)
                .bind(template.is_mandatory)
                .bind(template.created_at)
                .bind(template.updated_at)
                .execute(&pool)
                .await
            })
            .await?;

        let written = result.rows_affected() > 0;
        tracing::debug!(template_id = %id, written, "Conditional template upsert");
        Ok(written)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.pool
            .execute(|pool| async move { sqlx::query("SELECT 1").execute(&pool).await })
            .await?;
        Ok(())
    }
}
