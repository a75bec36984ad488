//! Backend trait for template storage.
//!
//! The resolution service only talks to this trait, so the in-memory and
//! PostgreSQL implementations are interchangeable.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{Category, MessageTemplate};

/// Errors that can occur during template backend operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A stored row could not be mapped back to a template
    #[error("Corrupt template record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// Backend is temporarily unavailable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for message templates.
///
/// Templates are keyed by `{condo_id}_{CATEGORY}`, so `upsert` replaces
/// the previous template of the same building and category.
#[async_trait]
pub trait TemplateBackend: Send + Sync {
    /// Backend type identifier
    fn backend_type(&self) -> &'static str;

    /// All templates of a building, active or not
    async fn list_for_condo(&self, condo_id: &str) -> Result<Vec<MessageTemplate>, StoreError>;

    /// The template of a building and category, if one was saved
    async fn get(
        &self,
        condo_id: &str,
        category: Category,
    ) -> Result<Option<MessageTemplate>, StoreError>;

    /// Create or overwrite a template. Last write wins.
    async fn upsert(&self, template: &MessageTemplate) -> Result<(), StoreError>;

    /// Like `upsert`, but leaves a stored mandatory template untouched.
    ///
    /// The lock check and the write happen atomically. Returns `false` when
    /// the stored template is locked and nothing was written.
    async fn upsert_unlocked(&self, template: &MessageTemplate) -> Result<bool, StoreError>;

    /// Check the backend can serve requests
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
