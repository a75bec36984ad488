//! In-memory template backend using DashMap.
//!
//! Templates are lost on service restart; used for development and tests.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::backend::{StoreError, TemplateBackend};
use super::types::{template_id, Category, MessageTemplate};

/// In-memory template backend keyed by template id.
pub struct MemoryTemplateBackend {
    templates: DashMap<String, MessageTemplate>,
}

impl Default for MemoryTemplateBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTemplateBackend {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    /// Number of stored templates across all buildings
    pub fn count(&self) -> usize {
        self.templates.len()
    }
}

#[async_trait]
impl TemplateBackend for MemoryTemplateBackend {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn list_for_condo(&self, condo_id: &str) -> Result<Vec<MessageTemplate>, StoreError> {
        let mut templates: Vec<MessageTemplate> = self
            .templates
            .iter()
            .filter(|entry| entry.value().condo_id == condo_id)
            .map(|entry| entry.value().clone())
            .collect();
        templates.sort_by(|a, b| a.category.as_str().cmp(b.category.as_str()));
        Ok(templates)
    }

    async fn get(
        &self,
        condo_id: &str,
        category: Category,
    ) -> Result<Option<MessageTemplate>, StoreError> {
        Ok(self
            .templates
            .get(&template_id(condo_id, category))
            .map(|t| t.clone()))
    }

    async fn upsert(&self, template: &MessageTemplate) -> Result<(), StoreError> {
        self.templates.insert(template.id.clone(), template.clone());

        tracing::trace!(
            template_id = %template.id,
            condo_id = %template.condo_id,
            "Template stored in memory"
        );

        Ok(())
    }

    async fn upsert_unlocked(&self, template: &MessageTemplate) -> Result<bool, StoreError> {
        // The entry holds the shard lock across check and write
        match self.templates.entry(template.id.clone()) {
            Entry::Occupied(entry) if entry.get().is_locked() => return Ok(false),
            Entry::Occupied(mut entry) => {
                entry.insert(template.clone());
            }
            Entry::Vacant(entry) => {
                entry.insert(template.clone());
            }
        }

        tracing::trace!(template_id = %template.id, "Template stored in memory");
        Ok(true)
    }
}
