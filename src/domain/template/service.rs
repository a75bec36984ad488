//! Template resolution service.
//!
//! Picks the text for a building and category (stored active template, else
//! the built-in default), then runs substitution over it. Storage failures
//! never reach the caller of `resolve`: they are logged and the default is
//! used, so a notification is always produced.

use std::borrow::Cow;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::metrics::TemplateMetrics;

use super::backend::TemplateBackend;
use super::defaults::{available_variables, default_template, GENERIC_FALLBACK};
use super::substitution::{extract_placeholders, substitute};
use super::types::{
    Category, MessageSource, MessageTemplate, OperatorRole, RenderedMessage, SaveTemplateRequest,
    TemplateError, TemplateResult,
};
use super::variables::VariableBag;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

pub struct TemplateService {
    backend: Arc<dyn TemplateBackend>,
    updates: broadcast::Sender<MessageTemplate>,
}

impl TemplateService {
    pub fn new(backend: Arc<dyn TemplateBackend>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self { backend, updates }
    }

    pub fn backend(&self) -> &Arc<dyn TemplateBackend> {
        &self.backend
    }

    /// Receive every template saved from now on.
    ///
    /// Lets open previews refresh without polling the store.
    pub fn subscribe(&self) -> broadcast::Receiver<MessageTemplate> {
        self.updates.subscribe()
    }

    /// Finished message text for a building and category.
    pub async fn resolve(
        &self,
        condo_id: &str,
        category: Category,
        variables: &VariableBag,
    ) -> String {
        self.preview(condo_id, category, variables).await.message
    }

    /// Like [`resolve`](Self::resolve) for an untyped category name.
    ///
    /// Unknown names produce the generic fallback text.
    pub async fn resolve_raw(
        &self,
        condo_id: &str,
        category: &str,
        variables: &VariableBag,
    ) -> String {
        self.preview_raw(condo_id, category, variables).await.message
    }

    /// Resolve and report where the text came from and what stayed unresolved.
    #[tracing::instrument(name = "template.resolve", skip(self, variables))]
    pub async fn preview(
        &self,
        condo_id: &str,
        category: Category,
        variables: &VariableBag,
    ) -> RenderedMessage {
        let (text, source) = self.select_text(condo_id, category).await;
        TemplateMetrics::record_resolution(category.as_str(), source.as_str());
        render(&text, source, variables)
    }

    pub async fn preview_raw(
        &self,
        condo_id: &str,
        category: &str,
        variables: &VariableBag,
    ) -> RenderedMessage {
        match category.parse::<Category>() {
            Ok(category) => self.preview(condo_id, category, variables).await,
            Err(_) => {
                tracing::warn!(
                    condo_id = %condo_id,
                    category = %category,
                    "Unknown message category, using generic fallback"
                );
                TemplateMetrics::record_resolution("unknown", MessageSource::Fallback.as_str());
                render(GENERIC_FALLBACK, MessageSource::Fallback, variables)
            }
        }
    }

    async fn select_text(&self, condo_id: &str, category: Category) -> (Cow<'static, str>, MessageSource) {
        match self.backend.get(condo_id, category).await {
            Ok(Some(template)) if template.category == category && template.is_active => {
                (Cow::Owned(template.content), MessageSource::Custom)
            }
            Ok(_) => (Cow::Borrowed(default_template(category)), MessageSource::Default),
            Err(e) => {
                TemplateMetrics::record_lookup_failure(self.backend.backend_type());
                tracing::warn!(
                    condo_id = %condo_id,
                    category = %category,
                    error = %e,
                    "Template lookup failed, using default"
                );
                (Cow::Borrowed(default_template(category)), MessageSource::Default)
            }
        }
    }

    /// Create or overwrite the template of a building and category.
    ///
    /// A stored template flagged mandatory can only be changed by an elevated
    /// role. Only elevated roles may change the mandatory flag itself; the
    /// value sent by anyone else is ignored.
    #[tracing::instrument(
        name = "template.save",
        skip(self, request),
        fields(condo_id = %request.condo_id, category = %request.category)
    )]
    pub async fn save(
        &self,
        mut request: SaveTemplateRequest,
        role: OperatorRole,
    ) -> TemplateResult<MessageTemplate> {
        let existing = self.backend.get(&request.condo_id, request.category).await?;

        if let Some(current) = &existing {
            if current.is_locked() && !role.is_elevated() {
                return Err(reject_locked(&current.id, role));
            }
        }

        if !role.is_elevated() && request.is_mandatory.is_some() {
            tracing::debug!(role = ?role, "Ignoring mandatory flag from non-elevated operator");
            request.is_mandatory = None;
        }

        let template = request.merge_into(existing.as_ref());
        if role.is_elevated() {
            self.backend.upsert(&template).await?;
        } else if !self.backend.upsert_unlocked(&template).await? {
            // Locked between the read above and the write
            return Err(reject_locked(&template.id, role));
        }

        TemplateMetrics::record_save(template.category.as_str());
        tracing::info!(
            template_id = %template.id,
            is_active = template.is_active,
            created = existing.is_none(),
            "Template saved"
        );

        // No subscribers is fine
        let _ = self.updates.send(template.clone());

        Ok(template)
    }

    /// All stored templates of a building
    pub async fn templates_for(&self, condo_id: &str) -> TemplateResult<Vec<MessageTemplate>> {
        Ok(self.backend.list_for_condo(condo_id).await?)
    }

    /// Placeholder names the configuration UI offers for a category
    pub fn list_available_variables(category: Category) -> &'static [&'static str] {
        available_variables(category)
    }

    /// Built-in text of a category
    pub fn default_template(category: Category) -> &'static str {
        default_template(category)
    }
}

fn render(text: &str, source: MessageSource, variables: &VariableBag) -> RenderedMessage {
    let message = substitute(text, variables);
    let unresolved = extract_placeholders(&message);
    RenderedMessage {
        message,
        source,
        unresolved,
    }
}

fn reject_locked(template_id: &str, role: OperatorRole) -> TemplateError {
    TemplateMetrics::record_save_rejected();
    tracing::warn!(template_id = %template_id, role = ?role, "Rejected edit of mandatory template");
    TemplateError::MandatoryLocked(template_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::backend::StoreError;
    use crate::domain::template::memory_backend::MemoryTemplateBackend;
    use async_trait::async_trait;

    struct FailingBackend;

    #[async_trait]
    impl TemplateBackend for FailingBackend {
        fn backend_type(&self) -> &'static str {
            "failing"
        }

        async fn list_for_condo(&self, _: &str) -> Result<Vec<MessageTemplate>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn get(&self, _: &str, _: Category) -> Result<Option<MessageTemplate>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn upsert(&self, _: &MessageTemplate) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn upsert_unlocked(&self, _: &MessageTemplate) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
    }

    /// Reads miss every stored template, as if a lock landed after the read
    struct StaleReadBackend {
        inner: MemoryTemplateBackend,
    }

    #[async_trait]
    impl TemplateBackend for StaleReadBackend {
        fn backend_type(&self) -> &'static str {
            "stale"
        }

        async fn list_for_condo(&self, condo_id: &str) -> Result<Vec<MessageTemplate>, StoreError> {
            self.inner.list_for_condo(condo_id).await
        }

        async fn get(&self, _: &str, _: Category) -> Result<Option<MessageTemplate>, StoreError> {
            Ok(None)
        }

        async fn upsert(&self, template: &MessageTemplate) -> Result<(), StoreError> {
            self.inner.upsert(template).await
        }

        async fn upsert_unlocked(&self, template: &MessageTemplate) -> Result<bool, StoreError> {
            self.inner.upsert_unlocked(template).await
        }
    }

    fn service() -> TemplateService {
        TemplateService::new(Arc::new(MemoryTemplateBackend::new()))
    }

    fn vars() -> VariableBag {
        VariableBag::new()
            .resident("Ana")
            .unit("101")
            .block("A")
            .protocol("123456")
            .set("DATA_HORA", "01/01/2025 10:00")
    }

    #[tokio::test]
    async fn test_default_when_no_templates() {
        let svc = service();
        let message = svc.resolve("condo-1", Category::Arrival, &vars()).await;

        assert!(!message.is_empty());
        assert_eq!(message, substitute(default_template(Category::Arrival), &vars()));
        assert!(message.contains("Ana"));
        assert!(message.contains("123456"));
    }

    #[tokio::test]
    async fn test_custom_template_is_used() {
        let svc = service();
        svc.save(
            SaveTemplateRequest::new(
                "condo-1",
                Category::Arrival,
                "Chegada",
                "Protocol: {PROTOCOLO}, Arrived {DATA_HORA}",
            ),
            OperatorRole::Doorman,
        )
        .await
        .unwrap();

        let rendered = svc.preview("condo-1", Category::Arrival, &vars()).await;
        assert_eq!(rendered.message, "Protocol: 123456, Arrived 01/01/2025 10:00");
        assert_eq!(rendered.source, MessageSource::Custom);
        assert!(rendered.unresolved.is_empty());
    }

    #[tokio::test]
    async fn test_inactive_template_is_ignored() {
        let svc = service();
        svc.save(
            SaveTemplateRequest::new("condo-1", Category::Pickup, "Off", "custom pickup").inactive(),
            OperatorRole::Manager,
        )
        .await
        .unwrap();

        let rendered = svc.preview("condo-1", Category::Pickup, &vars()).await;
        assert_eq!(rendered.source, MessageSource::Default);
        assert_eq!(
            rendered.message,
            substitute(default_template(Category::Pickup), &vars())
        );
    }

    #[tokio::test]
    async fn test_categories_are_isolated() {
        let svc = service();
        svc.save(
            SaveTemplateRequest::new("condo-1", Category::Arrival, "A", "arrival only"),
            OperatorRole::Doorman,
        )
        .await
        .unwrap();

        let pickup = svc.resolve("condo-1", Category::Pickup, &vars()).await;
        assert_ne!(pickup, "arrival only");

        let other_condo = svc.resolve("condo-2", Category::Arrival, &vars()).await;
        assert_ne!(other_condo, "arrival only");
    }

    #[tokio::test]
    async fn test_unknown_category_uses_generic_fallback() {
        let svc = service();
        let rendered = svc
            .preview_raw("condo-1", "NOT_A_CATEGORY", &VariableBag::new())
            .await;

        assert_eq!(rendered.message, GENERIC_FALLBACK);
        assert_eq!(rendered.source, MessageSource::Fallback);
        assert_eq!(rendered.unresolved, vec!["MORADOR".to_string()]);

        let resolved = svc.resolve_raw("condo-1", "pickup", &vars()).await;
        assert_eq!(resolved, svc.resolve("condo-1", Category::Pickup, &vars()).await);
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_to_default() {
        let svc = TemplateService::new(Arc::new(FailingBackend));
        let rendered = svc.preview("condo-1", Category::Warning, &vars()).await;

        assert_eq!(rendered.source, MessageSource::Default);
        assert_eq!(
            rendered.message,
            substitute(default_template(Category::Warning), &vars())
        );
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let svc = TemplateService::new(Arc::new(FailingBackend));
        let result = svc
            .save(
                SaveTemplateRequest::new("condo-1", Category::General, "t", "c"),
                OperatorRole::Admin,
            )
            .await;
        assert!(matches!(result, Err(TemplateError::Storage(_))));
    }

    #[tokio::test]
    async fn test_mandatory_template_locked_for_doorman() {
        let svc = service();
        svc.save(
            SaveTemplateRequest::new("condo-1", Category::Arrival, "Oficial", "official").mandatory(true),
            OperatorRole::Admin,
        )
        .await
        .unwrap();

        let result = svc
            .save(
                SaveTemplateRequest::new("condo-1", Category::Arrival, "Mine", "mine"),
                OperatorRole::Doorman,
            )
            .await;
        assert!(matches!(result, Err(TemplateError::MandatoryLocked(_))));

        let updated = svc
            .save(
                SaveTemplateRequest::new("condo-1", Category::Arrival, "Oficial v2", "official v2"),
                OperatorRole::Manager,
            )
            .await
            .unwrap();
        assert_eq!(updated.content, "official v2");
        assert_eq!(updated.is_mandatory, Some(true));
    }

    #[tokio::test]
    async fn test_doorman_cannot_set_mandatory() {
        let svc = service();
        let saved = svc
            .save(
                SaveTemplateRequest::new("condo-1", Category::Warning, "t", "c").mandatory(true),
                OperatorRole::Doorman,
            )
            .await
            .unwrap();
        assert_eq!(saved.is_mandatory, None);
    }

    #[tokio::test]
    async fn test_save_merges_and_keeps_created_at() {
        let svc = service();
        let first = svc
            .save(
                SaveTemplateRequest::new("condo-1", Category::General, "v1", "one"),
                OperatorRole::Doorman,
            )
            .await
            .unwrap();
        let second = svc
            .save(
                SaveTemplateRequest::new("condo-1", Category::General, "v2", "two"),
                OperatorRole::Doorman,
            )
            .await
            .unwrap();

        assert_eq!(first.id, "condo-1_GENERAL");
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);

        let listed = svc.templates_for("condo-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "v2");
    }

    #[tokio::test]
    async fn test_subscribers_receive_saved_templates() {
        let svc = service();
        let mut updates = svc.subscribe();

        svc.save(
            SaveTemplateRequest::new("condo-9", Category::Pickup, "t", "picked up"),
            OperatorRole::Doorman,
        )
        .await
        .unwrap();

        let received = updates.recv().await.unwrap();
        assert_eq!(received.id, "condo-9_PICKUP");
        assert_eq!(received.content, "picked up");
    }

    #[test]
    fn test_list_available_variables() {
        let vars = TemplateService::list_available_variables(Category::Pickup);
        assert!(vars.contains(&"RETIRADO_POR"));
        assert_eq!(
            TemplateService::default_template(Category::General),
            default_template(Category::General)
        );
    }

    #[tokio::test]
    async fn test_lock_set_after_read_still_blocks_doorman() {
        let inner = MemoryTemplateBackend::new();
        let official = SaveTemplateRequest::new("condo-1", Category::Pickup, "Oficial", "official")
            .mandatory(true)
            .merge_into(None);
        inner.upsert(&official).await.unwrap();

        let svc = TemplateService::new(Arc::new(StaleReadBackend { inner }));
        let result = svc
            .save(
                SaveTemplateRequest::new("condo-1", Category::Pickup, "Meu", "mine"),
                OperatorRole::Doorman,
            )
            .await;
        assert!(matches!(result, Err(TemplateError::MandatoryLocked(id)) if id == "condo-1_PICKUP"));

        let stored = svc.templates_for("condo-1").await.unwrap();
        assert_eq!(stored[0].content, "official");
    }
}
