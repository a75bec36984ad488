//! Template configuration and message resolution endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::server::middleware::CallerRole;
use crate::server::AppState;
use crate::template::{
    Category, MessageTemplate, RenderedMessage, SaveTemplateRequest, TemplateService, VariableBag,
};

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub condo_id: String,
    pub templates: Vec<MessageTemplate>,
    pub total: usize,
}

/// Body of a template save; building and category come from the path
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTemplateBody {
    pub title: String,
    pub content: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_mandatory: Option<bool>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveMessageBody {
    #[serde(default)]
    pub variables: VariableBag,
}

#[derive(Debug, Serialize)]
pub struct VariablesResponse {
    pub category: Category,
    pub variables: &'static [&'static str],
    pub default_template: &'static str,
}

/// GET /api/v1/condos/{condo_id}/templates - List a building's templates
#[tracing::instrument(name = "http.list_templates", skip(state))]
pub async fn list_templates(
    State(state): State<AppState>,
    Path(condo_id): Path<String>,
) -> Result<Json<TemplateListResponse>, AppError> {
    let templates = state.templates.templates_for(&condo_id).await?;
    let total = templates.len();

    Ok(Json(TemplateListResponse {
        condo_id,
        templates,
        total,
    }))
}

/// PUT /api/v1/condos/{condo_id}/templates/{category} - Create or overwrite a template
#[tracing::instrument(name = "http.save_template", skip(state, body))]
pub async fn save_template(
    State(state): State<AppState>,
    Path((condo_id, category)): Path<(String, String)>,
    CallerRole(role): CallerRole,
    Json(body): Json<SaveTemplateBody>,
) -> Result<Json<MessageTemplate>, AppError> {
    let category = category.parse::<Category>()?;

    let request = SaveTemplateRequest {
        condo_id,
        category,
        title: body.title,
        content: body.content,
        is_active: body.is_active,
        is_mandatory: body.is_mandatory,
    };

    let saved = state.templates.save(request, role).await?;
    Ok(Json(saved))
}

/// POST /api/v1/condos/{condo_id}/messages/{category} - Render a message
///
/// Never fails on template problems: unknown categories and store outages
/// produce fallback text. A request without a JSON body renders with no
/// variables.
#[tracing::instrument(name = "http.resolve_message", skip(state, body))]
pub async fn resolve_message(
    State(state): State<AppState>,
    Path((condo_id, category)): Path<(String, String)>,
    body: Option<Json<ResolveMessageBody>>,
) -> Json<RenderedMessage> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let rendered = state
        .templates
        .preview_raw(&condo_id, &category, &body.variables)
        .await;
    Json(rendered)
}

/// GET /api/v1/categories/{category}/variables - Quick-insert placeholder names
pub async fn list_variables(
    Path(category): Path<String>,
) -> Result<Json<VariablesResponse>, AppError> {
    let category = category.parse::<Category>()?;

    Ok(Json(VariablesResponse {
        category,
        variables: TemplateService::list_available_variables(category),
        default_template: TemplateService::default_template(category),
    }))
}
