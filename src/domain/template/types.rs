//! Template types and error definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::backend::StoreError;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Invalid operator role: {0}")]
    InvalidRole(String),

    #[error("Template {0} is mandatory and can only be edited by a manager")]
    MandatoryLocked(String),

    #[error("Template storage failed: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Purpose of a notification message.
///
/// Each building holds at most one template per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// A package arrived at the front desk
    Arrival,
    /// A package was collected by the resident
    Pickup,
    /// Short ad-hoc notice
    Warning,
    /// Catch-all
    General,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Arrival,
        Category::Pickup,
        Category::Warning,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Arrival => "ARRIVAL",
            Category::Pickup => "PICKUP",
            Category::Warning => "WARNING",
            Category::General => "GENERAL",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ARRIVAL" => Ok(Category::Arrival),
            "PICKUP" => Ok(Category::Pickup),
            "WARNING" => Ok(Category::Warning),
            "GENERAL" => Ok(Category::General),
            _ => Err(TemplateError::InvalidCategory(s.to_string())),
        }
    }
}

/// Role of the operator performing a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorRole {
    Resident,
    #[default]
    Doorman,
    Manager,
    Admin,
}

impl OperatorRole {
    /// Managers and admins may edit mandatory templates
    pub fn is_elevated(&self) -> bool {
        matches!(self, OperatorRole::Manager | OperatorRole::Admin)
    }
}

impl FromStr for OperatorRole {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RESIDENT" => Ok(OperatorRole::Resident),
            "DOORMAN" => Ok(OperatorRole::Doorman),
            "MANAGER" => Ok(OperatorRole::Manager),
            "ADMIN" => Ok(OperatorRole::Admin),
            _ => Err(TemplateError::InvalidRole(s.to_string())),
        }
    }
}

/// Storage id of the template for a building and category.
pub fn template_id(condo_id: &str, category: Category) -> String {
    format!("{}_{}", condo_id, category.as_str())
}

/// An operator-editable notification template scoped to one building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplate {
    /// `{condo_id}_{CATEGORY}`
    pub id: String,

    /// Owning building
    pub condo_id: String,

    pub category: Category,

    /// Operator's own label, never shown to recipients
    pub title: String,

    /// Body with `{NAME}` placeholders
    pub content: String,

    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mandatory: Option<bool>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl MessageTemplate {
    pub fn is_locked(&self) -> bool {
        self.is_mandatory.unwrap_or(false)
    }
}

/// Request to create or overwrite the template of a category.
///
/// Fields left out are merged from the stored template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTemplateRequest {
    pub condo_id: String,

    pub category: Category,

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

impl SaveTemplateRequest {
    pub fn new(
        condo_id: impl Into<String>,
        category: Category,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            condo_id: condo_id.into(),
            category,
            title: title.into(),
            content: content.into(),
            is_active: true,
            is_mandatory: None,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.is_mandatory = Some(mandatory);
        self
    }

    /// Build the record to persist, keeping creation time and the
    /// mandatory flag of `existing` when present.
    pub fn merge_into(self, existing: Option<&MessageTemplate>) -> MessageTemplate {
        let now = Utc::now();
        let id = template_id(&self.condo_id, self.category);
        let created_at = existing.map(|t| t.created_at).unwrap_or(now);
        let is_mandatory = self
            .is_mandatory
            .or_else(|| existing.and_then(|t| t.is_mandatory));

        MessageTemplate {
            id,
            condo_id: self.condo_id,
            category: self.category,
            title: self.title,
            content: self.content,
            is_active: self.is_active,
            is_mandatory,
            created_at,
            updated_at: now,
        }
    }
}

/// Where the text of a rendered message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    /// Stored, active template of the building
    Custom,
    /// Built-in default of the category
    Default,
    /// Generic text for an unrecognised category
    Fallback,
}

impl MessageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSource::Custom => "custom",
            MessageSource::Default => "default",
            MessageSource::Fallback => "fallback",
        }
    }
}

/// A finished message plus how it was produced
#[derive(Debug, Clone, Serialize)]
pub struct RenderedMessage {
    pub message: String,
    pub source: MessageSource,
    /// Placeholders still present after substitution
    pub unresolved: Vec<String>,
}
