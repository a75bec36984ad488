//! Notification template system.
//!
//! This module provides:
//! - Per-building message templates for the four notification categories
//! - `{NAME}` placeholder substitution
//! - Built-in default texts used when a building has no active template
//! - Storage backends (memory, PostgreSQL) behind one async trait
//!
//! # Example
//!
//! ```ignore
//! let service = TemplateService::new(Arc::new(MemoryTemplateBackend::new()));
//!
//! service
//!     .save(
//!         SaveTemplateRequest::new("condo-1", Category::Arrival, "Chegada", "Protocolo {PROTOCOLO}"),
//!         OperatorRole::Manager,
//!     )
//!     .await?;
//!
//! let variables = VariableBag::new().resident("Ana").protocol("123456");
//! let text = service.resolve("condo-1", Category::Arrival, &variables).await;
//! assert_eq!(text, "Protocolo 123456");
//! ```

mod backend;
mod defaults;
mod factory;
mod memory_backend;
mod postgres_backend;
mod service;
mod substitution;
mod types;
mod variables;

pub use backend::{StoreError, TemplateBackend};
pub use defaults::{available_variables, default_template, GENERIC_FALLBACK};
pub use factory::create_template_backend;
pub use memory_backend::MemoryTemplateBackend;
pub use postgres_backend::PostgresTemplateBackend;
pub use service::TemplateService;
pub use substitution::{extract_placeholders, substitute, PLACEHOLDER_PATTERN};
pub use types::{
    template_id, Category, MessageSource, MessageTemplate, OperatorRole, RenderedMessage,
    SaveTemplateRequest, TemplateError, TemplateResult,
};
pub use variables::{VariableBag, DATE_TIME_FORMAT};
