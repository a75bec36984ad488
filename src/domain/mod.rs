//! Domain layer modules
//!
//! - `template`: Per-building notification templates and their resolution

pub mod template;
