//! Variable substitution engine for templates

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::variables::VariableBag;

/// `{NAME}` placeholder, names drawn from `[A-Za-z0-9_]`
pub const PLACEHOLDER_PATTERN: &str = r"\{([A-Za-z0-9_]+)\}";

lazy_static! {
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid");
}

/// Replace every `{NAME}` in `template` with its value from `variables`.
///
/// Placeholders without a value are kept verbatim. Inserted values are never
/// scanned again, so braces inside a value come out as-is.
pub fn substitute(template: &str, variables: &VariableBag) -> String {
    if template.is_empty() {
        return String::new();
    }

    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Sorted, de-duplicated placeholder names present in `template`
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = PLACEHOLDER_RE
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect();
    names.sort();
    names.dedup();
    names
}
