//! Per-domain endpoint tables.
//!
//! Each submodule owns its slice of the registry plus the validators that
//! guard it. [`standard_tables`] hands every slice to
//! [`crate::domain::EndpointRegistry::assemble`], which rejects overlaps.

use serde_json::{Map, Value};

use crate::domain::{EndpointTable, ValidationError};

mod applications;
mod assignments;
mod auth;
mod categories;
mod conversations;
mod jobs;
mod profiles;

/// Every built-in table, one per business domain.
#[must_use]
pub fn standard_tables() -> Vec<EndpointTable> {
    vec![
        auth::table(),
        profiles::table(),
        categories::table(),
        jobs::table(),
        applications::table(),
        assignments::table(),
        conversations::table(),
    ]
}

/// Non-blank string field.
fn require_text<'a>(
    fields: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a str, ValidationError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ValidationError::for_field(name, format!("{name} is required")))
}

/// Numeric field that must be strictly positive when present.
fn positive_number(
    fields: &Map<String, Value>,
    name: &str,
    required: bool,
) -> Result<(), ValidationError> {
    match fields.get(name) {
        None | Some(Value::Null) if !required => Ok(()),
        Some(value) => match value.as_f64() {
            Some(number) if number > 0.0 => Ok(()),
            _ => Err(ValidationError::for_field(
                name,
                format!("{name} must be a positive number"),
            )),
        },
        None => Err(ValidationError::for_field(name, format!("{name} is required"))),
    }
}

/// Optional string field no longer than `limit` characters.
fn max_chars(
    fields: &Map<String, Value>,
    name: &str,
    limit: usize,
) -> Result<(), ValidationError> {
    match fields.get(name).and_then(Value::as_str) {
        Some(text) if text.chars().count() > limit => Err(ValidationError::for_field(
            name,
            format!("{name} must be at most {limit} characters"),
        )),
        _ => Ok(()),
    }
}
