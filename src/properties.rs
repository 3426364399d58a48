//! Best-effort extraction of named page properties.
//!
//! Property schemas are user-editable upstream, so any property may be
//! missing, renamed, or of a different type than expected. Every function
//! here is total: a shape mismatch at any depth yields `None` or an empty
//! string, never an error.

use serde_json::Value;

use crate::models::PropertyBag;

/// Plain text of the first run of a `title` property.
///
/// Expects `{"title": [{"plain_text": "..."}, ...]}` under `name`.
pub fn extract_title(properties: &PropertyBag, name: &str) -> Option<String> {
    properties
        .get(name)?
        .get("title")?
        .as_array()?
        .first()?
        .get("plain_text")?
        .as_str()
        .map(str::to_string)
}

/// Name of a `status` property, or `""` when absent.
///
/// Expects `{"status": {"name": "..."}}` under `name`.
pub fn extract_status(properties: &PropertyBag, name: &str) -> String {
    nested_str(properties, name, "status", "name")
}

/// ISO-8601 start of a `date` property, or `""` when absent.
///
/// The end of a date range is discarded.
pub fn extract_date(properties: &PropertyBag, name: &str) -> String {
    nested_str(properties, name, "date", "start")
}

fn nested_str(properties: &PropertyBag, name: &str, kind: &str, field: &str) -> String {
    properties
        .get(name)
        .and_then(|p| p.get(kind))
        .and_then(Value::as_object)
        .and_then(|inner| inner.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
