//! Namespace file encoding: read and patch JSON or TOML documents.
//!
//! The functions here are pure: they take the current file content (`None`
//! when the file doesn't exist yet) and return the new content. I/O lives in
//! [`file`](crate::file).
//!
//! TOML documents are patched with `toml_edit`, so comments and formatting a
//! user adds by hand survive `set` and `remove`. JSON documents are rewritten
//! pretty-printed.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::types::FileFormat;

/// Parse a namespace document into its key/value map. Empty or missing
/// content is an empty namespace.
pub fn read_document(
    format: FileFormat,
    content: Option<&str>,
    path: &Path,
) -> Result<Map<String, Value>, StoreError> {
    let Some(content) = content.filter(|c| !c.trim().is_empty()) else {
        return Ok(Map::new());
    };

    match format {
        FileFormat::Json => {
            let value: Value = serde_json::from_str(content).map_err(|e| StoreError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            match value {
                Value::Object(map) => Ok(map),
                other => Err(StoreError::Parse {
                    path: path.to_path_buf(),
                    reason: format!("expected a JSON object at the top level, found {other}"),
                }),
            }
        }
        FileFormat::Toml => {
            let table: toml::Table = toml::from_str(content).map_err(|e| StoreError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            Ok(table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect())
        }
    }
}

/// Set `key` to `value` in a namespace document, returning the new content.
pub fn set_in_document(
    format: FileFormat,
    content: Option<&str>,
    key: &str,
    value: &Value,
    path: &Path,
) -> Result<String, StoreError> {
    match format {
        FileFormat::Json => {
            let mut map = read_document(format, content, path)?;
            map.insert(key.to_string(), value.clone());
            write_json(&map)
        }
        FileFormat::Toml => {
            let mut doc = parse_toml_document(content, path)?;
            doc[key] = toml_edit::Item::Value(json_to_toml(key, value)?);
            Ok(doc.to_string())
        }
    }
}

/// Remove `key` from a namespace document, returning the new content.
pub fn remove_from_document(
    format: FileFormat,
    content: Option<&str>,
    key: &str,
    path: &Path,
) -> Result<String, StoreError> {
    match format {
        FileFormat::Json => {
            let mut map = read_document(format, content, path)?;
            map.remove(key);
            write_json(&map)
        }
        FileFormat::Toml => {
            let mut doc = parse_toml_document(content, path)?;
            doc.remove(key);
            Ok(doc.to_string())
        }
    }
}

/// Content of a namespace with no keys.
pub fn empty_document(format: FileFormat) -> String {
    match format {
        FileFormat::Json => "{}\n".to_string(),
        FileFormat::Toml => String::new(),
    }
}

fn write_json(map: &Map<String, Value>) -> Result<String, StoreError> {
    let mut out = serde_json::to_string_pretty(map).map_err(|e| StoreError::Unrepresentable {
        key: "<document>".into(),
        reason: e.to_string(),
    })?;
    out.push('\n');
    Ok(out)
}

fn parse_toml_document(
    content: Option<&str>,
    path: &Path,
) -> Result<toml_edit::DocumentMut, StoreError> {
    content
        .unwrap_or_default()
        .parse()
        .map_err(|e: toml_edit::TomlError| StoreError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Convert a JSON value into a `toml_edit::Value`. TOML has no null.
fn json_to_toml(key: &str, value: &Value) -> Result<toml_edit::Value, StoreError> {
    let unrepresentable = |reason: &str| StoreError::Unrepresentable {
        key: key.into(),
        reason: reason.into(),
    };

    Ok(match value {
        Value::Null => return Err(unrepresentable("TOML has no null value")),
        Value::Bool(b) => toml_edit::Value::from(*b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => toml_edit::Value::from(i),
            (None, Some(f)) => toml_edit::Value::from(f),
            (None, None) => return Err(unrepresentable("number out of range")),
        },
        Value::String(s) => toml_edit::Value::from(s.as_str()),
        Value::Array(items) => {
            let mut array = toml_edit::Array::new();
            for item in items {
                array.push(json_to_toml(key, item)?);
            }
            toml_edit::Value::Array(array)
        }
        Value::Object(map) => {
            let mut table = toml_edit::InlineTable::new();
            for (k, v) in map {
                table.insert(k.as_str(), json_to_toml(key, v)?);
            }
            toml_edit::Value::InlineTable(table)
        }
    })
}

/// Convert a parsed TOML value into JSON. Datetimes become their string form.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
