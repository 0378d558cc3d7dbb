//! String-keyed config operations and their result types.
//!
//! Provides the logic behind [`ConfigAction`] for callers that only have key
//! names as text (a settings screen, an admin endpoint, a CLI of their own),
//! and the `ConfigResult` enum they display.

use std::fmt;

use serde_json::Value;

use crate::accessor::Configuration;
use crate::error::ConfigError;
use crate::schema::ErasedField;
use crate::store::Store;
use crate::types::ConfigAction;

const NOT_SET: &str = "<not set>";

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// A key's parsed value and its explanation.
    KeyValue {
        key: String,
        value: Option<String>,
        doc: Vec<String>,
    },
    /// Confirmation that a value was stored.
    ValueSet { key: String, value: String },
    /// Confirmation that a value was removed.
    ValueUnset { key: String },
    /// Confirmation that a namespace was cleared.
    Reset { namespace: String },
    /// Every schema field with its parsed value.
    Listing { entries: Vec<(String, String)> },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::KeyValue { key, value, doc } => {
                for line in doc {
                    writeln!(f, "# {line}")?;
                }
                write!(f, "{key} = {}", value.as_deref().unwrap_or(NOT_SET))
            }
            ConfigResult::ValueSet { key, value } => write!(f, "Set {key} = {value}"),
            ConfigResult::ValueUnset { key } => write!(f, "Unset {key}"),
            ConfigResult::Reset { namespace } => write!(f, "Reset {namespace}"),
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
        }
    }
}

impl<St: Store> Configuration<St> {
    /// Handle a `ConfigAction` (list / get / set / unset / reset).
    pub fn handle(&self, action: &ConfigAction) -> Result<ConfigResult, ConfigError> {
        match action {
            ConfigAction::List => list_values(self),
            ConfigAction::Get { key } => get_value(self, key),
            ConfigAction::Set { key, value } => {
                self.set_raw(key, Value::String(value.clone()))?;
                Ok(ConfigResult::ValueSet {
                    key: key.clone(),
                    value: value.clone(),
                })
            }
            ConfigAction::Unset { key } => {
                self.remove(key.as_str())?;
                Ok(ConfigResult::ValueUnset { key: key.clone() })
            }
            ConfigAction::Reset => {
                self.reset()?;
                Ok(ConfigResult::Reset {
                    namespace: self.namespace().to_string(),
                })
            }
        }
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print(&self, action: &ConfigAction) -> Result<(), ConfigError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }
}

/// Get one field's parsed value by name, with its explanation as doc.
pub fn get_value<St: Store>(
    config: &Configuration<St>,
    key: &str,
) -> Result<ConfigResult, ConfigError> {
    let field = config.schema().lookup(key)?;
    let value = render_field(config, key, field)?;
    let doc = field
        .explanation()
        .map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_default();
    Ok(ConfigResult::KeyValue {
        key: key.to_string(),
        value,
        doc,
    })
}

/// List every schema field in declaration order.
pub fn list_values<St: Store>(config: &Configuration<St>) -> Result<ConfigResult, ConfigError> {
    let mut entries = Vec::with_capacity(config.schema().len());
    for (key, field) in config.schema().fields() {
        let display = render_field(config, key, field)?.unwrap_or_else(|| NOT_SET.to_string());
        entries.push((key.to_string(), display));
    }
    Ok(ConfigResult::Listing { entries })
}

/// Parse and render a field. A required field with nothing usable stored is
/// shown as unset rather than failing the whole operation.
fn render_field<St: Store>(
    config: &Configuration<St>,
    key: &str,
    field: &dyn ErasedField,
) -> Result<Option<String>, ConfigError> {
    let raw = config.raw(key)?;
    match field.render(key, raw.as_ref()) {
        Ok(value) => Ok(value),
        Err(ConfigError::MissingOrInvalid { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
