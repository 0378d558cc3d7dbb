use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the configuration accessor and the validator specs.
#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum ConfigError {
    /// A defaulted or required field has no usable value after coercion.
    #[error(
        "No config found for key \"{key}\". Did you forget to set it beforehand?{}",
        explanation_suffix(.key, .explanation.as_deref())
    )]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(kvfig::missing_or_invalid)))]
    MissingOrInvalid {
        key: String,
        explanation: Option<String>,
    },

    #[error("Unknown key '{0}' (not declared in the schema)")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(kvfig::unknown_key)))]
    UnknownKey(String),

    #[error("Key '{0}' belongs to a different schema than this configuration")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(kvfig::foreign_key)))]
    ForeignKey(String),

    #[error("Key '{0}' is declared more than once in the schema")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(kvfig::duplicate_key)))]
    DuplicateKey(String),

    #[error("Cannot encode value for '{key}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(kvfig::encode)))]
    Encode { key: String, reason: String },

    #[error("Storage error: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(kvfig::store)))]
    Store(#[from] StoreError),

    #[error("Invalid store settings: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(kvfig::settings)))]
    Settings(#[from] confique::Error),
}

impl ConfigError {
    pub(crate) fn missing(key: &str, explanation: Option<&str>) -> Self {
        ConfigError::MissingOrInvalid {
            key: key.into(),
            explanation: explanation.map(str::to_string),
        }
    }
}

fn explanation_suffix(key: &str, explanation: Option<&str>) -> String {
    match explanation {
        Some(text) => format!("\n\t{key}: {text}"),
        None => String::new(),
    }
}

/// Errors surfaced by a [`Store`](crate::Store) backend.
#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum StoreError {
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Value for '{key}' cannot be stored: {reason}")]
    Unrepresentable { key: String, reason: String },

    #[error("Storage lock poisoned: {0}")]
    Poisoned(String),

    #[error("No platform config directory available; set KVFIG_DIR or call .directory() on the builder")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_names_the_key() {
        let err = ConfigError::missing("flag", None);
        let msg = err.to_string();
        assert_eq!(
            msg,
            "No config found for key \"flag\". Did you forget to set it beforehand?"
        );
    }

    #[test]
    fn missing_appends_explanation() {
        let err = ConfigError::missing("token", Some("API token used for uploads"));
        let msg = err.to_string();
        assert!(msg.contains("\"token\""));
        assert!(msg.ends_with("\n\ttoken: API token used for uploads"));
    }

    #[test]
    fn unknown_key_formats() {
        let err = ConfigError::UnknownKey("typo".into());
        assert!(err.to_string().contains("typo"));
    }

    #[test]
    fn store_error_converts() {
        let err: ConfigError = StoreError::NoConfigDir.into();
        assert!(matches!(err, ConfigError::Store(StoreError::NoConfigDir)));
        assert!(err.to_string().contains("KVFIG_DIR"));
    }

    #[test]
    fn io_error_includes_path() {
        let err = StoreError::Io {
            path: "/tmp/kvfig/app.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("app.json"));
    }
}
