use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A backend or file format name that isn't recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownVariant {
    #[error("unknown backend '{0}' (expected 'file' or 'local-storage')")]
    Backend(String),
    #[error("unknown file format '{0}' (expected 'json' or 'toml')")]
    FileFormat(String),
}

/// Which storage backend an accessor is opened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    /// One durable file per namespace. Parsed from `"file"`.
    #[serde(rename = "file")]
    File,
    /// The process-wide in-memory registry. Parsed from `"local-storage"`.
    #[serde(rename = "local-storage")]
    LocalStorage,
}

impl FromStr for Backend {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Backend::File),
            "local-storage" => Ok(Backend::LocalStorage),
            other => Err(UnknownVariant::Backend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::File => f.write_str("file"),
            Backend::LocalStorage => f.write_str("local-storage"),
        }
    }
}

/// On-disk format of the file backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Pretty-printed JSON object.
    #[default]
    Json,
    /// TOML document, edited in place so comments survive.
    Toml,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Toml => "toml",
        }
    }
}

impl FromStr for FileFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("json") {
            Ok(FileFormat::Json)
        } else if s.eq_ignore_ascii_case("toml") {
            Ok(FileFormat::Toml)
        } else {
            Err(UnknownVariant::FileFormat(s.to_string()))
        }
    }
}

/// A string-keyed config operation, independent of any CLI framework.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    List,
    Get { key: String },
    Set { key: String, value: String },
    Unset { key: String },
    Reset,
}
