//! File storage backend: one document per namespace.
//!
//! Each namespace maps to `{dir}/{namespace}.{ext}`, with the namespace
//! percent-encoded so any string is a safe file name. The directory defaults
//! to the platform config directory for `kvfig` (e.g. `~/.config/kvfig/` on
//! Linux).
//!
//! Nothing is cached: every read loads the file, and every write reads,
//! patches and rewrites it. A missing file is an empty namespace. Parent
//! directories are created on the first write. Two processes writing the same
//! namespace race with last-writer-wins semantics.

use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::persist;
use crate::store::{Store, validate_namespace};
use crate::types::FileFormat;

/// Characters left as-is in namespace file names.
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Platform config directory used when no directory is configured.
pub fn default_dir() -> Result<PathBuf, StoreError> {
    let proj = directories::ProjectDirs::from("", "", "kvfig").ok_or(StoreError::NoConfigDir)?;
    Ok(proj.config_dir().to_path_buf())
}

/// File name for a namespace: percent-encoded, plus the format's extension.
pub fn namespace_file_name(namespace: &str, format: FileFormat) -> String {
    let mut encoded = utf8_percent_encode(namespace, FILE_NAME).to_string();
    // "." and ".." would escape into the directory itself.
    if encoded.chars().all(|c| c == '.') {
        encoded = encoded.replace('.', "%2E");
    }
    format!("{encoded}.{}", format.extension())
}

/// A namespace stored in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    namespace: String,
    path: PathBuf,
    format: FileFormat,
}

impl FileStore {
    /// Bind a store to `namespace` inside `dir`.
    pub fn open(dir: &Path, namespace: &str, format: FileFormat) -> Result<Self, StoreError> {
        validate_namespace(namespace)?;
        let path = dir.join(namespace_file_name(namespace, format));
        tracing::debug!(namespace, path = %path.display(), "opened file store");
        Ok(Self {
            namespace: namespace.to_string(),
            path,
            format,
        })
    }

    /// Bind a store to `namespace` in the platform config directory.
    pub fn open_default(namespace: &str, format: FileFormat) -> Result<Self, StoreError> {
        Self::open(&default_dir()?, namespace, format)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    fn read_content(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let content = self.read_content()?;
        persist::read_document(self.format, content.as_deref(), &self.path)
    }

    fn write_content(&self, content: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&self.path, content).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl Store for FileStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.load()?.contains_key(key))
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let content = self.read_content()?;
        let updated =
            persist::set_in_document(self.format, content.as_deref(), key, &value, &self.path)?;
        self.write_content(&updated)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let Some(content) = self.read_content()? else {
            return Ok(());
        };
        let updated = persist::remove_from_document(self.format, Some(&content), key, &self.path)?;
        self.write_content(&updated)
    }

    fn clear(&self) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.write_content(&persist::empty_document(self.format))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self.load()?.into_iter().map(|(k, _)| k).collect();
        keys.sort();
        Ok(keys)
    }
}
