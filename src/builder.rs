use std::path::PathBuf;

use crate::accessor::Configuration;
use crate::error::ConfigError;
use crate::file::{self, FileStore};
use crate::memory::MemoryRegistry;
use crate::schema::Schema;
use crate::settings::StoreSettings;
use crate::store::Store;
use crate::types::{Backend, FileFormat};

/// Entry point for building a kvfig accessor.
pub struct Kvfig;

impl Kvfig {
    pub fn builder() -> KvfigBuilder {
        KvfigBuilder::new()
    }
}

/// Builder for opening a [`Configuration`] on a backend.
///
/// The file backend's directory and format come from, highest first:
/// explicit [`directory()`](Self::directory) / [`format()`](Self::format)
/// calls, then [`settings()`](Self::settings) or
/// [`settings_from_env()`](Self::settings_from_env), then the platform
/// config directory and JSON.
pub struct KvfigBuilder {
    backend: Backend,
    namespace: Option<String>,
    directory: Option<PathBuf>,
    format: Option<FileFormat>,
    settings: Option<StoreSettings>,
    env_settings: bool,
    registry: Option<MemoryRegistry>,
}

impl KvfigBuilder {
    fn new() -> Self {
        Self {
            backend: Backend::File,
            namespace: None,
            directory: None,
            format: None,
            settings: None,
            env_settings: false,
            registry: None,
        }
    }

    /// Select the backend (default: [`Backend::File`]).
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Namespace the accessor is bound to. Required.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Directory holding the file backend's namespace files.
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    /// On-disk format of the file backend.
    pub fn format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Use these settings for anything not set explicitly.
    pub fn settings(mut self, settings: StoreSettings) -> Self {
        self.settings = Some(settings);
        self.env_settings = false;
        self
    }

    /// Load settings from `KVFIG_*` environment variables when opening.
    pub fn settings_from_env(mut self) -> Self {
        self.settings = None;
        self.env_settings = true;
        self
    }

    /// Use a specific in-memory registry instead of the process-wide one.
    pub fn registry(mut self, registry: MemoryRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    fn effective_settings(&self) -> Result<StoreSettings, ConfigError> {
        if self.env_settings {
            return Ok(StoreSettings::from_env()?);
        }
        Ok(self.settings.clone().unwrap_or_default())
    }

    fn effective_directory(&self, settings: &StoreSettings) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = self.directory.as_ref().or(settings.dir.as_ref()) {
            return Ok(dir.clone());
        }
        Ok(file::default_dir()?)
    }

    fn open_store(&self) -> Result<Box<dyn Store>, ConfigError> {
        let namespace = self.namespace.as_deref().unwrap_or_default();
        let store: Box<dyn Store> = match self.backend {
            Backend::File => {
                let settings = self.effective_settings()?;
                let dir = self.effective_directory(&settings)?;
                let format = self.format.unwrap_or(settings.format);
                Box::new(FileStore::open(&dir, namespace, format)?)
            }
            Backend::LocalStorage => {
                let registry = self.registry.clone().unwrap_or_else(MemoryRegistry::global);
                Box::new(registry.namespace(namespace)?)
            }
        };
        Ok(store)
    }

    /// Open the accessor.
    pub fn open(self, schema: Schema) -> Result<Configuration, ConfigError> {
        let store = self.open_store()?;
        tracing::debug!(
            backend = %self.backend,
            namespace = store.namespace(),
            fields = schema.len(),
            "opened configuration"
        );
        Ok(Configuration::new(schema, store))
    }
}

impl Configuration {
    /// Open an accessor on `backend` with default backend settings: the
    /// process-wide registry for local storage, the platform config
    /// directory and JSON for files.
    pub fn open(backend: Backend, namespace: &str, schema: Schema) -> Result<Self, ConfigError> {
        Kvfig::builder()
            .backend(backend)
            .namespace(namespace)
            .open(schema)
    }

    /// Open an accessor on a file store in `dir`.
    pub fn file(
        dir: impl Into<PathBuf>,
        namespace: &str,
        format: FileFormat,
        schema: Schema,
    ) -> Result<Self, ConfigError> {
        Kvfig::builder()
            .namespace(namespace)
            .directory(dir)
            .format(format)
            .open(schema)
    }

    /// Open an accessor on the process-wide in-memory registry.
    pub fn local_storage(namespace: &str, schema: Schema) -> Result<Self, ConfigError> {
        Self::open(Backend::LocalStorage, namespace, schema)
    }
}
