//! Process-local storage backend.
//!
//! Namespaces live in a [`MemoryRegistry`]: a shared map of namespace →
//! key/value map. [`MemoryRegistry::global()`] is the process-wide registry
//! used by [`Backend::LocalStorage`](crate::Backend::LocalStorage), so every
//! accessor opened on the same namespace in one process sees the same keys.
//! Independent registries can be created for tests or sandboxing.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock, RwLock};

use serde_json::Value;

use crate::error::StoreError;
use crate::store::{Store, validate_namespace};

type Namespaces = HashMap<String, BTreeMap<String, Value>>;

static GLOBAL: LazyLock<MemoryRegistry> = LazyLock::new(MemoryRegistry::new);

/// A set of isolated in-memory namespaces.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    data: Arc<RwLock<Namespaces>>,
}

impl MemoryRegistry {
    /// Create an empty registry, independent from the process-wide one.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// Bind a store to `namespace` within this registry.
    pub fn namespace(&self, namespace: &str) -> Result<MemoryStore, StoreError> {
        validate_namespace(namespace)?;
        Ok(MemoryStore {
            namespace: namespace.to_string(),
            data: Arc::clone(&self.data),
        })
    }
}

/// A namespace within a [`MemoryRegistry`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    namespace: String,
    data: Arc<RwLock<Namespaces>>,
}

impl MemoryStore {
    fn read<T>(&self, f: impl FnOnce(Option<&BTreeMap<String, Value>>) -> T) -> Result<T, StoreError> {
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(f(data.get(&self.namespace)))
    }

    fn write<T>(&self, f: impl FnOnce(&mut BTreeMap<String, Value>) -> T) -> Result<T, StoreError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(f(data.entry(self.namespace.clone()).or_default()))
    }
}

impl Store for MemoryStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        self.read(|ns| ns.is_some_and(|map| map.contains_key(key)))
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.read(|ns| ns.and_then(|map| map.get(key).cloned()))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.write(|map| {
            map.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.write(|map| {
            map.remove(key);
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        data.remove(&self.namespace);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.read(|ns| ns.map(|map| map.keys().cloned().collect()).unwrap_or_default())
    }
}
