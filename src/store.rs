//! The key-value store contract consumed by the accessor.
//!
//! A [`Store`] is bound to exactly one namespace when it is created. Two
//! stores over the same backend with different namespaces never observe each
//! other's keys; two stores with the same namespace share them.
//!
//! Values are raw JSON values. The store does no coercion of its own: what
//! comes out of [`get`](Store::get) is whatever was last [`set`](Store::set),
//! and the accessor's specs make sense of it.

use serde_json::Value;

use crate::error::StoreError;

/// Synchronous, namespaced key-value storage.
pub trait Store: Send + Sync {
    /// The namespace this store is bound to.
    fn namespace(&self) -> &str;

    fn has(&self, key: &str) -> Result<bool, StoreError>;

    /// Returns `None` if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrites any existing value.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Erase every key in the namespace.
    fn clear(&self) -> Result<(), StoreError>;

    /// Keys currently present in the namespace, sorted.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn namespace(&self) -> &str {
        (**self).namespace()
    }

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        (**self).has(key)
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}

/// Validate that a namespace can isolate a store.
///
/// Namespaces must be non-empty and must not contain the null byte.
pub(crate) fn validate_namespace(namespace: &str) -> Result<(), StoreError> {
    if namespace.is_empty() {
        return Err(StoreError::InvalidNamespace(
            "namespace must not be empty".into(),
        ));
    }
    if namespace.contains('\0') {
        return Err(StoreError::InvalidNamespace(
            "namespace must not contain null bytes".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_namespace() {
        assert!(validate_namespace("my-app").is_ok());
        assert!(validate_namespace("org/app settings").is_ok());
    }

    #[test]
    fn rejects_empty_namespace() {
        let err = validate_namespace("").unwrap_err();
        assert!(matches!(err, StoreError::InvalidNamespace(_)));
    }

    #[test]
    fn rejects_null_byte() {
        let err = validate_namespace("a\0b").unwrap_err();
        assert!(err.to_string().contains("null"));
    }
}
