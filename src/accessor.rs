//! The typed configuration accessor.
//!
//! [`Configuration`] wraps a [`Schema`] and a [`Store`]. Reads go through the
//! field's spec on every call; there is no caching, so a value written by
//! another accessor on the same namespace is visible on the next `get`.
//! Writes are unvalidated: coercion and defaults apply when reading.

use std::fmt;

use serde_json::Value;

use crate::error::ConfigError;
use crate::kind::Kind;
use crate::schema::{FieldName, Key, Schema};
use crate::spec::{Policy, ValidatorSpec};
use crate::store::Store;

/// Typed value of a field's kind, as accepted by `set`.
pub type ValueOf<S> = <<S as ValidatorSpec>::Kind as Kind>::Value;

/// A typed accessor over one namespace of a store.
pub struct Configuration<St: Store = Box<dyn Store>> {
    schema: Schema,
    store: St,
}

impl<St: Store> Configuration<St> {
    /// Wrap `store` with `schema`.
    pub fn new(schema: Schema, store: St) -> Self {
        Self { schema, store }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn namespace(&self) -> &str {
        self.store.namespace()
    }

    /// Read a field through its spec.
    ///
    /// Optional fields yield `Option<T>` and never fail validation; defaulted
    /// fields fall back to their default; required fields fail with
    /// [`ConfigError::MissingOrInvalid`] when nothing valid is stored.
    pub fn get<S: ValidatorSpec>(&self, key: &Key<S>) -> Result<S::Output, ConfigError> {
        self.ensure_declared(key)?;
        let raw = self.load(key.name())?;
        let field = key.spec().field_spec();
        if let Some(value) = &raw
            && field.declaration().policy() != Policy::Optional
            && <S::Kind as Kind>::coerce(value).is_none()
        {
            tracing::warn!(
                namespace = self.namespace(),
                key = key.name(),
                kind = <S::Kind as Kind>::NAME,
                "stored value is not usable"
            );
        }
        key.spec().parse(key.name(), raw.as_ref())
    }

    /// Write a field. The value is encoded for storage but not validated.
    pub fn set<S: ValidatorSpec>(&self, key: &Key<S>, value: ValueOf<S>) -> Result<(), ConfigError> {
        self.ensure_declared(key)?;
        let raw = <S::Kind as Kind>::encode(&value).map_err(|reason| ConfigError::Encode {
            key: key.name().to_string(),
            reason,
        })?;
        tracing::debug!(namespace = self.namespace(), key = key.name(), "set");
        self.store.set(key.name(), raw)?;
        Ok(())
    }

    /// Read a field, run `op` on it, store and return the result.
    ///
    /// ```ignore
    /// let total = config.pipe(&count, |v| v.unwrap_or(0.0) + 8.0)?;
    /// ```
    pub fn pipe<S, F>(&self, key: &Key<S>, op: F) -> Result<ValueOf<S>, ConfigError>
    where
        S: ValidatorSpec,
        F: FnOnce(S::Output) -> ValueOf<S>,
    {
        self.pipe_all(key, op, std::iter::empty::<fn(ValueOf<S>) -> ValueOf<S>>())
    }

    /// Like [`pipe`](Self::pipe), then feed the result through each of `rest`
    /// left to right. Only the final value is stored.
    ///
    /// ```ignore
    /// let clamp = |v: f64| v.clamp(0.0, 10.0);
    /// let double = |v: f64| v * 2.0;
    /// let value = config.pipe_all(&count, |v| v.unwrap_or(1.0), [
    ///     Box::new(double) as Box<dyn FnOnce(f64) -> f64>,
    ///     Box::new(clamp),
    /// ])?;
    /// ```
    pub fn pipe_all<S, F, I>(&self, key: &Key<S>, first: F, rest: I) -> Result<ValueOf<S>, ConfigError>
    where
        S: ValidatorSpec,
        F: FnOnce(S::Output) -> ValueOf<S>,
        I: IntoIterator,
        I::Item: FnOnce(ValueOf<S>) -> ValueOf<S>,
    {
        let current = self.get(key)?;
        let value = rest.into_iter().fold(first(current), |v, op| op(v));
        self.set(key, value.clone())?;
        Ok(value)
    }

    /// Whether the store holds a value for a declared field.
    pub fn has<K: FieldName + ?Sized>(&self, key: &K) -> Result<bool, ConfigError> {
        self.ensure_declared(key)?;
        Ok(self.store.has(key.field_name())?)
    }

    /// Remove a declared field's stored value. Other keys are untouched.
    pub fn remove<K: FieldName + ?Sized>(&self, key: &K) -> Result<(), ConfigError> {
        self.ensure_declared(key)?;
        let name = key.field_name();
        tracing::debug!(namespace = self.namespace(), key = name, "remove");
        Ok(self.store.remove(name)?)
    }

    /// Erase the whole namespace, including keys the schema doesn't declare.
    pub fn reset(&self) -> Result<(), ConfigError> {
        tracing::debug!(namespace = self.namespace(), "reset");
        Ok(self.store.clear()?)
    }

    /// Field names declared by the schema, in declaration order. This is not
    /// the set of keys currently stored.
    pub fn keys(&self) -> Vec<&str> {
        self.schema.keys()
    }

    /// A typed view of one field.
    pub fn field<'a, S: ValidatorSpec>(&'a self, key: &'a Key<S>) -> Field<'a, St, S> {
        Field { config: self, key }
    }

    /// Raw stored value of a declared field, `None` when absent.
    pub(crate) fn raw(&self, name: &str) -> Result<Option<Value>, ConfigError> {
        self.ensure_declared(name)?;
        self.load(name)
    }

    fn load(&self, name: &str) -> Result<Option<Value>, ConfigError> {
        if !self.store.has(name)? {
            tracing::trace!(namespace = self.namespace(), key = name, "no stored value");
            return Ok(None);
        }
        Ok(self.store.get(name)?)
    }

    pub(crate) fn set_raw(&self, name: &str, value: Value) -> Result<(), ConfigError> {
        self.ensure_declared(name)?;
        tracing::debug!(namespace = self.namespace(), key = name, "set raw");
        Ok(self.store.set(name, value)?)
    }

    /// Fails with `UnknownKey` for names outside the schema and `ForeignKey`
    /// for a key issued by another schema under a declared name.
    fn ensure_declared<K: FieldName + ?Sized>(&self, key: &K) -> Result<(), ConfigError> {
        let name = key.field_name();
        if key.declared_in(&self.schema) {
            Ok(())
        } else if self.schema.contains(name) {
            Err(ConfigError::ForeignKey(name.to_string()))
        } else {
            Err(ConfigError::UnknownKey(name.to_string()))
        }
    }
}

impl<St: Store> fmt::Debug for Configuration<St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("namespace", &self.namespace())
            .field("schema", &self.schema)
            .finish()
    }
}

/// One field of a [`Configuration`], with the field's types fixed.
///
/// `config.field(&count).get()` is `config.get(&count)`; the view just saves
/// repeating the key.
pub struct Field<'a, St: Store, S: ValidatorSpec> {
    config: &'a Configuration<St>,
    key: &'a Key<S>,
}

impl<St: Store, S: ValidatorSpec> Field<'_, St, S> {
    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn get(&self) -> Result<S::Output, ConfigError> {
        self.config.get(self.key)
    }

    pub fn set(&self, value: ValueOf<S>) -> Result<(), ConfigError> {
        self.config.set(self.key, value)
    }

    pub fn pipe<F>(&self, op: F) -> Result<ValueOf<S>, ConfigError>
    where
        F: FnOnce(S::Output) -> ValueOf<S>,
    {
        self.config.pipe(self.key, op)
    }

    pub fn has(&self) -> Result<bool, ConfigError> {
        self.config.has(self.key)
    }

    pub fn remove(&self) -> Result<(), ConfigError> {
        self.config.remove(self.key)
    }
}
