//! Config schemas and typed field keys.
//!
//! A [`Schema`] is the fixed, ordered set of fields an accessor recognizes.
//! It is built with a [`SchemaBuilder`]; registering a field returns a typed
//! [`Key`] that carries the field's spec, so reading it yields the spec's
//! output type directly:
//!
//! ```ignore
//! let mut schema = Schema::builder();
//! let count = schema.field("count", num());                 // Key<Optional<Num>>
//! let name = schema.field("name", str().default("anon".into())); // Key<Defaulted<Str>>
//! let schema = schema.build()?;
//! ```
//!
//! Keys are cheap to clone and can be bundled in a plain struct to give a
//! settings type named fields.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ConfigError;
use crate::kind::Kind;
use crate::spec::{Policy, ValidatorSpec};

/// Anything that names a schema field: a typed [`Key`] or a plain string.
pub trait FieldName {
    fn field_name(&self) -> &str;

    /// Whether `schema` declares this field. Plain names match by name; a
    /// [`Key`] matches only the schema that issued it.
    fn declared_in(&self, schema: &Schema) -> bool {
        schema.contains(self.field_name())
    }
}

impl FieldName for str {
    fn field_name(&self) -> &str {
        self
    }
}

impl FieldName for String {
    fn field_name(&self) -> &str {
        self
    }
}

impl<S: ValidatorSpec> FieldName for Key<S> {
    fn field_name(&self) -> &str {
        &self.name
    }

    fn declared_in(&self, schema: &Schema) -> bool {
        schema.issued(self)
    }
}

/// A typed handle to one schema field.
pub struct Key<S: ValidatorSpec> {
    name: Arc<str>,
    spec: Arc<S>,
}

impl<S: ValidatorSpec> Key<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &S {
        &self.spec
    }
}

impl<S: ValidatorSpec> Clone for Key<S> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            spec: Arc::clone(&self.spec),
        }
    }
}

impl<S: ValidatorSpec> fmt::Debug for Key<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("kind", &<S::Kind as Kind>::NAME)
            .finish()
    }
}

/// Type-erased view of a field, for string-keyed operations.
pub(crate) trait ErasedField: Send + Sync {
    fn kind_name(&self) -> &'static str;
    fn policy(&self) -> Policy;
    fn explanation(&self) -> Option<&str>;
    /// Parse and render the stored value; `Ok(None)` when an optional field
    /// has nothing usable.
    fn render(&self, key: &str, raw: Option<&Value>) -> Result<Option<String>, ConfigError>;
    /// Address of the registered spec, shared with the field's [`Key`].
    fn spec_addr(&self) -> *const ();
}

struct Erased<S>(Arc<S>);

impl<S: ValidatorSpec> ErasedField for Erased<S> {
    fn kind_name(&self) -> &'static str {
        <S::Kind as Kind>::NAME
    }

    fn policy(&self) -> Policy {
        self.0.field_spec().declaration().policy()
    }

    fn explanation(&self) -> Option<&str> {
        self.0.field_spec().explanation()
    }

    fn render(&self, key: &str, raw: Option<&Value>) -> Result<Option<String>, ConfigError> {
        let value = self.0.field_spec().parse(key, raw)?;
        Ok(value.as_ref().map(<S::Kind as Kind>::render))
    }

    fn spec_addr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast()
    }
}

/// Declaration-order set of fields.
#[derive(Default)]
pub struct SchemaBuilder {
    fields: Vec<(Arc<str>, Arc<dyn ErasedField>)>,
}

impl SchemaBuilder {
    /// Register a field and return its typed key.
    pub fn field<S: ValidatorSpec>(&mut self, name: &str, spec: S) -> Key<S> {
        let name: Arc<str> = Arc::from(name);
        let spec = Arc::new(spec);
        self.fields.push((
            Arc::clone(&name),
            Arc::new(Erased(Arc::clone(&spec))) as Arc<dyn ErasedField>,
        ));
        Key { name, spec }
    }

    /// Finish the schema. Fails if a name was registered twice.
    pub fn build(self) -> Result<Schema, ConfigError> {
        for (i, (name, _)) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|(other, _)| other == name) {
                return Err(ConfigError::DuplicateKey(name.to_string()));
            }
        }
        Ok(Schema {
            fields: self.fields,
        })
    }
}

/// The fixed set of fields an accessor recognizes.
#[derive(Clone)]
pub struct Schema {
    fields: Vec<(Arc<str>, Arc<dyn ErasedField>)>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Field names in declaration order.
    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_ref()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n.as_ref() == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `key` was registered on this schema (or the builder it was
    /// built from). A same-name key from another schema doesn't count.
    pub(crate) fn issued<S: ValidatorSpec>(&self, key: &Key<S>) -> bool {
        let addr: *const () = Arc::as_ptr(&key.spec).cast();
        self.fields
            .iter()
            .any(|(name, field)| name.as_ref() == key.name() && field.spec_addr() == addr)
    }

    /// Resolve `name` to a declared field, or fail with `UnknownKey`.
    pub(crate) fn lookup(&self, name: &str) -> Result<&dyn ErasedField, ConfigError> {
        self.fields
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, field)| field.as_ref())
            .ok_or_else(|| ConfigError::UnknownKey(name.to_string()))
    }

    pub(crate) fn fields(&self) -> impl Iterator<Item = (&str, &dyn ErasedField)> {
        self.fields
            .iter()
            .map(|(name, field)| (name.as_ref(), field.as_ref()))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.fields
                    .iter()
                    .map(|(name, field)| (name, format!("{} ({})", field.kind_name(), field.policy()))),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{bool, num, str};
    use serde_json::json;

    #[test]
    fn keys_follow_declaration_order() {
        let mut builder = Schema::builder();
        builder.field("zeta", num());
        builder.field("alpha", bool());
        builder.field("mid", str());
        let schema = builder.build().unwrap();
        assert_eq!(schema.keys(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut builder = Schema::builder();
        builder.field("port", num());
        builder.field("port", str());
        let err = builder.build().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey(name) if name == "port"));
    }

    #[test]
    fn lookup_unknown_key() {
        let schema = Schema::builder().build().unwrap();
        assert!(schema.is_empty());
        let err = schema.lookup("nope").err().unwrap();
        assert!(matches!(err, ConfigError::UnknownKey(name) if name == "nope"));
    }

    #[test]
    fn key_carries_typed_spec() {
        let mut builder = Schema::builder();
        let retries = builder.field("retries", num().default(3.0));
        assert_eq!(retries.name(), "retries");
        assert_eq!(retries.spec().parse("retries", None).unwrap(), 3.0);
        assert_eq!(retries.field_name(), "retries");
    }

    #[test]
    fn keys_belong_to_their_schema() {
        let mut builder = Schema::builder();
        let own = builder.field("count", num().required());
        let schema = builder.build().unwrap();

        let mut other = Schema::builder();
        let foreign = other.field("count", num());

        assert!(own.declared_in(&schema));
        assert!(own.clone().declared_in(&schema.clone()));
        assert!(!foreign.declared_in(&schema));
        assert!("count".declared_in(&schema));
        assert!(!"total".declared_in(&schema));
    }

    #[test]
    fn erased_field_renders_values() {
        let mut builder = Schema::builder();
        builder.field("flag", bool().required().explain("Feature toggle"));
        let schema = builder.build().unwrap();
        let field = schema.lookup("flag").unwrap();
        assert_eq!(field.kind_name(), "bool");
        assert_eq!(field.policy(), Policy::Required);
        assert_eq!(field.explanation(), Some("Feature toggle"));
        assert_eq!(
            field.render("flag", Some(&json!("yes"))).unwrap(),
            Some("true".to_string())
        );
        assert!(field.render("flag", None).is_err());
    }

    #[test]
    fn debug_lists_fields() {
        let mut builder = Schema::builder();
        builder.field("count", num());
        let schema = builder.build().unwrap();
        let debug = format!("{schema:?}");
        assert!(debug.contains("count"));
        assert!(debug.contains("num (optional)"));
    }
}
