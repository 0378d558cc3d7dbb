//! Typed, validated configuration over namespaced key-value storage. Declare
//! your fields, pick a backend, and go.
//!
//! Kvfig turns an untyped key-value store into a typed settings object. Each
//! field is declared once with a validator spec that says what kind of value
//! it holds, whether it has a default, and whether it must be present. Reads
//! coerce whatever is stored into that kind; writes store values as-is.
//!
//! ```ignore
//! let mut schema = Schema::builder();
//! let count = schema.field("count", num());
//! let verbose = schema.field("verbose", bool().default(false));
//! let token = schema.field("token", str().required().explain("API token"));
//!
//! let config = Configuration::open(Backend::File, "myapp", schema.build()?)?;
//!
//! config.set(&count, 4.0)?;
//! let total = config.pipe(&count, |v| v.unwrap_or(0.0) + 8.0)?; // 12.0
//! let verbose: bool = config.get(&verbose)?;
//! let token: String = config.get(&token)?;                      // or an error
//! ```
//!
//! # Design: the schema as source of truth
//!
//! A [`Schema`] is the fixed, ordered set of fields an accessor recognizes.
//! Registering a field returns a typed [`Key`], so `get(&count)` returns
//! `Option<f64>` and `get(&token)` returns `String` with no casting and no
//! string lookups. Names outside the schema are rejected with
//! [`ConfigError::UnknownKey`]. A key only works with the schema that issued
//! it; a same-name key from another schema fails with
//! [`ConfigError::ForeignKey`].
//!
//! # Validator specs
//!
//! Five constructors pick the kind: [`bool()`], [`num()`], [`str()`],
//! [`date()`] and [`json()`]. Each returns an optional spec; chain
//! [`.default(v)`](Optional::default) and/or
//! [`.required()`](Optional::required) to change what happens when nothing
//! usable is stored, and [`.explain(text)`](Optional::explain) to attach a
//! message shown on failure:
//!
//! | Declaration                  | Output      | Nothing usable stored |
//! |------------------------------|-------------|-----------------------|
//! | `num()`                      | `Option<f64>` | `None`              |
//! | `num().default(3.0)`         | `f64`       | `3.0`                 |
//! | `num().required()`           | `f64`       | `MissingOrInvalid`    |
//! | `num().default(3.0).required()` | `f64`    | `3.0`                 |
//!
//! Coercion is lenient. `bool()` accepts `"yes"`, `"t"`, `"y"`, `1` and
//! their opposites; `num()` accepts numeric text (including `0x` literals);
//! `str()` turns numbers into text; `date()` accepts RFC 3339 text, plain
//! dates and epoch milliseconds; `json()` parses JSON text and deserializes
//! into any `serde` type. Anything that doesn't fit yields nothing, and the
//! declaration decides what that means.
//!
//! # Backends
//!
//! Storage is behind the [`Store`] trait, bound to one namespace:
//!
//! - **[`Backend::File`]**: one file per namespace under a directory
//!   (default: the platform config directory). JSON by default; TOML files
//!   are edited in place with `toml_edit`, so comments survive writes.
//! - **[`Backend::LocalStorage`]**: a process-wide in-memory registry.
//!   Accessors on the same namespace share keys for the life of the process.
//!
//! Accessors with different namespaces never see each other's keys. Nothing
//! is cached: every `get` goes to the store.
//!
//! [`Kvfig::builder()`] exposes the file backend's directory and format, and
//! can take them from [`StoreSettings`] (`KVFIG_DIR`, `KVFIG_FORMAT`):
//!
//! ```ignore
//! let config = Kvfig::builder()
//!     .namespace("myapp")
//!     .settings_from_env()
//!     .format(FileFormat::Toml)
//!     .open(schema)?;
//! ```
//!
//! # String-keyed operations
//!
//! For callers that only have names as text, [`ConfigAction`] covers
//! list / get / set / unset / reset and produces a displayable
//! [`ConfigResult`]. `Set` stores the text unchanged; it is coerced when read.
//!
//! # Error handling
//!
//! Beyond key checks, reads fail only with
//! [`ConfigError::MissingOrInvalid`] (a defaulted or required field with
//! nothing usable) or a passthrough [`StoreError`].
//! Enable the `rich-errors` feature for `miette` diagnostics.

pub mod error;
pub mod kind;
pub mod spec;
pub mod types;

mod accessor;
mod builder;
mod file;
mod memory;
mod ops;
mod persist;
mod schema;
mod settings;
mod store;

#[cfg(test)]
mod fixtures;

pub use accessor::{Configuration, Field, ValueOf};
pub use builder::{Kvfig, KvfigBuilder};
pub use error::{ConfigError, StoreError};
pub use file::{FileStore, default_dir, namespace_file_name};
pub use kind::Kind;
pub use memory::{MemoryRegistry, MemoryStore};
pub use ops::{ConfigResult, get_value, list_values};
pub use schema::{FieldName, Key, Schema, SchemaBuilder};
pub use settings::StoreSettings;
pub use spec::{Declaration, Defaulted, FieldSpec, Optional, Policy, Required, ValidatorSpec};
pub use spec::{bool, date, json, num, str};
pub use store::Store;
pub use types::{Backend, ConfigAction, FileFormat};
