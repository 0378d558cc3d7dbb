//! Validator specs: the per-field coercion and validation contract.
//!
//! A spec pairs a [`Kind`] (how raw values are coerced) with a
//! [`Declaration`] (what happens when coercion yields nothing). The five
//! constructors ([`bool()`], [`num()`], [`str()`], [`date()`] and [`json()`])
//! return an [`Optional`] spec, which can be turned into a [`Defaulted`] or
//! [`Required`] one:
//!
//! ```ignore
//! let verbose = bool();                            // Option<bool>
//! let retries = num().default(3.0);                // f64, falls back to 3
//! let token = str().required().explain("API token"); // String, or an error
//! ```
//!
//! # Resolution order
//!
//! `parse(key, raw)` runs the same steps for every kind:
//!
//! 1. Coerce `raw` with the kind's rules. An absent or unusable value yields
//!    nothing.
//! 2. If nothing was coerced, substitute the declared default, if any.
//! 3. An optional field returns what it has, possibly nothing. It never fails.
//! 4. A defaulted or required field with still nothing fails with
//!    [`ConfigError::MissingOrInvalid`], naming the key and the explanation.
//!
//! Specs are immutable and carry no per-store state, so one spec can be
//! shared by any number of accessors.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ConfigError;
use crate::kind::{self, Kind};

/// The three mutually exclusive validation policies of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration<T> {
    /// No default, not required: missing or invalid input yields `None`.
    Optional,
    /// Missing or invalid input yields `default`. `required` never fires:
    /// the default always substitutes first.
    Defaulted { default: T, required: bool },
    /// No default: missing or invalid input is an error.
    Required,
}

impl<T> Declaration<T> {
    pub fn policy(&self) -> Policy {
        match self {
            Declaration::Optional => Policy::Optional,
            Declaration::Defaulted { .. } => Policy::Defaulted,
            Declaration::Required => Policy::Required,
        }
    }

    pub fn default_value(&self) -> Option<&T> {
        match self {
            Declaration::Defaulted { default, .. } => Some(default),
            _ => None,
        }
    }
}

/// Declaration shape without its payload, for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Optional,
    Defaulted,
    Required,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Optional => f.write_str("optional"),
            Policy::Defaulted => f.write_str("defaulted"),
            Policy::Required => f.write_str("required"),
        }
    }
}

/// Untyped-output spec engine shared by every typed spec.
///
/// `parse` returns `Ok(None)` only for [`Declaration::Optional`].
pub struct FieldSpec<K: Kind> {
    declaration: Declaration<K::Value>,
    explanation: Option<String>,
}

impl<K: Kind> FieldSpec<K> {
    pub fn new(declaration: Declaration<K::Value>) -> Self {
        Self {
            declaration,
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn declaration(&self) -> &Declaration<K::Value> {
        &self.declaration
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn parse(&self, key: &str, raw: Option<&Value>) -> Result<Option<K::Value>, ConfigError> {
        let coerced = raw.and_then(K::coerce);
        if coerced.is_none()
            && let Some(raw) = raw
        {
            tracing::trace!(key, kind = K::NAME, %raw, "stored value failed coercion");
        }

        let out = coerced.or_else(|| self.declaration.default_value().cloned());

        if let Declaration::Optional = self.declaration {
            return Ok(out);
        }

        match out {
            Some(value) => Ok(Some(value)),
            None => Err(ConfigError::missing(key, self.explanation())),
        }
    }
}

impl<K: Kind> Clone for FieldSpec<K> {
    fn clone(&self) -> Self {
        Self {
            declaration: self.declaration.clone(),
            explanation: self.explanation.clone(),
        }
    }
}

impl<K: Kind> fmt::Debug for FieldSpec<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("kind", &K::NAME)
            .field("declaration", &self.declaration)
            .field("explanation", &self.explanation)
            .finish()
    }
}

/// A typed validator spec: what a schema field is declared with.
pub trait ValidatorSpec: Send + Sync + 'static {
    type Kind: Kind;

    /// `Option<T>` for optional fields, `T` otherwise.
    type Output;

    fn field_spec(&self) -> &FieldSpec<Self::Kind>;

    fn parse(&self, key: &str, raw: Option<&Value>) -> Result<Self::Output, ConfigError>;
}

macro_rules! spec_common {
    ($name:ident) => {
        impl<K: Kind> $name<K> {
            /// Text appended to the error raised for this field.
            pub fn explain(self, explanation: impl Into<String>) -> Self {
                Self(self.0.with_explanation(explanation))
            }
        }

        impl<K: Kind> Clone for $name<K> {
            fn clone(&self) -> Self {
                Self(self.0.clone())
            }
        }

        impl<K: Kind> fmt::Debug for $name<K> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }
    };
}

/// Spec of a field with no default that is not required.
pub struct Optional<K: Kind>(FieldSpec<K>);

/// Spec of a field that falls back to a default value.
pub struct Defaulted<K: Kind>(FieldSpec<K>);

/// Spec of a field that must hold a valid value.
pub struct Required<K: Kind>(FieldSpec<K>);

spec_common!(Optional);
spec_common!(Defaulted);
spec_common!(Required);

impl<K: Kind> Optional<K> {
    fn new() -> Self {
        Self(FieldSpec::new(Declaration::Optional))
    }

    /// Fall back to `value` when nothing valid is stored.
    pub fn default(self, value: K::Value) -> Defaulted<K> {
        let spec = FieldSpec::new(Declaration::Defaulted {
            default: value,
            required: false,
        });
        Defaulted(carry_explanation(spec, self.0))
    }

    /// Fail with [`ConfigError::MissingOrInvalid`] when nothing valid is stored.
    pub fn required(self) -> Required<K> {
        Required(carry_explanation(FieldSpec::new(Declaration::Required), self.0))
    }
}

impl<K: Kind> Defaulted<K> {
    /// Flag the field as required. The default still substitutes first.
    pub fn required(self) -> Self {
        let FieldSpec {
            declaration,
            explanation,
        } = self.0;
        let declaration = match declaration {
            Declaration::Defaulted { default, .. } => Declaration::Defaulted {
                default,
                required: true,
            },
            other => other,
        };
        Self(FieldSpec {
            declaration,
            explanation,
        })
    }
}

fn carry_explanation<K: Kind>(spec: FieldSpec<K>, from: FieldSpec<K>) -> FieldSpec<K> {
    match from.explanation {
        Some(text) => spec.with_explanation(text),
        None => spec,
    }
}

impl<K: Kind> ValidatorSpec for Optional<K> {
    type Kind = K;
    type Output = Option<K::Value>;

    fn field_spec(&self) -> &FieldSpec<K> {
        &self.0
    }

    fn parse(&self, key: &str, raw: Option<&Value>) -> Result<Option<K::Value>, ConfigError> {
        self.0.parse(key, raw)
    }
}

impl<K: Kind> ValidatorSpec for Defaulted<K> {
    type Kind = K;
    type Output = K::Value;

    fn field_spec(&self) -> &FieldSpec<K> {
        &self.0
    }

    fn parse(&self, key: &str, raw: Option<&Value>) -> Result<K::Value, ConfigError> {
        self.0
            .parse(key, raw)?
            .ok_or_else(|| ConfigError::missing(key, self.0.explanation()))
    }
}

impl<K: Kind> ValidatorSpec for Required<K> {
    type Kind = K;
    type Output = K::Value;

    fn field_spec(&self) -> &FieldSpec<K> {
        &self.0
    }

    fn parse(&self, key: &str, raw: Option<&Value>) -> Result<K::Value, ConfigError> {
        self.0
            .parse(key, raw)?
            .ok_or_else(|| ConfigError::missing(key, self.0.explanation()))
    }
}

/// Declare a boolean field. See [`Bool`](kind::Bool) for accepted values.
pub fn bool() -> Optional<kind::Bool> {
    Optional::new()
}

/// Declare a numeric field.
pub fn num() -> Optional<kind::Num> {
    Optional::new()
}

/// Declare a string field.
pub fn str() -> Optional<kind::Str> {
    Optional::new()
}

/// Declare a date field.
pub fn date() -> Optional<kind::Date> {
    Optional::new()
}

/// Declare a JSON field deserialized into `T`.
///
/// ```ignore
/// let window = json::<WindowState>().default(WindowState::default());
/// let extra = json::<serde_json::Value>();
/// ```
pub fn json<T>() -> Optional<kind::Json<T>>
where
    T: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static,
{
    Optional::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn bool_default_spec() {
        let spec = bool();
        assert_eq!(spec.parse("", Some(&json!(true))).unwrap(), Some(true));
        assert_eq!(spec.parse("", Some(&json!("t"))).unwrap(), Some(true));
        assert_eq!(spec.parse("", Some(&json!("0"))).unwrap(), Some(false));
        assert_eq!(spec.parse("", Some(&json!("a"))).unwrap(), None);
    }

    #[test]
    fn bool_with_default_value() {
        let spec = bool().default(false);
        assert!(!spec.parse("", None).unwrap());
        assert!(spec.parse("", Some(&json!("yes"))).unwrap());
    }

    #[test]
    fn bool_required_errors_when_missing() {
        let spec = bool().required();
        let err = spec.parse("flag", None).unwrap_err();
        match err {
            ConfigError::MissingOrInvalid { key, explanation } => {
                assert_eq!(key, "flag");
                assert_eq!(explanation, None);
            }
            other => panic!("Expected MissingOrInvalid, got {other:?}"),
        }
    }

    #[test]
    fn optional_never_errors() {
        let spec = num();
        for raw in [None, Some(json!("garbage")), Some(json!(null)), Some(json!([]))] {
            assert_eq!(spec.parse("n", raw.as_ref()).unwrap(), None);
        }
    }

    #[test]
    fn required_errors_on_invalid_value() {
        let spec = date().required().explain("When the trial ends");
        let err = spec.parse("trial_end", Some(&json!("soon"))).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"trial_end\""));
        assert!(msg.contains("When the trial ends"));
    }

    #[test]
    fn required_returns_valid_value() {
        let spec = str().required();
        assert_eq!(spec.parse("name", Some(&json!("kv"))).unwrap(), "kv");
    }

    #[test]
    fn default_replaces_invalid_value() {
        let spec = num().default(3.0);
        assert_eq!(spec.parse("retries", Some(&json!("many"))).unwrap(), 3.0);
        assert_eq!(spec.parse("retries", Some(&json!(7))).unwrap(), 7.0);
    }

    #[test]
    fn stored_zero_wins_over_default() {
        let spec = num().default(10.0);
        assert_eq!(spec.parse("retries", Some(&json!(0))).unwrap(), 0.0);
    }

    #[test]
    fn defaulted_required_still_uses_default() {
        let spec = str().default("guest".into()).required();
        assert_eq!(
            spec.field_spec().declaration(),
            &Declaration::Defaulted {
                default: "guest".to_string(),
                required: true
            }
        );
        assert_eq!(spec.parse("user", None).unwrap(), "guest");
    }

    #[test]
    fn explanation_survives_policy_change() {
        let spec = str().explain("Display name").required();
        assert_eq!(spec.field_spec().explanation(), Some("Display name"));

        let spec = num().explain("Port").default(80.0);
        assert_eq!(spec.field_spec().explanation(), Some("Port"));
    }

    #[test]
    fn date_default() {
        let epoch = Utc.timestamp_millis_opt(0).unwrap();
        let spec = date().default(epoch);
        assert_eq!(spec.parse("since", None).unwrap(), epoch);
    }

    #[test]
    fn json_required() {
        let spec = json::<Value>().required();
        assert_eq!(
            spec.parse("prefs", Some(&json!("{\"a\":1}"))).unwrap(),
            json!({"a": 1})
        );
        assert!(spec.parse("prefs", Some(&json!("{"))).is_err());
    }

    #[test]
    fn field_spec_parse_reports_policy() {
        let spec: FieldSpec<kind::Num> = FieldSpec::new(Declaration::Required);
        assert_eq!(spec.declaration().policy(), Policy::Required);
        assert!(spec.parse("n", None).is_err());
        assert_eq!(spec.parse("n", Some(&json!(2))).unwrap(), Some(2.0));
    }

    #[test]
    fn specs_are_reusable() {
        let spec = num().default(1.0);
        assert_eq!(spec.parse("a", Some(&json!(5))).unwrap(), 5.0);
        assert_eq!(spec.parse("b", None).unwrap(), 1.0);
        let copy = spec.clone();
        assert_eq!(copy.parse("c", None).unwrap(), 1.0);
    }
}
