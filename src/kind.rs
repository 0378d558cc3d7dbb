//! Value kinds: coercion of untyped stored values into typed values.
//!
//! Every field has a kind that decides how a raw [`serde_json::Value`] read
//! from a store becomes a typed value, and how a typed value is written back.
//! Coercion is best-effort: it returns `None` whenever the stored value has
//! no sensible reading for the kind, and the [`spec`](crate::spec) layer
//! decides what that means for the field (undefined, default, or error).
//!
//! | Kind     | Typed value            | Accepted raw values                                   |
//! |----------|------------------------|-------------------------------------------------------|
//! | [`Bool`] | `bool`                 | booleans, `1`/`0`, `true t yes y 1` / `false f no n 0` |
//! | [`Num`]  | `f64`                  | finite numbers, numeric strings                       |
//! | [`Str`]  | `String`               | anything truthy                                       |
//! | [`Date`] | `DateTime<Utc>`        | epoch milliseconds, RFC 3339, RFC 2822, plain dates   |
//! | [`Json`] | any `T: Deserialize`   | arrays, objects, JSON text, truthy scalars            |

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

/// A primitive field kind.
pub trait Kind: Send + Sync + 'static {
    /// The typed value handed to callers.
    type Value: Clone + fmt::Debug + Send + Sync + 'static;

    /// Short name used in listings and logs.
    const NAME: &'static str;

    /// Best-effort conversion of a raw stored value. `None` means the value
    /// is unusable for this kind.
    fn coerce(raw: &Value) -> Option<Self::Value>;

    /// Encode a typed value for storage. Re-coercing the result yields the
    /// same typed value.
    fn encode(value: &Self::Value) -> Result<Value, String>;

    /// Human-readable rendering for listings.
    fn render(value: &Self::Value) -> String;
}

/// JavaScript-style truthiness of a raw value.
pub(crate) fn is_truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// bool
// ---------------------------------------------------------------------------

/// Boolean kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

const TRUTHY_TOKENS: [&str; 5] = ["true", "t", "yes", "y", "1"];
const FALSY_TOKENS: [&str; 5] = ["false", "f", "no", "n", "0"];

/// Parse a boolean token, case-insensitively.
pub fn parse_bool_token(token: &str) -> Option<bool> {
    let lowered = token.to_ascii_lowercase();
    if TRUTHY_TOKENS.contains(&lowered.as_str()) {
        Some(true)
    } else if FALSY_TOKENS.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}

impl Kind for Bool {
    type Value = bool;
    const NAME: &'static str = "bool";

    fn coerce(raw: &Value) -> Option<bool> {
        match raw {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_bool_token(s),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f == 1.0 => Some(true),
                Some(f) if f == 0.0 => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn encode(value: &bool) -> Result<Value, String> {
        Ok(Value::Bool(*value))
    }

    fn render(value: &bool) -> String {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// num
// ---------------------------------------------------------------------------

/// Numeric kind. Values are `f64`, like the numbers they are stored as.
#[derive(Debug, Clone, Copy, Default)]
pub struct Num;

/// Largest integer an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Parse a numeric string: decimal and exponent forms, plus `0x`, `0o` and
/// `0b` integer literals. Surrounding whitespace is ignored; empty and
/// non-finite inputs are rejected.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let radix = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| trimmed.strip_prefix(prefix).map(|digits| (digits, radix)));
    if let Some((digits, radix)) = radix {
        return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
    }

    // Rust accepts "inf" and "NaN"; neither is a usable config value.
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

impl Kind for Num {
    type Value = f64;
    const NAME: &'static str = "num";

    fn coerce(raw: &Value) -> Option<f64> {
        match raw {
            Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
            Value::String(s) => parse_number(s),
            _ => None,
        }
    }

    fn encode(value: &f64) -> Result<Value, String> {
        if !value.is_finite() {
            return Err(format!("{value} is not a finite number"));
        }
        if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
            return Ok(Value::from(*value as i64));
        }
        Number::from_f64(*value)
            .map(Value::Number)
            .ok_or_else(|| format!("{value} is not representable"))
    }

    fn render(value: &f64) -> String {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// str
// ---------------------------------------------------------------------------

/// String kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Str;

impl Kind for Str {
    type Value = String;
    const NAME: &'static str = "str";

    fn coerce(raw: &Value) -> Option<String> {
        if !is_truthy(raw) {
            return None;
        }
        match raw {
            Value::String(s) => Some(s.clone()),
            // 1.0 reads as "1", the way it renders as a number.
            Value::Number(n) if n.is_f64() => n.as_f64().map(|f| Num::render(&f)),
            other => Some(other.to_string()),
        }
    }

    fn encode(value: &String) -> Result<Value, String> {
        Ok(Value::String(value.clone()))
    }

    fn render(value: &String) -> String {
        value.clone()
    }
}

// ---------------------------------------------------------------------------
// date
// ---------------------------------------------------------------------------

/// Date kind: a UTC instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Date;

/// Parse a date string. Naive forms (no offset) are read as UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl Kind for Date {
    type Value = DateTime<Utc>;
    const NAME: &'static str = "date";

    fn coerce(raw: &Value) -> Option<DateTime<Utc>> {
        match raw {
            Value::Number(n) => {
                let millis = n.as_i64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && f.abs() < MAX_SAFE_INTEGER)
                        .map(|f| f.trunc() as i64)
                })?;
                DateTime::from_timestamp_millis(millis)
            }
            Value::String(s) => parse_date(s),
            _ => None,
        }
    }

    fn encode(value: &DateTime<Utc>) -> Result<Value, String> {
        Ok(Value::String(render_date(value)))
    }

    fn render(value: &DateTime<Utc>) -> String {
        render_date(value)
    }
}

fn render_date(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// json
// ---------------------------------------------------------------------------

/// JSON kind, deserialized into `T` (an untyped [`Value`] by default).
pub struct Json<T = Value>(PhantomData<fn() -> T>);

impl<T> fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Json")
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Json(PhantomData)
    }
}

impl<T> Kind for Json<T>
where
    T: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static,
{
    type Value = T;
    const NAME: &'static str = "json";

    fn coerce(raw: &Value) -> Option<T> {
        let candidate = match raw {
            Value::Array(_) | Value::Object(_) => raw.clone(),
            Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
            scalar => scalar.clone(),
        };
        if !is_truthy(&candidate) {
            return None;
        }
        serde_json::from_value(candidate).ok()
    }

    fn encode(value: &T) -> Result<Value, String> {
        serde_json::to_value(value).map_err(|e| e.to_string())
    }

    fn render(value: &T) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
    }
}
