//! Field-level deserializers that never fail.
//!
//! Persisted records are edited by older builds, by hand, and by imports,
//! so a single bad field must not discard the whole record. Each helper
//! reads whatever JSON value is present and falls back to a default when
//! it has the wrong type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize `T`, falling back to `T::default()` on a type mismatch.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Like [`or_default`], but only a JSON object is decoded. Arrays would
/// otherwise fill struct fields by position.
pub(crate) fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_object(value).unwrap_or_default())
}

/// Decode `T` from `value` if it is an object.
pub(crate) fn decode_object<T: DeserializeOwned>(value: Value) -> Option<T> {
    match value {
        Value::Object(_) => T::deserialize(value).ok(),
        _ => None,
    }
}

/// A boolean that defaults to `true` when the stored value is not a boolean.
pub(crate) fn bool_or_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or(true))
}

/// An hour of the day in `0..=23`; anything else becomes `0`.
pub(crate) fn hour<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .filter(|h| *h <= 23)
        .map(|h| h as u8)
        .unwrap_or(0))
}

/// A list of strings. Non-array values become `None`; non-string
/// elements are dropped.
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Epoch milliseconds. Accepts integers and whole floats; anything else
/// becomes `None` so the caller can substitute "now".
pub(crate) fn epoch_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        _ => None,
    })
}
