//! Permissive deserializers for documents produced by external services.
//!
//! The agent service and the case store both emit loosely shaped JSON. These
//! helpers let a single malformed field fall back to its default instead of
//! failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize `T`, substituting `T::default()` when the value has the wrong shape.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    match T::deserialize(value) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            tracing::debug!("falling back to default for malformed field: {}", e);
            Ok(T::default())
        }
    }
}

/// Deserialize an optional identifier, treating empty strings and non-strings as absent.
pub(crate) fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// Deserialize a rubric score that may arrive as a number or a numeric string.
///
/// Zero, negative, non-finite and non-numeric values all mean "no score".
pub(crate) fn score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|s| s.is_finite() && *s > 0.0))
}
