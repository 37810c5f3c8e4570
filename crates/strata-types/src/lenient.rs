//! Permissive field deserializers for upstream payloads.
//!
//! The simulation backend is not under our control. Numeric metrics may
//! arrive as numbers or numeric strings, identifiers as strings or
//! integers, and flags as booleans, `0`/`1`, or `"yes"`/`"no"`. These
//! helpers coerce what they can and turn everything else into "absent"
//! rather than failing the whole record.
//!
//! Every helper is meant for `#[serde(default, deserialize_with = "...")]`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a JSON value into a finite `f64`.
///
/// Numbers pass through, numeric strings are parsed, booleans map to
/// `1.0`/`0.0`. `NaN`, infinities and anything else yield `None`.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Coerce a JSON value into a `bool`.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v.abs() > f64::EPSILON),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Coerce a JSON scalar into a `String`. Objects, arrays and `null`
/// yield `None`.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Optional `f64` accepting numbers, numeric strings, or garbage (→ `None`).
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_f64))
}

/// Optional non-negative integer. Fractional values are truncated.
pub fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(coerce_f64)
        .filter(|v| *v >= 0.0)
        .map(|v| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let whole = v.trunc() as u64;
            whole
        }))
}

/// Non-negative integer defaulting to zero.
pub fn u64_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_u64(deserializer)?.unwrap_or(0))
}

/// Optional boolean accepting the forms listed in [`coerce_bool`].
pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_bool))
}

/// Boolean defaulting to `false`.
pub fn bool_or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_bool(deserializer)?.unwrap_or(false))
}

/// Optional string. Empty strings are treated as absent.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(coerce_string)
        .filter(|s| !s.trim().is_empty()))
}

/// String defaulting to empty.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_string).unwrap_or_default())
}

/// A list where malformed elements are dropped and a non-array value
/// becomes an empty list.
pub fn lossy_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_and_numeric_strings_coerce() {
        assert_eq!(coerce_f64(&json!(0.5)), Some(0.5));
        assert_eq!(coerce_f64(&json!("72")), Some(72.0));
        assert_eq!(coerce_f64(&json!(" 3.5 ")), Some(3.5));
        assert_eq!(coerce_f64(&json!("high")), None);
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!([1, 2])), None);
    }

    #[test]
    fn non_finite_strings_are_rejected() {
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!("inf")), None);
    }

    #[test]
    fn bool_forms() {
        assert_eq!(coerce_bool(&json!(true)), Some(true));
        assert_eq!(coerce_bool(&json!(0)), Some(false));
        assert_eq!(coerce_bool(&json!(1)), Some(true));
        assert_eq!(coerce_bool(&json!("Yes")), Some(true));
        assert_eq!(coerce_bool(&json!("off")), Some(false));
        assert_eq!(coerce_bool(&json!("maybe")), None);
    }

    #[test]
    fn string_forms() {
        assert_eq!(coerce_string(&json!("a")), Some("a".to_owned()));
        assert_eq!(coerce_string(&json!(12)), Some("12".to_owned()));
        assert_eq!(coerce_string(&json!({"a": 1})), None);
    }

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "opt_f64")]
        metric: Option<f64>,
        #[serde(default, deserialize_with = "u64_or_zero")]
        tick: u64,
        #[serde(default, deserialize_with = "lossy_vec")]
        tags: Vec<String>,
    }

    #[test]
    fn struct_fields_tolerate_bad_input() {
        let sample: Sample =
            serde_json::from_value(json!({"metric": "bad", "tick": -4, "tags": "nope"}))
                .unwrap_or_else(|_| Sample {
                    metric: Some(1.0),
                    tick: 99,
                    tags: vec!["x".to_owned()],
                });
        assert_eq!(sample.metric, None);
        assert_eq!(sample.tick, 0);
        assert!(sample.tags.is_empty());
    }

    #[test]
    fn lossy_vec_drops_only_bad_elements() {
        let sample: Result<Sample, _> =
            serde_json::from_value(json!({"tags": ["a", 3, "b", {"x": 1}]}));
        let tags = sample.map(|p| p.tags).unwrap_or_default();
        assert_eq!(tags, vec!["a".to_owned(), "b".to_owned()]);
    }
}
