//! Payload normalization at the upstream boundary.
//!
//! The backend is inconsistent about envelopes: a collection may arrive as
//! a bare array, or wrapped as `{"items": [...]}`, `{"data": [...]}`,
//! `{"<collection>": [...]}` or `{"data": {"<collection>": [...]}}`.
//! Everything is turned into a canonical `Vec<T>` here so nothing
//! downstream ever branches on shape. Records that fail to decode are
//! skipped with a warning; a payload with no recognizable list is empty.

use serde::de::DeserializeOwned;
use serde_json::Value;
use strata_types::{SimulationStatus, Snapshot};
use tracing::{debug, warn};

const WRAPPER_KEYS: [&str; 3] = ["items", "data", "results"];

/// Extract a canonical list of `T` from any supported envelope.
pub fn normalize_list<T: DeserializeOwned>(payload: Value, collection: &str) -> Vec<T> {
    let Some(items) = find_array(payload, collection) else {
        debug!(collection, "Payload carried no list, treating as empty");
        return Vec::new();
    };

    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection, index, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect();
    if records.len() < total {
        debug!(collection, kept = records.len(), total, "Normalized with skipped records");
    }
    records
}

fn find_array(payload: Value, collection: &str) -> Option<Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove(collection) {
                return Some(items);
            }
            for key in WRAPPER_KEYS {
                match map.remove(key) {
                    Some(Value::Array(items)) => return Some(items),
                    Some(nested @ Value::Object(_)) => {
                        if let Some(items) = find_array(nested, collection) {
                            return Some(items);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

/// Extract the run status from a bare object or a `{"data": {...}}`
/// envelope.
pub fn normalize_status(payload: Value) -> Option<SimulationStatus> {
    let object = match payload {
        Value::Object(mut map) => match map.remove("status").or_else(|| map.remove("data")) {
            Some(inner @ Value::Object(_)) => inner,
            _ => Value::Object(map),
        },
        _ => return None,
    };
    serde_json::from_value(object)
        .map_err(|e| warn!(error = %e, "Skipping malformed status"))
        .ok()
}

/// Build a full snapshot from an object carrying some or all collections.
/// Absent districts or agents are empty; absent panels stay `None` so the
/// dashboard keeps their last known value.
pub fn normalize_snapshot(payload: Value) -> Snapshot {
    let Value::Object(mut map) = payload else {
        return Snapshot::default();
    };
    if let Some(Value::Object(inner)) = map.remove("data") {
        map = inner;
    }
    let districts = normalize_list(map.remove("districts").unwrap_or(Value::Null), "districts");
    let agents = normalize_list(map.remove("agents").unwrap_or(Value::Null), "agents");
    let events = map.remove("events").map(|raw| normalize_list(raw, "events"));
    let causality = map.remove("causality").map(|raw| normalize_list(raw, "causality"));
    let emotions = map.remove("emotions").map(|raw| normalize_list(raw, "emotions"));
    let rules = map.remove("rules").map(|raw| normalize_list(raw, "rules"));
    let status = match map.remove("status") {
        None | Some(Value::Null) => None,
        Some(raw) => normalize_status(raw),
    };
    Snapshot {
        districts,
        agents,
        events,
        causality,
        emotions,
        rules,
        status,
    }
}
