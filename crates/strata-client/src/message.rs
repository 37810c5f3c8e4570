//! Push-stream message decoding.
//!
//! Every message is a JSON envelope `{"type": "...", "data": ...}` (the
//! body may also be under `payload`). Type tags are matched
//! case-insensitively with `-` and `_` treated alike and an optional
//! `_update` suffix ignored, so `districts`, `district_update` and
//! `Districts-Update` are the same message. A list body replaces the
//! district list; a single record replaces or appends that district by
//! `id` and leaves the others alone. Agents work the same way.

use serde::de::DeserializeOwned;
use serde_json::Value;
use strata_types::SnapshotUpdate;
use tracing::debug;

use crate::error::ClientError;
use crate::normalize::{normalize_list, normalize_snapshot, normalize_status};

/// Decode one text frame.
///
/// Returns `Ok(None)` for well-formed messages of unknown type (heartbeats,
/// acks, future message kinds).
pub fn parse_message(text: &str) -> Result<Option<SnapshotUpdate>, ClientError> {
    let envelope: Value =
        serde_json::from_str(text).map_err(|e| ClientError::Decode(e.to_string()))?;
    let Value::Object(mut map) = envelope else {
        return Err(ClientError::Decode("stream message is not an object".to_owned()));
    };

    let tag = map
        .remove("type")
        .or_else(|| map.remove("event"))
        .and_then(|t| t.as_str().map(normalize_tag))
        .ok_or_else(|| ClientError::Decode("stream message has no type".to_owned()))?;
    let body = map
        .remove("data")
        .or_else(|| map.remove("payload"))
        .unwrap_or(Value::Null);

    let update = match tag.as_str() {
        "districts" | "district" if is_single_record(&body) => {
            SnapshotUpdate::UpsertDistrict(Box::new(single(body, "district")?))
        }
        "districts" | "district" => SnapshotUpdate::Districts(normalize_list(body, "districts")),
        "agents" | "agent" if is_single_record(&body) => {
            SnapshotUpdate::UpsertAgent(Box::new(single(body, "agent")?))
        }
        "agents" | "agent" => SnapshotUpdate::Agents(normalize_list(body, "agents")),
        "events" | "event" => SnapshotUpdate::Events(normalize_list(listify(body), "events")),
        "causality" | "causal_links" => {
            SnapshotUpdate::Causality(normalize_list(listify(body), "causality"))
        }
        "emotions" | "emotion" => {
            SnapshotUpdate::Emotions(normalize_list(listify(body), "emotions"))
        }
        "rules" | "rule" => SnapshotUpdate::Rules(normalize_list(listify(body), "rules")),
        "status" | "tick" => match normalize_status(body) {
            Some(status) => SnapshotUpdate::Status(status),
            None => return Err(ClientError::Decode("malformed status message".to_owned())),
        },
        "snapshot" | "full" | "state" | "init" => {
            SnapshotUpdate::Full(Box::new(normalize_snapshot(body)))
        }
        other => {
            debug!(message_type = other, "Ignoring unknown stream message");
            return Ok(None);
        }
    };
    Ok(Some(update))
}

fn normalize_tag(raw: &str) -> String {
    let tag = raw.trim().to_lowercase().replace('-', "_");
    tag.strip_suffix("_update")
        .or_else(|| tag.strip_suffix("_updated"))
        .map_or_else(|| tag.clone(), str::to_owned)
}

/// An object with an `id` and no list inside is one record, not an
/// envelope.
fn is_single_record(body: &Value) -> bool {
    matches!(
        body,
        Value::Object(map) if map.contains_key("id") && !map.values().any(Value::is_array)
    )
}

/// A single record object is promoted to a one-element list; envelopes
/// and arrays pass through.
fn listify(body: Value) -> Value {
    if is_single_record(&body) {
        Value::Array(vec![body])
    } else {
        body
    }
}

fn single<T: DeserializeOwned>(body: Value, kind: &str) -> Result<T, ClientError> {
    serde_json::from_value(body)
        .map_err(|e| ClientError::Decode(format!("malformed {kind} record: {e}")))
}
