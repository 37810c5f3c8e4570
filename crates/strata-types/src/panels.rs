//! Secondary simulation collections shown in dashboard panels.
//!
//! These records are passed through to the view without interpretation,
//! so they carry only the fields the panels display and tolerate anything
//! missing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient;

/// A simulation-wide event log entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Upstream identifier.
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    /// Tick at which the event occurred.
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub tick: Option<u64>,
    /// Event tag.
    #[serde(default, alias = "type", deserialize_with = "lenient::string")]
    pub event_type: String,
    /// District the event happened in.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub district: Option<String>,
    /// Human-readable description.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    /// Severity, scale defined upstream.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub severity: Option<f64>,
}

/// A directed cause → effect link discovered by the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CausalLink {
    /// Cause description or event id.
    #[serde(default, alias = "source", deserialize_with = "lenient::string")]
    pub cause: String,
    /// Effect description or event id.
    #[serde(default, alias = "target", deserialize_with = "lenient::string")]
    pub effect: String,
    /// Link strength.
    #[serde(default, alias = "weight", deserialize_with = "lenient::opt_f64")]
    pub strength: Option<f64>,
    /// Tick the link was recorded.
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub tick: Option<u64>,
}

/// An emotion measurement for a district or agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionReading {
    /// District or agent the reading belongs to.
    #[serde(
        default,
        alias = "district",
        alias = "agent",
        deserialize_with = "lenient::string"
    )]
    pub subject: String,
    /// Emotion name, e.g. `fear`.
    #[serde(default, deserialize_with = "lenient::string")]
    pub emotion: String,
    /// Intensity, scale defined upstream.
    #[serde(default, alias = "value", deserialize_with = "lenient::opt_f64")]
    pub intensity: Option<f64>,
}

/// A rule currently known to the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Upstream identifier.
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    /// Rule name.
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    /// Description.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    /// Whether the rule is in force.
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub active: Option<bool>,
}

/// Simulation run status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStatus {
    /// Current tick.
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub tick: u64,
    /// Whether the upstream simulation is paused.
    #[serde(default, deserialize_with = "lenient::bool_or_false")]
    pub paused: bool,
    /// Speed multiplier.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub speed: Option<f64>,
    /// Anything else the backend reports.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}
