//! Agent records as reported by the simulation backend.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// An individual simulated actor.
///
/// Every field except `id` is optional upstream. The district reference
/// may arrive as `district`, `district_id`, `location` or `location_id`
/// and is matched fuzzily against district ids and names by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Upstream identifier.
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    /// Display name.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    /// District reference (id or name).
    #[serde(default, alias = "district_id", deserialize_with = "lenient::opt_string")]
    pub district: Option<String>,
    /// Location reference, used when `district` is absent.
    #[serde(default, alias = "location_id", deserialize_with = "lenient::opt_string")]
    pub location: Option<String>,
    /// Free-form role, e.g. `Trader`.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub role: Option<String>,
    /// What the agent is doing right now.
    #[serde(default, alias = "action", deserialize_with = "lenient::opt_string")]
    pub current_action: Option<String>,
    /// Mood, `[-1, 1]` or `[0, 1]` depending on the upstream model.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub mood: Option<f64>,
    /// Alive flag; absent means alive.
    #[serde(default, alias = "is_alive", deserialize_with = "lenient::opt_bool")]
    pub alive: Option<bool>,
}

impl Agent {
    /// Create an agent placed in the given district.
    pub fn new(id: impl Into<String>, district: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            district: Some(district.into()),
            ..Self::default()
        }
    }

    /// Whether the agent is alive. Missing flag means alive.
    pub fn is_alive(&self) -> bool {
        self.alive.unwrap_or(true)
    }

    /// References to try when finding the agent's district, `district`
    /// first and then `location`.
    pub fn district_refs(&self) -> impl Iterator<Item = &str> {
        self.district.as_deref().into_iter().chain(self.location.as_deref())
    }

    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
