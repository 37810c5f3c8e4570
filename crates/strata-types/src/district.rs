//! District records as reported by the simulation backend.
//!
//! Districts are read-only to the dashboard. Their order in the upstream
//! list is the left-to-right column order of the terrain view.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::lenient;

/// Normalize a metric that may arrive on a 0-1 or 0-100 scale.
///
/// Values above 1 are treated as percentages and divided by 100. The
/// result is clamped to `[0, 1]`; non-finite input maps to `0`.
pub fn normalize_unit(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let scaled = if raw > 1.0 { raw / 100.0 } else { raw };
    scaled.clamp(0.0, 1.0)
}

/// A named spatial region of the simulated world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct District {
    /// Upstream identifier (string or integer upstream).
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    /// Display name.
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    /// Primary tension-like metric, 0-1 or 0-100.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub tension: Option<f64>,
    /// Population count or ratio; fallback intensity source.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub population: Option<f64>,
    /// Food stock level; fallback intensity source.
    #[serde(default, alias = "food", deserialize_with = "lenient::opt_f64")]
    pub food_stock: Option<f64>,
    /// Named risk booleans (riot risk, migration risk, ...).
    #[serde(default, alias = "risks")]
    pub risk_flags: RiskFlags,
    /// Recent typed events affecting this district.
    #[serde(default, alias = "events", deserialize_with = "lenient::lossy_vec")]
    pub recent_events: Vec<RecentEvent>,
}

impl District {
    /// Create a district with a name and tension, mostly for tests and fixtures.
    pub fn new(id: impl Into<String>, name: impl Into<String>, tension: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tension: Some(tension),
            ..Self::default()
        }
    }

    /// Tension normalized to `[0, 1]`, if reported.
    pub fn tension_level(&self) -> Option<f64> {
        self.tension.map(normalize_unit)
    }

    /// Scalar driving terrain intensity.
    ///
    /// Tension when present, then food stock, then population; `0` when
    /// none are reported (terrain falls back to noise only).
    pub fn intensity(&self) -> f64 {
        self.tension
            .or(self.food_stock)
            .or(self.population)
            .map_or(0.0, normalize_unit)
    }

    /// Whether the district reports riot risk.
    pub fn riot_risk(&self) -> bool {
        self.risk_flags.is_set("riot_risk")
    }

    /// Whether the district reports migration risk.
    pub fn migration_risk(&self) -> bool {
        self.risk_flags.is_set("migration_risk")
    }

    /// Whether any recent event is a food shortage.
    pub fn has_food_shortage(&self) -> bool {
        self.recent_events.iter().any(RecentEvent::is_food_shortage)
    }
}

/// Named risk flags.
///
/// Keys are normalized (lower-cased, `_`/`-`/spaces removed) so that
/// `riot_risk`, `riotRisk` and `riot-risk` address the same flag. Values
/// that cannot be read as booleans are dropped. A non-object payload
/// yields no flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RiskFlags(BTreeMap<String, bool>);

impl RiskFlags {
    /// Build flags from an arbitrary JSON value.
    pub fn from_value(value: &Value) -> Self {
        let mut flags = BTreeMap::new();
        if let Value::Object(map) = value {
            for (key, raw) in map {
                if let Some(flag) = lenient::coerce_bool(raw) {
                    flags.insert(normalize_flag_key(key), flag);
                }
            }
        }
        Self(flags)
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, name: &str, value: bool) -> Self {
        self.0.insert(normalize_flag_key(name), value);
        self
    }

    /// Whether the named flag is present and `true`.
    pub fn is_set(&self, name: &str) -> bool {
        self.0
            .get(&normalize_flag_key(name))
            .copied()
            .unwrap_or(false)
    }

    /// Iterate over `(normalized name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<'de> Deserialize<'de> for RiskFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

fn normalize_flag_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// A typed event recently observed in a district.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentEvent {
    /// Event tag, e.g. `food_shortage`.
    #[serde(default, alias = "type", alias = "kind", deserialize_with = "lenient::string")]
    pub event_type: String,
    /// Free-form metadata attached upstream.
    #[serde(default)]
    pub metadata: Value,
}

impl RecentEvent {
    /// Create an event with the given tag and no metadata.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            metadata: Value::Null,
        }
    }

    /// Whether this event is a food shortage (`food_shortage`,
    /// `food-shortage`, `FoodShortage`, ...).
    pub fn is_food_shortage(&self) -> bool {
        normalize_flag_key(&self.event_type) == "foodshortage"
    }
}
