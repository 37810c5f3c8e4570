//! The dashboard's view of the latest simulation state, the updates that
//! modify it, and the control commands forwarded upstream.

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::district::District;
use crate::panels::{CausalLink, EmotionReading, Rule, SimulationEvent, SimulationStatus};

/// Latest value of every upstream collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationData {
    /// Districts in upstream order (= left-to-right layout order).
    pub districts: Vec<District>,
    /// Agents in upstream order (= stride-sampling order).
    pub agents: Vec<Agent>,
    /// Event log.
    pub events: Vec<SimulationEvent>,
    /// Causality graph edges.
    pub causality: Vec<CausalLink>,
    /// Emotion readings.
    pub emotions: Vec<EmotionReading>,
    /// Rules.
    pub rules: Vec<Rule>,
    /// Run status, once reported.
    pub status: Option<SimulationStatus>,
}

impl SimulationData {
    /// Whether any render input (districts or agents) is present.
    pub fn has_render_input(&self) -> bool {
        !self.districts.is_empty() || !self.agents.is_empty()
    }

    /// Apply an update. List updates replace the affected collection
    /// wholesale; single-record updates replace or append by `id`.
    ///
    /// Returns `true` when districts or agents actually changed, i.e.
    /// when a new frame must be composed.
    pub fn apply(&mut self, update: SnapshotUpdate) -> bool {
        match update {
            SnapshotUpdate::Districts(districts) => replace(&mut self.districts, districts),
            SnapshotUpdate::Agents(agents) => replace(&mut self.agents, agents),
            SnapshotUpdate::UpsertDistrict(district) => {
                upsert(&mut self.districts, *district, |d| d.id.as_str())
            }
            SnapshotUpdate::UpsertAgent(agent) => upsert(&mut self.agents, *agent, |a| a.id.as_str()),
            SnapshotUpdate::Events(events) => {
                self.events = events;
                false
            }
            SnapshotUpdate::Causality(links) => {
                self.causality = links;
                false
            }
            SnapshotUpdate::Emotions(readings) => {
                self.emotions = readings;
                false
            }
            SnapshotUpdate::Rules(rules) => {
                self.rules = rules;
                false
            }
            SnapshotUpdate::Status(status) => {
                self.status = Some(status);
                false
            }
            SnapshotUpdate::Full(snapshot) => {
                let Snapshot {
                    districts,
                    agents,
                    events,
                    causality,
                    emotions,
                    rules,
                    status,
                } = *snapshot;
                // Absent panels keep their last known value.
                if let Some(events) = events {
                    self.events = events;
                }
                if let Some(causality) = causality {
                    self.causality = causality;
                }
                if let Some(emotions) = emotions {
                    self.emotions = emotions;
                }
                if let Some(rules) = rules {
                    self.rules = rules;
                }
                if status.is_some() {
                    self.status = status;
                }
                let districts_changed = replace(&mut self.districts, districts);
                let agents_changed = replace(&mut self.agents, agents);
                districts_changed || agents_changed
            }
        }
    }
}

/// A full snapshot from a poll or a snapshot message.
///
/// Districts and agents are always present. A panel is `None` when it
/// could not be fetched or was not part of the message, and applying the
/// snapshot then leaves that panel untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Districts in layout order.
    pub districts: Vec<District>,
    /// Agents in sampling order.
    pub agents: Vec<Agent>,
    /// Event log, if known.
    pub events: Option<Vec<SimulationEvent>>,
    /// Causality edges, if known.
    pub causality: Option<Vec<CausalLink>>,
    /// Emotion readings, if known.
    pub emotions: Option<Vec<EmotionReading>>,
    /// Rules, if known.
    pub rules: Option<Vec<Rule>>,
    /// Run status, if known.
    pub status: Option<SimulationStatus>,
}

impl From<SimulationData> for Snapshot {
    fn from(data: SimulationData) -> Self {
        Self {
            districts: data.districts,
            agents: data.agents,
            events: Some(data.events),
            causality: Some(data.causality),
            emotions: Some(data.emotions),
            rules: Some(data.rules),
            status: data.status,
        }
    }
}

fn replace<T: PartialEq>(slot: &mut Vec<T>, next: Vec<T>) -> bool {
    if *slot == next {
        return false;
    }
    *slot = next;
    true
}

fn upsert<T, F>(slot: &mut Vec<T>, record: T, id: F) -> bool
where
    T: PartialEq,
    F: Fn(&T) -> &str,
{
    let index = slot.iter().position(|existing| id(existing) == id(&record));
    match index.and_then(|i| slot.get_mut(i)) {
        Some(existing) if *existing == record => false,
        Some(existing) => {
            *existing = record;
            true
        }
        None => {
            slot.push(record);
            true
        }
    }
}

/// A single change to the simulation data, from a push message or poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotUpdate {
    /// Replace the district list.
    Districts(Vec<District>),
    /// Replace the agent list.
    Agents(Vec<Agent>),
    /// Replace one district by `id`, or append it.
    UpsertDistrict(Box<District>),
    /// Replace one agent by `id`, or append it.
    UpsertAgent(Box<Agent>),
    /// Replace the event log.
    Events(Vec<SimulationEvent>),
    /// Replace the causality edges.
    Causality(Vec<CausalLink>),
    /// Replace the emotion readings.
    Emotions(Vec<EmotionReading>),
    /// Replace the rule list.
    Rules(Vec<Rule>),
    /// Replace the run status.
    Status(SimulationStatus),
    /// Replace districts and agents, and every panel that is present.
    Full(Box<Snapshot>),
}

impl SnapshotUpdate {
    /// Short name for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Districts(_) => "districts",
            Self::Agents(_) => "agents",
            Self::UpsertDistrict(_) => "district",
            Self::UpsertAgent(_) => "agent",
            Self::Events(_) => "events",
            Self::Causality(_) => "causality",
            Self::Emotions(_) => "emotions",
            Self::Rules(_) => "rules",
            Self::Status(_) => "status",
            Self::Full(_) => "full",
        }
    }
}

/// Control commands forwarded opaquely to the simulation backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Pause the simulation.
    Pause,
    /// Resume the simulation.
    Resume,
    /// Change the simulation speed multiplier.
    SetSpeed {
        /// New speed multiplier.
        speed: f64,
    },
}

impl ControlCommand {
    /// Path segment under the upstream control prefix.
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::SetSpeed { .. } => "speed",
        }
    }
}
