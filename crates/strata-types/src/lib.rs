//! Shared type definitions for the Strata simulation dashboard.
//!
//! The simulation backend is an external process. Everything it reports
//! is modelled here as plain data with permissive deserialization: absent
//! or malformed fields fall back to documented defaults instead of
//! rejecting the record.
//!
//! # Modules
//!
//! - [`district`] -- districts, risk flags and recent events
//! - [`agent`] -- agents
//! - [`panels`] -- events, causality, emotions, rules, status
//! - [`snapshot`] -- aggregated [`SimulationData`], updates, control commands
//! - [`lenient`] -- coercing field deserializers

pub mod agent;
pub mod district;
pub mod lenient;
pub mod panels;
pub mod snapshot;

pub use agent::Agent;
pub use district::{District, RecentEvent, RiskFlags, normalize_unit};
pub use panels::{CausalLink, EmotionReading, Rule, SimulationEvent, SimulationStatus};
pub use snapshot::{ControlCommand, SimulationData, Snapshot, SnapshotUpdate};
