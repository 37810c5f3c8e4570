//! ASCII terrain rendering for the Strata dashboard.
//!
//! Turns the latest districts and agents into an immutable [`Frame`]:
//! rows of styled, run-length batched character segments plus a tooltip
//! entry for every cell. Everything here is synchronous, deterministic and
//! free of I/O.
//!
//! # Pipeline
//!
//! ```text
//! districts ──► heightmap ──┐
//!                           ├──► composer ──► Frame
//! agents ─────► overlay ────┘
//! ```
//!
//! The heightmap and the overlay share one [`DistrictLayout`], so boundary
//! columns agree between the two passes. The [`RenderController`] decides
//! when composition runs (latest inputs only, capped frame rate, pause).

pub mod agents;
pub mod composer;
pub mod controller;
pub mod depth;
pub mod frame;
pub mod glyph;
pub mod heightmap;
pub mod layout;
pub mod noise;
pub mod options;

pub use agents::{AgentCell, AgentMap, create_agent_map};
pub use composer::compose_frame;
pub use controller::{ControllerStatus, RenderController, RenderState, Schedule};
pub use depth::{Perspective, row_brightness, row_perspective};
pub use frame::{CellMeta, ColorType, Frame, FrameStats, Row, Segment, cell_key};
pub use glyph::{glyph_for, resolve_ramp};
pub use heightmap::{GridCell, Heightmap, generate};
pub use layout::DistrictLayout;
pub use options::RenderOptions;
