//! Render controller: owns the render options, the latest inputs and the
//! displayed frame, and decides when to compose.
//!
//! The controller is synchronous and clock-injected. An async driver asks
//! [`RenderController::schedule`] when to wake next and calls
//! [`RenderController::poll`] at that point; composition happens inside
//! `poll` on the latest inputs only.
//!
//! # States
//!
//! | State | Entered by | Composes |
//! |-------|------------|----------|
//! | `Uninitialized` | construction | no |
//! | `Placeholder` | [`mount`](RenderController::mount) | no (loading frame) |
//! | `Live` | first non-empty inputs | yes |
//! | `Paused` | [`pause`](RenderController::pause) | no, frame frozen |
//! | `TornDown` | [`teardown`](RenderController::teardown) | never again |

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use strata_types::{Agent, District};
use tracing::{debug, info};

use crate::composer;
use crate::frame::Frame;
use crate::options::{MAX_FPS, RenderOptions};

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// Not mounted yet.
    Uninitialized,
    /// Mounted, no data yet.
    Placeholder,
    /// Composing live frames.
    Live,
    /// Frame frozen until resume.
    Paused,
    /// Torn down; inert.
    TornDown,
}

/// What the driver should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Nothing pending; wait for new inputs or option changes.
    Idle,
    /// Compose now.
    Now,
    /// Compose at this instant (rate cap).
    At(Instant),
}

/// Serializable controller status for the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStatus {
    /// Lifecycle state.
    pub state: RenderState,
    /// Current options.
    pub options: RenderOptions,
    /// Frames composed since mount.
    pub frames_composed: u64,
    /// Whether inputs changed since the displayed frame.
    pub pending: bool,
}

/// Synchronous render state machine.
#[derive(Debug)]
pub struct RenderController {
    state: RenderState,
    resume_to: RenderState,
    options: RenderOptions,
    districts: Vec<District>,
    agents: Vec<Agent>,
    dirty: bool,
    frame: Option<Arc<Frame>>,
    last_composed: Option<Instant>,
    frames_composed: u64,
}

impl RenderController {
    /// Create an unmounted controller.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            state: RenderState::Uninitialized,
            resume_to: RenderState::Placeholder,
            options: options.sanitized(),
            districts: Vec::new(),
            agents: Vec::new(),
            dirty: false,
            frame: None,
            last_composed: None,
            frames_composed: 0,
        }
    }

    /// Current state.
    pub const fn state(&self) -> RenderState {
        self.state
    }

    /// Current options.
    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The displayed frame, once mounted.
    pub fn frame(&self) -> Option<Arc<Frame>> {
        self.frame.clone()
    }

    /// Status snapshot for the API.
    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            state: self.state,
            options: self.options.clone(),
            frames_composed: self.frames_composed,
            pending: self.dirty,
        }
    }

    /// Mount: show the placeholder frame. Inputs supplied before mounting
    /// are composed on the first poll.
    pub fn mount(&mut self) -> Option<Arc<Frame>> {
        if self.state != RenderState::Uninitialized {
            return None;
        }
        self.state = RenderState::Placeholder;
        let frame = Arc::new(Frame::placeholder(self.options.width, self.options.height));
        self.frame = Some(Arc::clone(&frame));
        debug!(width = self.options.width, height = self.options.height, "Render controller mounted");
        Some(frame)
    }

    /// Replace the inputs. Only the latest inputs are ever composed.
    pub fn update_data(&mut self, districts: Vec<District>, agents: Vec<Agent>) {
        if self.state == RenderState::TornDown {
            return;
        }
        self.districts = districts;
        self.agents = agents;
        self.dirty = true;
    }

    /// Freeze the displayed frame. Inputs keep being accepted.
    pub fn pause(&mut self) {
        if matches!(self.state, RenderState::Placeholder | RenderState::Live) {
            self.resume_to = self.state;
            self.state = RenderState::Paused;
            info!("Rendering paused");
        }
    }

    /// Unfreeze. Inputs received while paused are composed on the next poll.
    pub fn resume(&mut self) {
        if self.state == RenderState::Paused {
            self.state = self.resume_to;
            info!("Rendering resumed");
        }
    }

    /// Toggle the agent overlay.
    pub fn set_show_agents(&mut self, show: bool) {
        if self.options.show_agents != show {
            self.options.show_agents = show;
            self.dirty = true;
        }
    }

    /// Select a named ramp or a literal character sequence.
    pub fn set_glyph_ramp(&mut self, ramp: &str) {
        if self.options.glyph_ramp != ramp {
            ramp.clone_into(&mut self.options.glyph_ramp);
            self.dirty = true;
        }
    }

    /// Change the frame-rate cap, clamped to `[1, 60]`.
    pub fn set_target_fps(&mut self, fps: u32) {
        let fps = fps.clamp(1, MAX_FPS);
        if self.options.target_fps != fps {
            self.options.target_fps = fps;
            self.dirty = true;
        }
    }

    /// Change the agent cap.
    pub fn set_max_agents(&mut self, max_agents: usize) {
        if self.options.max_agents != max_agents {
            self.options.max_agents = max_agents;
            self.dirty = true;
        }
    }

    /// Replace all options at once.
    pub fn set_options(&mut self, options: RenderOptions) {
        let options = options.sanitized();
        if self.options != options {
            self.options = options;
            self.dirty = true;
        }
    }

    /// When the driver should poll next.
    pub fn schedule(&self) -> Schedule {
        if !self.dirty || !matches!(self.state, RenderState::Placeholder | RenderState::Live) {
            return Schedule::Idle;
        }
        match self.last_composed {
            Some(last) => Schedule::At(last + self.options.frame_interval()),
            None => Schedule::Now,
        }
    }

    /// Compose if inputs changed, the state allows it, and the rate cap
    /// has elapsed. Returns the new frame when one was produced.
    pub fn poll(&mut self, now: Instant) -> Option<Arc<Frame>> {
        if !self.dirty || !matches!(self.state, RenderState::Placeholder | RenderState::Live) {
            return None;
        }
        if let Some(last) = self.last_composed {
            if now < last + self.options.frame_interval() {
                return None;
            }
        }

        let has_data = !self.districts.is_empty() || !self.agents.is_empty();
        let frame = if has_data {
            if self.state == RenderState::Placeholder {
                info!(
                    districts = self.districts.len(),
                    agents = self.agents.len(),
                    "First simulation data received, rendering live"
                );
            }
            self.state = RenderState::Live;
            self.frames_composed = self.frames_composed.saturating_add(1);
            composer::compose_frame(&self.districts, &self.agents, &self.options)
        } else if self.state == RenderState::Placeholder {
            Frame::placeholder(self.options.width, self.options.height)
        } else {
            self.frames_composed = self.frames_composed.saturating_add(1);
            composer::compose_frame(&self.districts, &self.agents, &self.options)
        };

        self.dirty = false;
        self.last_composed = Some(now);
        let frame = Arc::new(frame);
        self.frame = Some(Arc::clone(&frame));
        Some(frame)
    }

    /// Stop for good: drop inputs and pending work. No composition
    /// happens afterwards.
    pub fn teardown(&mut self) {
        self.state = RenderState::TornDown;
        self.dirty = false;
        self.districts.clear();
        self.agents.clear();
        debug!("Render controller torn down");
    }
}
