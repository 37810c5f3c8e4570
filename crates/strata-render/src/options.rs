//! Render options owned by the controller.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::glyph;

/// Upper bound for the frame-rate cap.
pub const MAX_FPS: u32 = 60;

/// Options applied on the next composition pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RenderOptions {
    /// Grid width in cells.
    #[serde(default = "default_width")]
    pub width: usize,
    /// Grid height in cells.
    #[serde(default = "default_height")]
    pub height: usize,
    /// Named ramp or a literal character sequence.
    #[serde(default = "default_glyph_ramp")]
    pub glyph_ramp: String,
    /// Whether agents are overlaid.
    #[serde(default = "default_true")]
    pub show_agents: bool,
    /// Frame-rate cap.
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// Maximum agents placed per frame.
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,
    /// Prefix district labels with their index digit.
    #[serde(default = "default_true")]
    pub show_index_prefix: bool,
}

const fn default_width() -> usize {
    120
}

const fn default_height() -> usize {
    36
}

fn default_glyph_ramp() -> String {
    "standard".to_owned()
}

const fn default_true() -> bool {
    true
}

const fn default_target_fps() -> u32 {
    10
}

const fn default_max_agents() -> usize {
    200
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            glyph_ramp: default_glyph_ramp(),
            show_agents: true,
            target_fps: default_target_fps(),
            max_agents: default_max_agents(),
            show_index_prefix: true,
        }
    }
}

impl RenderOptions {
    /// Clamp fps into `[1, MAX_FPS]` and grid dimensions to at least 1.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.width = self.width.max(1);
        self.height = self.height.max(1);
        self.target_fps = self.target_fps.clamp(1, MAX_FPS);
        self
    }

    /// Minimum time between two compositions: `1000 / target_fps` ms.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.target_fps.clamp(1, MAX_FPS)))
    }

    /// Characters of the selected ramp.
    pub fn ramp_chars(&self) -> Vec<char> {
        glyph::resolve_ramp(&self.glyph_ramp)
    }
}
