//! The frame contract handed to the view.
//!
//! A [`Frame`] is built once by the composer and never mutated; the next
//! frame replaces it wholesale. TypeScript bindings are generated with
//! `ts-rs` so the browser view and the server agree on the shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::depth::{self, Perspective};

/// Styling class of a cell or segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ColorType {
    /// District boundary column.
    Boundary,
    /// Living agent.
    Agent,
    /// Dead agent.
    Dead,
    /// District label or index hint.
    Label,
    /// Event indicator.
    Event,
    /// Terrain above 0.7.
    High,
    /// Terrain above 0.4.
    Medium,
    /// Terrain at or below 0.4.
    Low,
}

impl ColorType {
    /// Terrain class for a scalar value.
    pub fn for_terrain(value: f64) -> Self {
        if value > 0.7 {
            Self::High
        } else if value > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A run of consecutive same-styled characters in one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Segment {
    /// Column of the first character.
    pub x: usize,
    /// The characters.
    pub text: String,
    /// Styling class.
    pub color_type: ColorType,
    /// Intensity of the first cell in the run, `[0, 1]`.
    pub intensity: f64,
}

impl Segment {
    /// Number of grid cells covered.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the segment is empty (never true for composed frames).
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Row {
    /// Row index, 0 is the far edge.
    pub y: usize,
    /// Segments left to right.
    pub segments: Vec<Segment>,
    /// Brightness multiplier for this row.
    pub depth: f64,
    /// View transform for this row.
    pub perspective: Perspective,
}

impl Row {
    /// Concatenated row text.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Hover tooltip data for one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CellMeta {
    /// Tooltip text.
    pub tooltip: String,
    /// Styling class of the cell.
    pub color_type: ColorType,
    /// Terrain value under the cell.
    pub value: f64,
    /// Name of the owning district.
    pub district: Option<String>,
    /// Agent at the cell.
    pub agent_id: Option<String>,
}

/// Aggregate frame statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FrameStats {
    /// Districts supplied.
    pub district_count: usize,
    /// Agents supplied.
    pub agent_count: usize,
    /// Agents actually placed after sampling and collisions.
    pub visible_agents: usize,
}

/// One immutable composed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Frame {
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    /// Rows, far to near.
    pub rows: Vec<Row>,
    /// Tooltip metadata keyed by `"x,y"`.
    pub metadata: BTreeMap<String, CellMeta>,
    /// Aggregate stats.
    pub stats: FrameStats,
    /// True for the "no data yet" frame.
    pub placeholder: bool,
}

/// Metadata key for a cell.
pub fn cell_key(x: usize, y: usize) -> String {
    format!("{x},{y}")
}

/// Message shown until the first data arrives.
pub const LOADING_MESSAGE: &str = "Waiting for simulation data...";

impl Frame {
    /// Tooltip metadata at `(x, y)`.
    pub fn cell(&self, x: usize, y: usize) -> Option<&CellMeta> {
        self.metadata.get(&cell_key(x, y))
    }

    /// Plain text of every row.
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(Row::text).collect()
    }

    /// The "no data yet" frame: blank terrain with a centred loading
    /// message.
    pub fn placeholder(width: usize, height: usize) -> Self {
        let message: Vec<char> = LOADING_MESSAGE.chars().take(width).collect();
        let message_row = height / 2;
        let message_start = width.saturating_sub(message.len()) / 2;
        let mut metadata = BTreeMap::new();

        let rows = (0..height)
            .map(|y| {
                let mut segments = Vec::new();
                let brightness = depth::row_brightness(y, height);
                if y == message_row && !message.is_empty() {
                    push_blank(&mut segments, 0, message_start, brightness);
                    segments.push(Segment {
                        x: message_start,
                        text: message.iter().collect(),
                        color_type: ColorType::Label,
                        intensity: 1.0,
                    });
                    let tail = message_start + message.len();
                    push_blank(&mut segments, tail, width.saturating_sub(tail), brightness);
                } else {
                    push_blank(&mut segments, 0, width, brightness);
                }
                for x in 0..width {
                    metadata.insert(
                        cell_key(x, y),
                        CellMeta {
                            tooltip: LOADING_MESSAGE.to_owned(),
                            color_type: ColorType::Low,
                            value: 0.0,
                            district: None,
                            agent_id: None,
                        },
                    );
                }
                Row {
                    y,
                    segments,
                    depth: brightness,
                    perspective: depth::row_perspective(y, height),
                }
            })
            .collect();

        Self {
            width,
            height,
            rows,
            metadata,
            stats: FrameStats::default(),
            placeholder: true,
        }
    }
}

fn push_blank(segments: &mut Vec<Segment>, x: usize, len: usize, intensity: f64) {
    if len > 0 {
        segments.push(Segment {
            x,
            text: " ".repeat(len),
            color_type: ColorType::Low,
            intensity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_covers_grid() {
        let frame = Frame::placeholder(40, 7);
        assert!(frame.placeholder);
        assert_eq!(frame.rows.len(), 7);
        for row in &frame.rows {
            assert_eq!(row.text().chars().count(), 40);
        }
        assert!(frame.lines().get(3).is_some_and(|l| l.contains(LOADING_MESSAGE)));
        assert_eq!(frame.metadata.len(), 280);
    }

    #[test]
    fn placeholder_truncates_message() {
        let frame = Frame::placeholder(5, 1);
        assert_eq!(frame.lines(), vec!["Waiti".to_owned()]);
    }

    #[test]
    fn terrain_classes() {
        assert_eq!(ColorType::for_terrain(0.71), ColorType::High);
        assert_eq!(ColorType::for_terrain(0.7), ColorType::Medium);
        assert_eq!(ColorType::for_terrain(0.4), ColorType::Low);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_value(ColorType::Boundary).unwrap_or_default();
        assert_eq!(json, "boundary");
    }
}
