//! Frame composition.
//!
//! Merges the heightmap, the agent overlay, the district label row and
//! event markers into rows of run-length batched segments, plus a tooltip
//! entry for every cell. Each cell is classified by the first matching
//! rule:
//!
//! | Priority | Rule | Colour | Intensity |
//! |----------|------|--------|-----------|
//! | 1 | boundary column | `boundary` | 0.8 |
//! | 2 | placed agent | `agent` / `dead` | 1.0 |
//! | 3 | label character (row 1) | `label` | 1.0 |
//! | 4 | event marker | `event` | 1.0 |
//! | 5 | terrain (index hint in rows 0-1) | `high` / `medium` / `low` | row brightness |

use std::collections::BTreeMap;

use strata_types::{Agent, District};
use tracing::trace;

use crate::agents::{self, AgentCell, AgentMap};
use crate::depth;
use crate::frame::{CellMeta, ColorType, Frame, FrameStats, Row, Segment, cell_key};
use crate::glyph;
use crate::heightmap::{self, GridCell};
use crate::layout::DistrictLayout;
use crate::options::RenderOptions;

/// Row carrying district labels.
pub const LABEL_ROW: usize = 1;

/// Characters cycled through for boundary columns, keyed by `x % 3`.
pub const BOUNDARY_GLYPHS: [char; 3] = ['│', '┃', '║'];
/// Terrain above 0.95.
pub const SOLID_GLYPH: char = '█';
/// Terrain above 0.85.
pub const DENSE_GLYPH: char = '▓';

/// Event marker glyphs.
pub mod event_glyphs {
    /// Riot risk.
    pub const RIOT: char = '!';
    /// Food shortage.
    pub const FOOD_SHORTAGE: char = '~';
    /// Migration risk.
    pub const MIGRATION: char = '»';
    /// High tension without riot risk.
    pub const WARNING: char = '▲';
}

const BOUNDARY_INTENSITY: f64 = 0.8;
const HINT_INTENSITY: f64 = 0.6;
const HINT_MODULUS: usize = 25;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Compose one frame from the current districts and agents.
///
/// Pure and deterministic: identical inputs give identical frames.
pub fn compose_frame(districts: &[District], agents: &[Agent], options: &RenderOptions) -> Frame {
    let width = options.width;
    let height = options.height;

    let heightmap = heightmap::generate(districts, width, height);
    let agent_map = if options.show_agents {
        agents::create_agent_map(agents, width, height, districts, options.max_agents)
    } else {
        AgentMap::new()
    };

    let composition = Composition {
        districts,
        agent_map: &agent_map,
        labels: build_labels(districts, heightmap.layout(), options.show_index_prefix),
        markers: build_markers(districts, heightmap.layout()),
        ramp: options.ramp_chars(),
        width,
    };

    let mut metadata = BTreeMap::new();
    let rows = heightmap
        .rows()
        .iter()
        .enumerate()
        .map(|(y, cells)| {
            let brightness = depth::row_brightness(y, height);
            let mut batcher = SegmentBatcher::default();
            for cell in cells {
                let styled = composition.classify(cell, brightness);
                batcher.push(cell.x, styled.glyph, styled.color_type, styled.intensity);
                metadata.insert(
                    cell_key(cell.x, cell.y),
                    CellMeta {
                        tooltip: styled.tooltip,
                        color_type: styled.color_type,
                        value: cell.value,
                        district: cell
                            .district
                            .and_then(|index| districts.get(index))
                            .map(|d| display_name(d).to_owned()),
                        agent_id: styled.agent_id,
                    },
                );
            }
            Row {
                y,
                segments: batcher.finish(),
                depth: brightness,
                perspective: depth::row_perspective(y, height),
            }
        })
        .collect();

    let stats = FrameStats {
        district_count: districts.len(),
        agent_count: agents.len(),
        visible_agents: agent_map.len(),
    };
    trace!(
        width,
        height,
        districts = stats.district_count,
        agents = stats.agent_count,
        visible = stats.visible_agents,
        "Frame composed"
    );

    Frame {
        width,
        height,
        rows,
        metadata,
        stats,
        placeholder: false,
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

struct Marker {
    glyph: char,
    tooltip: String,
}

struct Styled {
    glyph: char,
    color_type: ColorType,
    intensity: f64,
    tooltip: String,
    agent_id: Option<String>,
}

impl Styled {
    const fn new(glyph: char, color_type: ColorType, intensity: f64, tooltip: String) -> Self {
        Self {
            glyph,
            color_type,
            intensity,
            tooltip,
            agent_id: None,
        }
    }
}

struct Composition<'a> {
    districts: &'a [District],
    agent_map: &'a AgentMap,
    labels: BTreeMap<usize, (char, usize)>,
    markers: BTreeMap<(usize, usize), Marker>,
    ramp: Vec<char>,
    width: usize,
}

impl Composition<'_> {
    fn classify(&self, cell: &GridCell, brightness: f64) -> Styled {
        let (x, y) = (cell.x, cell.y);

        if cell.boundary {
            let glyph = BOUNDARY_GLYPHS
                .get(x % BOUNDARY_GLYPHS.len())
                .copied()
                .unwrap_or('|');
            return Styled::new(
                glyph,
                ColorType::Boundary,
                BOUNDARY_INTENSITY,
                "District Boundary".to_owned(),
            );
        }

        if let Some(placed) = self.agent_map.get(&(x, y)) {
            let color_type = if placed.alive {
                ColorType::Agent
            } else {
                ColorType::Dead
            };
            return Styled {
                agent_id: Some(placed.agent.id.clone()),
                ..Styled::new(placed.glyph, color_type, 1.0, agent_tooltip(placed))
            };
        }

        if y == LABEL_ROW {
            if let Some(&(glyph, index)) = self.labels.get(&x) {
                return Styled::new(glyph, ColorType::Label, 1.0, self.label_tooltip(index));
            }
        }

        if let Some(marker) = self.markers.get(&(x, y)) {
            return Styled::new(marker.glyph, ColorType::Event, 1.0, marker.tooltip.clone());
        }

        self.terrain(cell, brightness)
    }

    fn terrain(&self, cell: &GridCell, brightness: f64) -> Styled {
        let value = cell.value;
        let owner = cell.district.and_then(|index| {
            self.districts
                .get(index)
                .map(|district| (index, display_name(district)))
        });

        if let Some((index, name)) = owner {
            let position = cell.x.saturating_add(cell.y.saturating_mul(self.width));
            if cell.y <= LABEL_ROW && value < 0.3 && position % HINT_MODULUS == 0 {
                let digit = u32::try_from(index % 10)
                    .ok()
                    .and_then(|d| char::from_digit(d, 10))
                    .unwrap_or('0');
                return Styled::new(
                    digit,
                    ColorType::Label,
                    HINT_INTENSITY,
                    format!("District {index}: {name}"),
                );
            }
        }

        let glyph = if value > 0.95 {
            SOLID_GLYPH
        } else if value > 0.85 {
            DENSE_GLYPH
        } else if value < 0.05 {
            ' '
        } else {
            glyph::glyph_for(value, &self.ramp)
        };
        let tooltip = owner.map_or_else(
            || format!("Open terrain | intensity {value:.2}"),
            |(_, name)| format!("{name} | intensity {value:.2}"),
        );
        Styled::new(glyph, ColorType::for_terrain(value), brightness, tooltip)
    }

    fn label_tooltip(&self, index: usize) -> String {
        let Some(district) = self.districts.get(index) else {
            return String::new();
        };
        district.tension_level().map_or_else(
            || format!("{} | no tension data", display_name(district)),
            |tension| format!("{} | tension {:.0}%", display_name(district), tension * 100.0),
        )
    }
}

fn display_name(district: &District) -> &str {
    if district.name.is_empty() {
        &district.id
    } else {
        &district.name
    }
}

fn agent_tooltip(placed: &AgentCell) -> String {
    let agent = &placed.agent;
    let mood = placed
        .mood
        .map_or_else(|| "n/a".to_owned(), |mood| format!("{mood:.2}"));
    let mut tooltip = format!(
        "{} | role: {} | mood: {mood} | action: {}",
        agent.display_name(),
        agent.role.as_deref().unwrap_or("unknown"),
        agent.current_action.as_deref().unwrap_or("idle"),
    );
    if !placed.alive {
        tooltip.push_str(" | dead");
    }
    tooltip
}

// ---------------------------------------------------------------------------
// Labels and markers
// ---------------------------------------------------------------------------

/// Label characters for [`LABEL_ROW`], keyed by column, with the owning
/// district index.
///
/// Each label is `{index}{NAME}` (upper-cased) plus `!` above 80% tension,
/// written from two columns into the band and truncated to
/// `band_width - 3` characters.
fn build_labels(
    districts: &[District],
    layout: &DistrictLayout,
    show_index_prefix: bool,
) -> BTreeMap<usize, (char, usize)> {
    let mut labels = BTreeMap::new();
    if layout.height() <= LABEL_ROW {
        return labels;
    }
    for (index, district) in districts.iter().enumerate() {
        let (start, end) = layout.band(index);
        let max_len = end.saturating_sub(start).saturating_sub(3);
        let mut text = String::new();
        if show_index_prefix {
            text.push_str(&index.to_string());
        }
        text.push_str(&display_name(district).to_uppercase());
        if district.tension_level().is_some_and(|t| t > 0.8) {
            text.push('!');
        }
        for (offset, glyph) in text.chars().take(max_len).enumerate() {
            let x = start + 2 + offset;
            if x < layout.width() {
                labels.insert(x, (glyph, index));
            }
        }
    }
    labels
}

/// Event markers keyed by cell, placed at fixed offsets inside each
/// district band. The first marker written to a cell wins.
fn build_markers(districts: &[District], layout: &DistrictLayout) -> BTreeMap<(usize, usize), Marker> {
    let mut markers = BTreeMap::new();
    let height = layout.height();
    if height == 0 || layout.width() == 0 {
        return markers;
    }
    let row_at = |fraction: f64| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let row = (height as f64 * fraction).floor() as usize;
        row.min(height - 1)
    };

    for (index, district) in districts.iter().enumerate() {
        let (start, end) = layout.band(index);
        if end <= start {
            continue;
        }
        let last = end - 1;
        let center = layout.center(index);
        let name = display_name(district);
        let mut place = |dx: isize, fraction: f64, glyph: char, tooltip: String| {
            let x = center.saturating_add_signed(dx).clamp(start, last);
            markers
                .entry((x, row_at(fraction)))
                .or_insert(Marker { glyph, tooltip });
        };

        let riot = district.riot_risk();
        if riot {
            place(0, 0.3, event_glyphs::RIOT, format!("Riot risk: {name}"));
        }
        if district.has_food_shortage() {
            place(-2, 0.5, event_glyphs::FOOD_SHORTAGE, format!("Food shortage: {name}"));
        }
        if district.migration_risk() {
            place(2, 0.7, event_glyphs::MIGRATION, format!("Migration risk: {name}"));
        }
        if !riot && district.tension_level().is_some_and(|t| t > 0.7) {
            place(1, 0.4, event_glyphs::WARNING, format!("High tension: {name}"));
        }
    }
    markers
}

// ---------------------------------------------------------------------------
// Segment batching
// ---------------------------------------------------------------------------

/// Run-length batches cells sharing `(color_type, floor(intensity * 3))`.
/// Boundary cells are always emitted as their own segment.
#[derive(Default)]
struct SegmentBatcher {
    segments: Vec<Segment>,
    open: Option<(Segment, i64)>,
}

impl SegmentBatcher {
    fn push(&mut self, x: usize, glyph: char, color_type: ColorType, intensity: f64) {
        let single = Segment {
            x,
            text: glyph.to_string(),
            color_type,
            intensity,
        };
        if color_type == ColorType::Boundary {
            self.flush();
            self.segments.push(single);
            return;
        }

        #[allow(clippy::cast_possible_truncation)]
        let bucket = (intensity * 3.0).floor() as i64;
        if let Some((segment, key)) = &mut self.open {
            if segment.color_type == color_type && *key == bucket {
                segment.text.push(glyph);
                return;
            }
        }
        self.flush();
        self.open = Some((single, bucket));
    }

    fn flush(&mut self) {
        if let Some((segment, _)) = self.open.take() {
            self.segments.push(segment);
        }
    }

    fn finish(mut self) -> Vec<Segment> {
        self.flush();
        self.segments
    }
}
