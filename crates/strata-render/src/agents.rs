//! Agent overlay: deterministic placement of a capped agent sample onto
//! the grid, and glyph selection per agent.

use std::collections::{BTreeMap, HashMap};

use strata_types::{Agent, District};

use crate::layout::DistrictLayout;
use crate::noise;

/// Glyph constants for agents.
pub mod glyphs {
    /// Agent reported dead.
    pub const DEAD: char = 'x';
    /// Alive, idle, nothing else known.
    pub const ALIVE: char = 'o';
    /// Alive with some current action.
    pub const ACTIVE: char = '@';
    /// Moving or travelling.
    pub const MOVING: char = '>';
    /// Working or building.
    pub const WORKING: char = '*';
    /// Resting or sleeping.
    pub const RESTING: char = 'z';
    /// Eating.
    pub const EATING: char = '%';
    /// Mood above 0.7.
    pub const HAPPY: char = '+';
    /// Mood below 0.1.
    pub const FEARFUL: char = '?';
    /// Mood below 0.3.
    pub const SAD: char = '-';

    /// Role glyphs, matched against the lower-cased role.
    pub const ROLES: &[(&str, char)] = &[
        ("leader", 'L'),
        ("trader", '$'),
        ("worker", 'w'),
        ("scout", '^'),
        ("builder", 'B'),
        ("farmer", 'f'),
        ("guard", 'G'),
        ("merchant", 'm'),
        ("artisan", 'a'),
        ("scholar", 's'),
        ("healer", 'h'),
        ("warrior", 'W'),
        ("diplomat", 'd'),
    ];
}

/// Top of the vertical placement range, as a fraction of height.
const TOP_FRACTION: f64 = 0.08;
/// Bottom of the vertical placement range, as a fraction of height.
const BOTTOM_FRACTION: f64 = 0.88;

/// A placed agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentCell {
    /// Glyph drawn at the cell.
    pub glyph: char,
    /// Mood, if reported.
    pub mood: Option<f64>,
    /// Alive state.
    pub alive: bool,
    /// District index the agent was placed in.
    pub district: usize,
    /// The agent itself.
    pub agent: Agent,
}

/// Placed agents keyed by `(x, y)`.
pub type AgentMap = BTreeMap<(usize, usize), AgentCell>;

/// Pick exactly `max` indices out of `len` with a uniform stride,
/// preserving order. Returns every index when `len <= max`.
pub fn stride_sample(len: usize, max: usize) -> Vec<usize> {
    if len <= max {
        return (0..len).collect();
    }
    (0..max)
        .map(|i| i.saturating_mul(len) / max.max(1))
        .collect()
}

/// Place up to `max_agents` agents on the grid.
///
/// Empty when there are no agents or no districts. Each agent is resolved
/// to a district through [`DistrictLookup`], trying `district` then
/// `location` and falling back to `index % district_count`, then given a hashed position inside that
/// district's interior band. Collisions keep the first agent placed.
pub fn create_agent_map(
    agents: &[Agent],
    width: usize,
    height: usize,
    districts: &[District],
    max_agents: usize,
) -> AgentMap {
    let mut map = AgentMap::new();
    if agents.is_empty() || districts.is_empty() || width == 0 || height == 0 {
        return map;
    }

    let layout = DistrictLayout::new(width, height, districts.len());
    let lookup = DistrictLookup::new(districts);

    for (index, agent_index) in stride_sample(agents.len(), max_agents).into_iter().enumerate() {
        let Some(agent) = agents.get(agent_index) else {
            continue;
        };
        let district = agent
            .district_refs()
            .find_map(|reference| lookup.resolve(reference))
            .unwrap_or(index % districts.len());
        let Some((x, y)) = place(&layout, index, district) else {
            continue;
        };
        map.entry((x, y)).or_insert_with(|| AgentCell {
            glyph: agent_glyph(agent),
            mood: agent.mood,
            alive: agent.is_alive(),
            district,
            agent: agent.clone(),
        });
    }
    map
}

/// Hashed cell for the `index`-th sampled agent within `district`.
/// `None` only on degenerate grids where the whole interior is boundary.
fn place(layout: &DistrictLayout, index: usize, district: usize) -> Option<(usize, usize)> {
    let (band_start, band_end) = layout.interior(district);
    let height = layout.height();

    let hash = noise::hash3(index as u64, district as u64, 0x5EED);
    let span = (band_end - band_start) as u64 + 1;
    #[allow(clippy::cast_possible_truncation)]
    let mut x = band_start + (hash % span) as usize;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (top, bottom) = (
        (height as f64 * TOP_FRACTION).floor() as usize,
        ((height as f64 * BOTTOM_FRACTION).floor() as usize).min(height.saturating_sub(1)),
    );
    let bottom = bottom.max(top);
    let rows = (bottom - top) as u64 + 1;
    #[allow(clippy::cast_possible_truncation)]
    let y = top + ((hash >> 32) % rows) as usize;

    if layout.is_boundary(x) {
        x = (x + 1).min(band_end);
    }
    if layout.is_boundary(x) {
        return None;
    }
    Some((x, y))
}

/// Glyph for an agent, first match wins: dead, role, action keyword,
/// mood, then active or idle.
pub fn agent_glyph(agent: &Agent) -> char {
    if !agent.is_alive() {
        return glyphs::DEAD;
    }

    if let Some(role) = agent.role.as_deref() {
        let role = role.trim().to_lowercase();
        if let Some((_, glyph)) = glyphs::ROLES.iter().find(|(name, _)| *name == role) {
            return *glyph;
        }
    }

    if let Some(action) = agent.current_action.as_deref() {
        let action = action.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| action.contains(w));
        if has(&["move", "travel"]) {
            return glyphs::MOVING;
        }
        if has(&["work", "build"]) {
            return glyphs::WORKING;
        }
        if has(&["rest", "sleep"]) {
            return glyphs::RESTING;
        }
        if has(&["eat", "meal"]) {
            return glyphs::EATING;
        }
    }

    if let Some(mood) = agent.mood {
        if mood > 0.7 {
            return glyphs::HAPPY;
        }
        if mood < 0.1 {
            return glyphs::FEARFUL;
        }
        if mood < 0.3 {
            return glyphs::SAD;
        }
    }

    if agent.current_action.is_some() {
        glyphs::ACTIVE
    } else {
        glyphs::ALIVE
    }
}

/// Fuzzy district name resolution.
///
/// Maps each district's id, full name, lower-cased name, and the part of
/// the name after the last `_` to its index. Later districts win on
/// duplicate keys.
#[derive(Debug, Clone, Default)]
pub struct DistrictLookup {
    names: HashMap<String, usize>,
}

impl DistrictLookup {
    /// Build the table.
    pub fn new(districts: &[District]) -> Self {
        let mut names = HashMap::new();
        for (index, district) in districts.iter().enumerate() {
            if !district.id.is_empty() {
                names.insert(district.id.clone(), index);
            }
            if district.name.is_empty() {
                continue;
            }
            names.insert(district.name.clone(), index);
            names.insert(district.name.to_lowercase(), index);
            if let Some((_, suffix)) = district.name.rsplit_once('_') {
                if !suffix.is_empty() {
                    names.insert(suffix.to_owned(), index);
                }
            }
        }
        Self { names }
    }

    /// Resolve a reference: exact match, then lower-cased.
    pub fn resolve(&self, reference: &str) -> Option<usize> {
        self.names
            .get(reference)
            .or_else(|| self.names.get(&reference.to_lowercase()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, district: &str) -> Agent {
        Agent::new(id, district)
    }

    #[test]
    fn stride_sample_is_exact() {
        assert_eq!(stride_sample(10, 4), vec![0, 2, 5, 7]);
        assert_eq!(stride_sample(3, 5), vec![0, 1, 2]);
        assert!(stride_sample(5, 0).is_empty());
        assert_eq!(stride_sample(500, 100).len(), 100);
    }

    #[test]
    fn glyph_priority() {
        let mut a = agent("a", "x");
        assert_eq!(agent_glyph(&a), glyphs::ALIVE);
        a.mood = Some(0.2);
        assert_eq!(agent_glyph(&a), glyphs::SAD);
        a.mood = Some(0.05);
        assert_eq!(agent_glyph(&a), glyphs::FEARFUL);
        a.current_action = Some("Travelling north".to_owned());
        assert_eq!(agent_glyph(&a), glyphs::MOVING);
        a.role = Some("Trader".to_owned());
        assert_eq!(agent_glyph(&a), '$');
        a.alive = Some(false);
        assert_eq!(agent_glyph(&a), glyphs::DEAD);
    }

    #[test]
    fn unknown_action_with_neutral_mood_is_active() {
        let mut a = agent("a", "x");
        a.current_action = Some("pondering".to_owned());
        a.mood = Some(0.5);
        assert_eq!(agent_glyph(&a), glyphs::ACTIVE);
    }

    #[test]
    fn lookup_is_fuzzy() {
        let districts = vec![
            District::new("d-1", "North_Market", 0.2),
            District::new("d-2", "Harbor", 0.4),
        ];
        let lookup = DistrictLookup::new(&districts);
        assert_eq!(lookup.resolve("d-1"), Some(0));
        assert_eq!(lookup.resolve("Market"), Some(0));
        assert_eq!(lookup.resolve("harbor"), Some(1));
        assert_eq!(lookup.resolve("HARBOR"), Some(1));
        assert_eq!(lookup.resolve("nowhere"), None);
    }

    #[test]
    fn agents_land_inside_their_band() {
        let districts = vec![District::new("a", "Alpha", 0.2), District::new("b", "Beta", 0.4)];
        let agents: Vec<Agent> = (0..40).map(|i| agent(&format!("a{i}"), "Beta")).collect();
        let map = create_agent_map(&agents, 40, 20, &districts, 100);
        assert!(!map.is_empty());
        for (&(x, y), cell) in &map {
            assert_eq!(cell.district, 1);
            assert!((21..=39).contains(&x));
            assert!((1..=17).contains(&y));
        }
    }

    #[test]
    fn unresolved_agents_fall_back_round_robin() {
        let districts = vec![District::new("a", "Alpha", 0.2), District::new("b", "Beta", 0.4)];
        let agents = vec![agent("a0", "Nowhere"), agent("a1", "Nowhere")];
        let map = create_agent_map(&agents, 40, 20, &districts, 10);
        let mut placed: Vec<usize> = map.values().map(|c| c.district).collect();
        placed.sort_unstable();
        assert_eq!(placed, vec![0, 1]);
    }

    #[test]
    fn location_resolves_when_district_does_not() {
        let districts = vec![District::new("a", "Alpha", 0.2), District::new("b", "Beta", 0.4)];
        let agents: Vec<Agent> = (0..6)
            .map(|i| Agent {
                location: Some("Beta".to_owned()),
                ..agent(&format!("a{i}"), "Nowhere")
            })
            .collect();
        let map = create_agent_map(&agents, 40, 20, &districts, 10);
        assert!(!map.is_empty());
        assert!(map.values().all(|cell| cell.district == 1));
    }

    #[test]
    fn nothing_to_place() {
        let districts = vec![District::new("a", "Alpha", 0.2)];
        assert!(create_agent_map(&[], 10, 10, &districts, 5).is_empty());
        assert!(create_agent_map(&[agent("a", "Alpha")], 10, 10, &[], 5).is_empty());
    }
}
