//! Property and scenario tests for frame composition.
//!
//! Everything here goes through the public API only: build inputs, compose
//! a frame, and check the invariants the view relies on.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use strata_render::agents::{glyphs, stride_sample};
use strata_render::{
    ColorType, RenderController, RenderOptions, RenderState, compose_frame, create_agent_map,
    generate, glyph_for, resolve_ramp,
};
use strata_types::{Agent, District, RecentEvent, RiskFlags};

const ROLES: [&str; 5] = ["leader", "Trader", "farmer", "nobody", "GUARD"];

fn options(width: usize, height: usize) -> RenderOptions {
    RenderOptions {
        width,
        height,
        ..RenderOptions::default()
    }
}

fn districts(count: usize) -> Vec<District> {
    (0..count)
        .map(|i| {
            let mut district =
                District::new(format!("d{i}"), format!("Ward_{i}"), (i * 37 % 100) as f64);
            if i % 3 == 0 {
                district.risk_flags = RiskFlags::default().with("riot_risk", true);
            }
            if i % 4 == 1 {
                district.recent_events.push(RecentEvent::new("food_shortage"));
            }
            district
        })
        .collect()
}

fn agents(count: usize, district_count: usize) -> Vec<Agent> {
    (0..count)
        .map(|i| {
            let mut agent = Agent::new(format!("agent-{i}"), format!("ward_{}", i % district_count.max(1)));
            agent.role = ROLES.get(i % ROLES.len()).map(|r| (*r).to_owned());
            agent.mood = Some((i % 10) as f64 / 10.0);
            agent.alive = Some(i % 7 != 0);
            agent
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[test]
fn composition_is_deterministic() {
    let districts = districts(4);
    let agents = agents(120, 4);
    let opts = options(100, 30);
    let first = serde_json::to_string(&compose_frame(&districts, &agents, &opts)).unwrap_or_default();
    let second = serde_json::to_string(&compose_frame(&districts, &agents, &opts)).unwrap_or_default();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn segments_cover_every_column() {
    for (width, height, count) in [(10, 5, 1), (37, 9, 3), (100, 30, 6), (7, 3, 12), (120, 36, 0)] {
        let frame = compose_frame(&districts(count), &agents(50, count), &options(width, height));
        assert_eq!(frame.rows.len(), height);
        for row in &frame.rows {
            assert_eq!(row.text().chars().count(), width, "{width}x{height}/{count}");
            let mut next_x = 0;
            for segment in &row.segments {
                assert_eq!(segment.x, next_x);
                assert!(!segment.is_empty());
                next_x += segment.len();
            }
        }
    }
}

#[test]
fn every_cell_has_tooltip_metadata() {
    let frame = compose_frame(&districts(5), &agents(80, 5), &options(60, 20));
    assert_eq!(frame.metadata.len(), 60 * 20);
    for y in 0..20 {
        for x in 0..60 {
            assert!(frame.cell(x, y).is_some_and(|m| !m.tooltip.is_empty()), "{x},{y}");
        }
    }
}

#[test]
fn agents_never_sit_on_boundary_columns() {
    for width in [12, 25, 40, 99, 131] {
        for count in 1..9 {
            let districts = districts(count);
            let heightmap = generate(&districts, width, 20);
            let boundaries: BTreeSet<usize> = heightmap.boundaries().iter().copied().collect();
            let map = create_agent_map(&agents(300, count), width, 20, &districts, 300);
            for &(x, _) in map.keys() {
                assert!(!boundaries.contains(&x), "agent on boundary {x} ({width}/{count})");
            }
        }
    }
}

#[test]
fn boundary_cells_are_single_segments() {
    let frame = compose_frame(&districts(4), &[], &options(40, 6));
    for row in &frame.rows {
        let boundary: Vec<usize> = row
            .segments
            .iter()
            .filter(|s| s.color_type == ColorType::Boundary)
            .map(|s| {
                assert_eq!(s.len(), 1);
                s.x
            })
            .collect();
        assert_eq!(boundary, vec![10, 20, 30]);
    }
    let column: BTreeSet<String> = (0..6)
        .filter_map(|y| frame.rows.get(y).map(|r| r.text().chars().nth(20).unwrap_or(' ').to_string()))
        .collect();
    assert_eq!(column.len(), 1);
}

#[test]
fn ramp_choice_never_changes_the_field() {
    let districts = districts(3);
    let standard = compose_frame(&districts, &[], &options(45, 12));
    let blocks = compose_frame(
        &districts,
        &[],
        &RenderOptions {
            glyph_ramp: "blocks".to_owned(),
            ..options(45, 12)
        },
    );
    for (key, meta) in &standard.metadata {
        let other = blocks.metadata.get(key).map(|m| m.value.to_bits());
        assert_eq!(Some(meta.value.to_bits()), other);
    }
}

#[test]
fn literal_ramp_is_monotone() {
    let ramp = resolve_ramp("abcdefgh");
    let mut previous = 0;
    for step in 0..=100 {
        let glyph = glyph_for(f64::from(step) / 100.0, &ramp);
        let index = ramp.iter().position(|&c| c == glyph).unwrap_or(0);
        assert!(index >= previous);
        previous = index;
    }
}

#[test]
fn placed_agents_are_the_stride_sample() {
    let districts = districts(5);
    let agents = agents(500, 5);
    let map = create_agent_map(&agents, 100, 30, &districts, 100);
    let sample: BTreeSet<String> = stride_sample(500, 100)
        .into_iter()
        .filter_map(|i| agents.get(i).map(|a| a.id.clone()))
        .collect();
    assert_eq!(sample.len(), 100);
    assert!(map.len() <= 100);
    assert!(map.values().all(|cell| sample.contains(&cell.agent.id)));
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn single_hot_district() {
    let districts = vec![District::new("alpha", "Alpha", 0.9)];
    let frame = compose_frame(&districts, &[], &options(10, 5));

    assert!(generate(&districts, 10, 5).boundaries().is_empty());
    let label: String = frame.lines().get(1).map(|l| l.chars().skip(2).take(7).collect()).unwrap_or_default();
    assert_eq!(label, "0ALPHA!");

    let terrain: Vec<ColorType> = frame
        .metadata
        .values()
        .map(|m| m.color_type)
        .filter(|c| matches!(c, ColorType::High | ColorType::Medium | ColorType::Low))
        .collect();
    let high = terrain.iter().filter(|c| **c == ColorType::High).count();
    assert!(high * 2 > terrain.len(), "{high} of {}", terrain.len());
    assert!(!terrain.contains(&ColorType::Low));
}

#[test]
fn cold_and_hot_districts_split_the_grid() {
    let districts = vec![District::new("a", "Cold", 0.1), District::new("b", "Hot", 0.9)];
    let frame = compose_frame(&districts, &[], &options(20, 10));
    assert_eq!(generate(&districts, 20, 10).boundaries(), &[10]);

    let mut left = Vec::new();
    let mut right = Vec::new();
    for y in 0..10 {
        for x in 0..20 {
            let Some(meta) = frame.cell(x, y) else { continue };
            if !matches!(meta.color_type, ColorType::High | ColorType::Medium | ColorType::Low) {
                continue;
            }
            if x < 10 {
                left.push(meta.color_type);
            } else {
                right.push(meta.color_type);
            }
        }
    }
    assert!(left.iter().all(|c| *c == ColorType::Low));
    let high = right.iter().filter(|c| **c == ColorType::High).count();
    assert!(high * 2 > right.len());
}

#[test]
fn dead_agent_is_marked_dead() {
    let districts = vec![District::new("alpha", "Alpha", 0.4)];
    let mut agent = Agent::new("a1", "Alpha");
    agent.alive = Some(false);
    let agents = vec![agent];

    let map = create_agent_map(&agents, 30, 10, &districts, 10);
    assert_eq!(map.len(), 1);
    assert!(map.values().all(|cell| cell.glyph == glyphs::DEAD && !cell.alive));

    let frame = compose_frame(&districts, &agents, &options(30, 10));
    let dead: Vec<_> = frame
        .metadata
        .values()
        .filter(|m| m.color_type == ColorType::Dead)
        .collect();
    assert_eq!(dead.len(), 1);
    assert!(frame.lines().iter().any(|line| line.contains(glyphs::DEAD)));
}

#[test]
fn agent_cap_is_reported_in_stats() {
    let frame = compose_frame(
        &districts(5),
        &agents(500, 5),
        &RenderOptions {
            max_agents: 100,
            ..options(100, 30)
        },
    );
    assert_eq!(frame.stats.agent_count, 500);
    assert_eq!(frame.stats.district_count, 5);
    assert!(frame.stats.visible_agents <= 100);
    assert!(frame.stats.visible_agents > 0);
}

#[test]
fn pause_freezes_the_displayed_frame() {
    let mut controller = RenderController::new(options(40, 10));
    controller.mount();
    let start = Instant::now();
    controller.update_data(vec![District::new("a", "Alpha", 0.2)], Vec::new());
    let shown = controller.poll(start);
    assert!(shown.is_some());

    controller.pause();
    controller.update_data(vec![District::new("a", "Alpha", 0.95)], Vec::new());
    let later = start + Duration::from_secs(5);
    assert!(controller.poll(later).is_none());
    assert_eq!(controller.state(), RenderState::Paused);
    let frozen = controller.frame();
    assert!(matches!((&shown, &frozen), (Some(a), Some(b)) if std::sync::Arc::ptr_eq(a, b)));

    controller.resume();
    let resumed = controller.poll(later);
    assert!(resumed.is_some_and(|frame| Some(&frame) != shown.as_ref()));
    assert_eq!(controller.state(), RenderState::Live);
}

#[test]
fn no_data_means_noise_only() {
    let frame = compose_frame(&[], &agents(10, 0), &options(30, 8));
    assert_eq!(frame.stats.visible_agents, 0);
    assert!(frame.metadata.values().all(|m| m.district.is_none()));
    assert!(frame.metadata.values().all(|m| matches!(m.color_type, ColorType::Low)));
}
