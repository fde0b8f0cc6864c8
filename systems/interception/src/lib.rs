#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Interception and corridor analysis.
//!
//! Searches continuous space around the goal for placement positions that
//! cut across predicted hostile trajectories and heavy flow-field traffic,
//! and extracts choke points from the traffic layer for pre-wave positioning.

use std::{cmp::Ordering, f32::consts::TAU};

use rampart_core::{CellCoord, InterceptionPoint, PlacementView, PlannerConfig, ThreatVector, Vec2};
use rampart_system_influence::TrafficMap;
use rampart_system_navigation::Navigator;

/// High-traffic cell of the traffic layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChokePoint {
    /// Cell of the traffic layer.
    pub cell: CellCoord,
    /// World-space centre of the cell.
    pub position: Vec2,
    /// Traffic normalised by the busiest cell, in `[0, 1]`.
    pub convergence: f32,
}

/// Reports whether a new defense could stand at `position` anywhere on the field.
///
/// The position must lie inside the grid on a passable cell, no closer to
/// the goal than `min_distance_from_goal`, and at least `min_spacing` away
/// from every existing placement.
#[must_use]
pub fn placement_clear(
    config: &PlannerConfig,
    navigator: &Navigator,
    existing: &PlacementView,
    goal: Vec2,
    position: Vec2,
) -> bool {
    let grid = navigator.grid();
    if !grid.bounds().contains(position) {
        return false;
    }
    match grid.cell_at(position) {
        Some(cell) if grid.is_passable(cell) => {}
        _ => return false,
    }
    if position.distance(goal) < config.min_distance_from_goal {
        return false;
    }

    existing
        .iter()
        .all(|placement| placement.position.distance(position) >= config.min_spacing)
}

/// Same as [`placement_clear`], additionally requiring the position to lie
/// within `max_distance_from_goal`.
#[must_use]
pub fn placement_admissible(
    config: &PlannerConfig,
    navigator: &Navigator,
    existing: &PlacementView,
    goal: Vec2,
    position: Vec2,
) -> bool {
    position.distance(goal) <= config.max_distance_from_goal
        && placement_clear(config, navigator, existing, goal, position)
}

/// Ranks candidate placement positions by how well they intercept incoming hostiles.
///
/// Candidates are sampled on concentric rings inside the configured distance
/// band and along every threat's current-to-predicted segment. The result is
/// sorted by descending score, respects `min_spacing` between its own
/// entries, and holds at most `max_results` points.
#[must_use]
pub fn find_interception_points(
    config: &PlannerConfig,
    threats: &[ThreatVector],
    existing: &PlacementView,
    traffic: &TrafficMap,
    navigator: &Navigator,
    goal: Vec2,
) -> Vec<InterceptionPoint> {
    let tuning = &config.interception;
    let mean_speed = mean_speed(threats).unwrap_or(tuning.reference_speed).max(f32::EPSILON);
    let full_dwell = 2.0 * tuning.radius / mean_speed;

    let mut scored: Vec<InterceptionPoint> = sample_positions(config, threats, goal)
        .into_iter()
        .filter(|&position| placement_admissible(config, navigator, existing, goal, position))
        .filter_map(|position| {
            let radial = (position - goal).normalize_or_zero();
            let perpendicularity = navigator.direction_at(position).dot(radial).abs();
            let dwell_time = full_dwell * (0.5 + 0.5 * perpendicularity);
            if dwell_time < tuning.min_dwell_time {
                return None;
            }

            let (intercepted_paths, quality) = intercepts(threats, position, tuning.radius);
            let intercept = if threats.is_empty() {
                0.0
            } else {
                quality / threats.len() as f32
            };
            let score = tuning.traffic_weight * traffic.density(position)
                + tuning.perpendicularity_weight * perpendicularity
                + tuning.intercept_weight * intercept
                + tuning.dwell_weight * dwell_time / full_dwell;

            Some(InterceptionPoint {
                position,
                score,
                dwell_time,
                intercepted_paths,
                perpendicularity,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let limit = tuning.max_results as usize;
    let mut selected: Vec<InterceptionPoint> = Vec::with_capacity(limit);
    for point in scored {
        if selected.len() >= limit {
            break;
        }
        let spaced = selected
            .iter()
            .all(|kept| kept.position.distance(point.position) >= config.min_spacing);
        if spaced {
            selected.push(point);
        }
    }

    tracing::trace!(
        selected = selected.len(),
        threats = threats.len(),
        "interception search complete"
    );
    selected
}

/// Highest-traffic cells with normalised traffic of at least `min_convergence`.
///
/// Returned cells are sorted by descending traffic and never touch each
/// other, so at least one cell separates any two of them.
#[must_use]
pub fn find_choke_points(traffic: &TrafficMap, min_convergence: f32, limit: usize) -> Vec<ChokePoint> {
    let map = traffic.map();
    let max = map.max_value();
    if max <= 0.0 || limit == 0 {
        return Vec::new();
    }

    let mut cells: Vec<ChokePoint> = map
        .samples()
        .map(|sample| ChokePoint {
            cell: sample.cell,
            position: sample.position,
            convergence: sample.value / max,
        })
        .filter(|choke| choke.convergence > 0.0 && choke.convergence >= min_convergence)
        .collect();
    cells.sort_by(|a, b| {
        b.convergence
            .partial_cmp(&a.convergence)
            .unwrap_or(Ordering::Equal)
    });

    let mut selected: Vec<ChokePoint> = Vec::new();
    for choke in cells {
        if selected.len() >= limit {
            break;
        }
        if selected
            .iter()
            .all(|kept| kept.cell.chebyshev_distance(choke.cell) >= 2)
        {
            selected.push(choke);
        }
    }
    selected
}

fn mean_speed(threats: &[ThreatVector]) -> Option<f32> {
    if threats.is_empty() {
        return None;
    }
    let total: f32 = threats.iter().map(|threat| threat.velocity.length()).sum();
    let mean = total / threats.len() as f32;
    (mean > f32::EPSILON).then_some(mean)
}

fn sample_positions(config: &PlannerConfig, threats: &[ThreatVector], goal: Vec2) -> Vec<Vec2> {
    let tuning = &config.interception;
    let band = config.max_distance_from_goal - config.min_distance_from_goal;
    let mut positions = Vec::new();

    for ring in 0..tuning.ring_count {
        let radius =
            config.min_distance_from_goal + band * (ring as f32 + 0.5) / tuning.ring_count as f32;
        for sample in 0..tuning.samples_per_ring {
            let angle = TAU * sample as f32 / tuning.samples_per_ring as f32;
            positions.push(goal + Vec2::from_angle(angle) * radius);
        }
    }

    if tuning.trajectory_samples > 0 {
        for threat in threats {
            for step in 0..=tuning.trajectory_samples {
                let t = step as f32 / tuning.trajectory_samples as f32;
                positions.push(threat.position.lerp(threat.predicted_position, t));
            }
        }
    }

    positions
}

fn intercepts(threats: &[ThreatVector], position: Vec2, radius: f32) -> (u32, f32) {
    threats.iter().fold((0, 0.0), |(count, quality), threat| {
        let distance = segment_distance(position, threat.position, threat.predicted_position);
        if distance <= radius {
            (count + 1, quality + 1.0 - distance / radius)
        } else {
            (count, quality)
        }
    })
}

fn segment_distance(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}
