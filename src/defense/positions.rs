//! Defensive position generation and unit-to-slot assignment

use crate::core::config::DefenseConfig;
use crate::core::types::{EntityId, Vec2};
use crate::defense::chokepoint::Chokepoint;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefensivePosition {
    pub position: Vec2,
    /// Direction a unit holding this position should face
    pub facing: Vec2,
}

/// `count` positions spread over `width` across the threat axis, pushed
/// `offset` units from `base` toward the threat
pub fn defensive_line(
    base: Vec2,
    threat_direction: Vec2,
    count: usize,
    width: f32,
    offset: f32,
) -> Vec<DefensivePosition> {
    let facing = threat_direction.normalize_or(Vec2::new(1.0, 0.0));
    let center = base + facing * offset;
    let across = facing.perpendicular();

    (0..count)
        .map(|i| {
            let t = if count == 1 {
                0.0
            } else {
                i as f32 / (count - 1) as f32 - 0.5
            };
            DefensivePosition {
                position: center + across * (t * width),
                facing,
            }
        })
        .collect()
}

/// Positions for `count` defenders around the base
///
/// With a known threat direction this is one defensive line; otherwise a
/// ring around the base facing outward.
pub fn base_defense_positions(
    base: Vec2,
    threat_direction: Option<Vec2>,
    count: usize,
    config: &DefenseConfig,
) -> Vec<DefensivePosition> {
    if count == 0 {
        return Vec::new();
    }

    match threat_direction {
        Some(direction) => {
            let width = (count as f32 * config.line_width_per_unit).min(config.max_line_width);
            defensive_line(base, direction, count, width, config.line_offset)
        }
        None => (0..count)
            .map(|i| {
                let angle = 2.0 * PI * i as f32 / count as f32;
                let (sin, cos) = angle.sin_cos();
                let outward = Vec2::new(cos, sin);
                DefensivePosition {
                    position: base + outward * config.ring_radius,
                    facing: outward,
                }
            })
            .collect(),
    }
}

/// `count` positions spread across a chokepoint, facing the threat
///
/// The line is no wider than the gap itself.
pub fn chokepoint_defense_positions(
    chokepoint: &Chokepoint,
    threat_direction: Vec2,
    count: usize,
    config: &DefenseConfig,
) -> Vec<DefensivePosition> {
    let width = (count as f32 * config.line_width_per_unit)
        .min(config.max_line_width)
        .min(chokepoint.width);
    defensive_line(chokepoint.position, threat_direction, count, width, 0.0)
}

/// Square grid of `count` slots centred on the base
pub fn reserve_positions(base: Vec2, count: usize, spacing: f32) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }

    let side = (count as f32).sqrt().ceil() as usize;
    let half = (side as f32 - 1.0) / 2.0;

    (0..count)
        .map(|i| {
            let row = (i / side) as f32;
            let col = (i % side) as f32;
            base + Vec2::new((col - half) * spacing, (row - half) * spacing)
        })
        .collect()
}

/// Greedy assignment of units to positions
///
/// Units are taken in ascending distance to their nearest position. Each
/// takes the position maximizing `remaining_capacity * 100 - distance`
/// among those with capacity left. Returns unit id → position index; units
/// left over once capacity runs out are absent.
pub fn assign_units_to_positions(
    units: &[(EntityId, Vec2)],
    positions: &[Vec2],
    capacity: usize,
) -> BTreeMap<EntityId, usize> {
    let mut assignments = BTreeMap::new();
    if positions.is_empty() || capacity == 0 {
        return assignments;
    }

    let mut order: Vec<(EntityId, Vec2)> = units.to_vec();
    order.sort_by_key(|(id, pos)| {
        let nearest = positions
            .iter()
            .map(|p| OrderedFloat(p.distance(pos)))
            .min()
            .unwrap_or(OrderedFloat(f32::MAX));
        (nearest, *id)
    });

    let mut remaining = vec![capacity; positions.len()];

    for (id, pos) in order {
        let best = positions
            .iter()
            .enumerate()
            .filter(|(i, _)| remaining[*i] > 0)
            .max_by_key(|(i, p)| {
                let score = remaining[*i] as f32 * 100.0 - p.distance(&pos);
                (OrderedFloat(score), Reverse(*i))
            })
            .map(|(i, _)| i);

        match best {
            Some(index) => {
                remaining[index] -= 1;
                assignments.insert(id, index);
            }
            None => break,
        }
    }

    assignments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_centered_on_offset_point() {
        let line = defensive_line(Vec2::ZERO, Vec2::new(0.0, 1.0), 3, 200.0, 200.0);
        assert_eq!(line.len(), 3);
        let xs: Vec<f32> = line.iter().map(|p| p.position.x).collect();
        assert!((xs[0] - 100.0).abs() < 1e-4);
        assert!(xs[1].abs() < 1e-4);
        assert!((xs[2] + 100.0).abs() < 1e-4);
        for p in &line {
            assert!((p.position.y - 200.0).abs() < 1e-4);
            assert_eq!(p.facing, Vec2::new(0.0, 1.0));
        }
    }

    #[test]
    fn test_line_width_capped() {
        let config = DefenseConfig::default();
        let positions = base_defense_positions(Vec2::ZERO, Some(Vec2::new(1.0, 0.0)), 10, &config);
        let ys: Vec<f32> = positions.iter().map(|p| p.position.y).collect();
        let spread = ys.iter().cloned().fold(f32::MIN, f32::max) - ys.iter().cloned().fold(f32::MAX, f32::min);
        assert!((spread - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_chokepoint_line_fits_gap() {
        let config = DefenseConfig::default();
        let chokepoint = Chokepoint {
            position: Vec2::new(800.0, 500.0),
            facing: Vec2::new(1.0, 0.0),
            width: 100.0,
            control: 80.0,
        };
        let positions = chokepoint_defense_positions(&chokepoint, Vec2::new(1.0, 0.0), 4, &config);
        assert_eq!(positions.len(), 4);
        for p in &positions {
            assert!((p.position.x - 800.0).abs() < 1e-4);
            assert!((p.position.y - 500.0).abs() <= 50.0 + 1e-4);
            assert_eq!(p.facing, Vec2::new(1.0, 0.0));
        }
    }

    #[test]
    fn test_ring_faces_outward() {
        let config = DefenseConfig::default();
        let base = Vec2::new(500.0, 500.0);
        let ring = base_defense_positions(base, None, 4, &config);
        for p in &ring {
            assert!((p.position.distance(&base) - 200.0).abs() < 1e-3);
            let outward = (p.position - base).normalize();
            assert!((outward.x - p.facing.x).abs() < 1e-4);
            assert!((outward.y - p.facing.y).abs() < 1e-4);
        }
    }

    #[test]
    fn test_reserve_grid_centered() {
        let slots = reserve_positions(Vec2::new(100.0, 100.0), 4, 40.0);
        assert_eq!(slots.len(), 4);
        assert_eq!(Vec2::centroid(slots.iter().copied()), Some(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn test_assignment_respects_capacity() {
        let units = [
            (EntityId(1), Vec2::new(0.0, 0.0)),
            (EntityId(2), Vec2::new(5.0, 0.0)),
            (EntityId(3), Vec2::new(500.0, 0.0)),
        ];
        let positions = [Vec2::new(0.0, 0.0), Vec2::new(500.0, 0.0)];
        let assigned = assign_units_to_positions(&units, &positions, 1);

        assert_eq!(assigned.get(&EntityId(1)), Some(&0));
        assert_eq!(assigned.get(&EntityId(3)), Some(&1));
        assert_eq!(assigned.get(&EntityId(2)), None);
    }

    #[test]
    fn test_assignment_spreads_by_capacity() {
        let units = [(EntityId(1), Vec2::ZERO), (EntityId(2), Vec2::new(1.0, 0.0))];
        let positions = [Vec2::ZERO, Vec2::new(60.0, 0.0)];
        let assigned = assign_units_to_positions(&units, &positions, 2);
        // Second unit prefers the untouched slot: 200 - 59 beats 100 - 1
        assert_eq!(assigned[&EntityId(1)], 0);
        assert_eq!(assigned[&EntityId(2)], 1);
    }
}
