//! Chokepoint detection between pairs of obstacles

use crate::core::config::DefenseConfig;
use crate::core::types::Vec2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Narrow gap between two obstacles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chokepoint {
    /// Midpoint of the gap
    pub position: Vec2,
    /// Perpendicular to the obstacle axis, i.e. through the gap
    pub facing: Vec2,
    pub width: f32,
    /// 0..100, higher nearer the map centre
    pub control: f32,
}

/// Scan every obstacle pair for gaps of a defensible width
///
/// Keeps the `max_chokepoints` with the highest control value; equal control
/// keeps pair order.
pub fn detect_chokepoints(
    obstacles: &[Vec2],
    map_size: Vec2,
    config: &DefenseConfig,
) -> Vec<Chokepoint> {
    let center = map_size * 0.5;
    let diagonal = map_size.length();

    let mut found = Vec::new();
    for (i, a) in obstacles.iter().enumerate() {
        for b in &obstacles[i + 1..] {
            let gap = a.distance(b);
            if gap < config.chokepoint_min_gap || gap > config.chokepoint_max_gap {
                continue;
            }

            let position = a.midpoint(b);
            let control = if diagonal > 0.0 {
                100.0 * (1.0 - position.distance(&center) / diagonal)
            } else {
                100.0
            };
            found.push(Chokepoint {
                position,
                facing: (*b - *a).normalize().perpendicular(),
                width: gap,
                control: control.clamp(0.0, 100.0),
            });
        }
    }

    found.sort_by_key(|c| Reverse(OrderedFloat(c.control)));
    found.truncate(config.max_chokepoints);
    found
}

/// Highest-control chokepoint lying between the base and a threat
///
/// Candidates sit within the defense radius and roughly along the threat
/// direction; ties go to the one closer to the base.
pub fn guarding_chokepoint<'a>(
    base: Vec2,
    threat_direction: Vec2,
    chokepoints: &'a [Chokepoint],
    config: &DefenseConfig,
) -> Option<&'a Chokepoint> {
    let direction = threat_direction.normalize();
    chokepoints
        .iter()
        .filter(|c| {
            let offset = c.position - base;
            let distance = offset.length();
            distance > 0.0
                && distance <= config.defense_radius
                && offset.dot(&direction) / distance >= config.chokepoint_alignment
        })
        .max_by_key(|c| {
            (
                OrderedFloat(c.control),
                Reverse(OrderedFloat(c.position.distance(&base))),
            )
        })
}
