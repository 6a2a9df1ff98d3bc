//! Threat scoring, direction and reserve sizing

use crate::core::config::DefenseConfig;
use crate::core::types::{EntityId, Vec2};
use crate::rules::RulesTable;
use crate::world::EntitySnapshot;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Weight of distance-to-base in the threat score (per world unit)
const DISTANCE_PENALTY: f32 = 0.1;

/// Bonus for threats standing near one of our buildings
const BUILDING_PROXIMITY_BONUS: f32 = 50.0;

/// Slack on the unit-length threshold for the summed threat vector
const DIRECTION_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedThreat {
    pub id: EntityId,
    pub position: Vec2,
    pub danger_level: f32,
    pub score: f32,
}

/// Rank threats, most urgent first (ties by ascending id)
pub fn prioritize_threats(
    threats: &[&EntitySnapshot],
    base: Vec2,
    buildings: &[Vec2],
    rules: &RulesTable,
    config: &DefenseConfig,
) -> Vec<PrioritizedThreat> {
    let mut ranked: Vec<PrioritizedThreat> = threats
        .iter()
        .map(|threat| {
            let danger_level = threat.danger_level(rules);
            let near_building = buildings
                .iter()
                .any(|b| b.distance(&threat.position) <= config.building_proximity);
            let score = -DISTANCE_PENALTY * threat.position.distance(&base)
                + if near_building { BUILDING_PROXIMITY_BONUS } else { 0.0 }
                + danger_level;
            PrioritizedThreat {
                id: threat.id,
                position: threat.position,
                danger_level,
                score,
            }
        })
        .collect();

    ranked.sort_by_key(|t| (Reverse(OrderedFloat(t.score)), t.id));
    ranked
}

/// Average of the unit vectors from `base` to each threat
///
/// `None` when there are no threats or they cancel out (resultant shorter
/// than one unit vector).
pub fn threat_direction(base: Vec2, threats: &[Vec2]) -> Option<Vec2> {
    if threats.is_empty() {
        return None;
    }

    let sum = threats
        .iter()
        .fold(Vec2::ZERO, |acc, t| acc + (*t - base).normalize());

    if sum.length() < 1.0 - DIRECTION_TOLERANCE {
        return None;
    }

    Some((sum * (1.0 / threats.len() as f32)).normalize())
}

/// Aggregate threat on a 0..100 scale
pub fn threat_level(threats: &[PrioritizedThreat], config: &DefenseConfig) -> f32 {
    let total: f32 = threats.iter().map(|t| t.danger_level).sum();
    (total * config.threat_level_scale).clamp(0.0, 100.0)
}

/// Number of combat units to hold back at the base
///
/// Never below one while any units exist; grows with the threat level and
/// shrinks as risk tolerance rises.
pub fn reserve_size(total_units: usize, threat_level: f32, risk_tolerance: f32) -> usize {
    if total_units == 0 {
        return 0;
    }

    let total = total_units as f32;
    let threat = threat_level.clamp(0.0, 100.0);
    let risk = risk_tolerance.clamp(0.0, 1.0);

    let base = (0.2 * total).ceil() + (0.3 * total * threat / 100.0).floor();
    let scaled = (base * (1.0 - 0.5 * risk)).floor() as usize;
    scaled.max(1)
}
