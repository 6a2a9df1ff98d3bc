//! Threat & defense analysis
//!
//! Pure geometry and scoring over one player's view: where threats come
//! from, how urgent they are, where defenders should stand and how many
//! units to keep at home.

pub mod chokepoint;
pub mod positions;
pub mod threat;

use crate::core::config::DefenseConfig;
use crate::core::types::Vec2;
use crate::world::{EntitySnapshot, PlayerView};

pub use chokepoint::{detect_chokepoints, guarding_chokepoint, Chokepoint};
pub use positions::{
    assign_units_to_positions, base_defense_positions, chokepoint_defense_positions,
    defensive_line, reserve_positions, DefensivePosition,
};
pub use threat::{prioritize_threats, reserve_size, threat_direction, threat_level, PrioritizedThreat};

/// Snapshot of the base's defensive situation
#[derive(Debug, Clone, PartialEq)]
pub struct DefenseAnalysis {
    pub base: Vec2,
    /// Enemies within the defense radius, most urgent first
    pub threats: Vec<PrioritizedThreat>,
    pub direction: Option<Vec2>,
    /// 0..100
    pub level: f32,
}

impl DefenseAnalysis {
    pub fn has_threats(&self) -> bool {
        !self.threats.is_empty()
    }

    pub fn top_threat(&self) -> Option<&PrioritizedThreat> {
        self.threats.first()
    }
}

/// Analyze threats around the base; `None` when the player has nothing left
pub fn analyze(view: &PlayerView, config: &DefenseConfig) -> Option<DefenseAnalysis> {
    let base = view.base_center()?;

    let threats: Vec<&EntitySnapshot> = view
        .armed_enemies()
        .filter(|e| e.position.distance(&base) <= config.defense_radius)
        .collect();
    let buildings: Vec<Vec2> = view.own_buildings().map(|b| b.position).collect();

    let threats = prioritize_threats(&threats, base, &buildings, view.rules, config);
    let positions: Vec<Vec2> = threats.iter().map(|t| t.position).collect();
    let direction = threat_direction(base, &positions);
    let level = threat_level(&threats, config);

    Some(DefenseAnalysis {
        base,
        threats,
        direction,
        level,
    })
}

/// Chokepoints formed by the rocks and buildings currently on the map
pub fn map_chokepoints(view: &PlayerView, config: &DefenseConfig) -> Vec<Chokepoint> {
    let obstacles: Vec<Vec2> = view.obstacles().map(|o| o.position).collect();
    detect_chokepoints(&obstacles, view.snapshot.map_size, config)
}
