//! AI configuration with documented constants
//!
//! Every cadence and threshold the decision layer uses lives here. The
//! defaults are the tuned values; `data/ai/default.toml` mirrors them and
//! any section may be omitted from a TOML file.

use crate::core::error::{AiError, Result};
use crate::core::types::Tick;
use crate::squad::formation::FormationKind;
use crate::squad::SquadType;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tick-modulo intervals for each subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub danger_map: Tick,
    pub desperation: Tick,
    /// Squad state machines, squad formation, harvester roles
    pub coordination: Tick,
    pub escort: Tick,
    pub harvester_routing: Tick,
    pub build_planning: Tick,
    pub stuck_resolution: Tick,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            danger_map: 30,
            desperation: 60,
            coordination: 60,
            escort: 90,
            harvester_routing: 30,
            build_planning: 60,
            stuck_resolution: 1,
        }
    }
}

/// Danger map weights and memory windows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DangerConfig {
    /// Side length of one zone (world units)
    pub zone_size: f32,
    /// Danger contributed by each live enemy in a zone
    pub enemy_weight: f32,
    /// Danger contributed by each remembered attack (hard only)
    pub attack_weight: f32,
    /// Danger contributed by each remembered harvester death (hard only)
    pub death_weight: f32,
    pub attack_memory_ticks: Tick,
    pub death_memory_ticks: Tick,
    /// Path danger weight at zero desperation
    pub route_danger_weight: f32,
}

impl Default for DangerConfig {
    fn default() -> Self {
        Self {
            zone_size: 200.0,
            enemy_weight: 25.0,
            attack_weight: 10.0,
            death_weight: 30.0,
            attack_memory_ticks: 300,
            death_memory_ticks: 900,
            route_danger_weight: 3.0,
        }
    }
}

/// Economic pressure scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesperationConfig {
    /// Credits at or above which the credit factor is 0
    pub credit_threshold: f32,
    /// Harvesters per refinery at which the ratio factor reaches 0
    pub desperate_ratio: f32,
    pub early_game_ticks: Tick,
    /// Phase factor value while in the early game
    pub early_game_bonus: f32,
    /// Score reported at dummy/easy difficulty
    pub fixed_score: f32,
}

impl Default for DesperationConfig {
    fn default() -> Self {
        Self {
            credit_threshold: 3000.0,
            desperate_ratio: 2.0,
            early_game_ticks: 3600,
            early_game_bonus: 20.0,
            fixed_score: 30.0,
        }
    }
}

/// Per squad-type constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadConfig {
    pub min_size: usize,
    pub max_size: usize,
    pub forming_timeout: Tick,
    /// Aggregate health ratio below which the squad retreats
    pub retreat_threshold: f32,
    pub spacing: f32,
    pub formation: FormationKind,
}

impl SquadConfig {
    /// Tuned constants for one squad type
    pub fn default_for(squad_type: SquadType) -> Self {
        match squad_type {
            SquadType::Attack => Self::new(4, 12, 600, 0.3, 40.0, FormationKind::Wedge),
            SquadType::Defense => Self::new(2, 8, 300, 0.2, 50.0, FormationKind::Line),
            SquadType::Harass => Self::new(2, 5, 300, 0.5, 35.0, FormationKind::Spread),
            SquadType::Scout => Self::new(1, 2, 120, 0.5, 30.0, FormationKind::Spread),
            SquadType::Escort => Self::new(1, 2, 200, 0.35, 45.0, FormationKind::Box),
        }
    }

    fn new(
        min_size: usize,
        max_size: usize,
        forming_timeout: Tick,
        retreat_threshold: f32,
        spacing: f32,
        formation: FormationKind,
    ) -> Self {
        Self {
            min_size,
            max_size,
            forming_timeout,
            retreat_threshold,
            spacing,
            formation,
        }
    }
}

/// A `[squads.<type>]` table; omitted keys keep that type's defaults
#[derive(Debug, Deserialize)]
struct SquadTable {
    min_size: Option<usize>,
    max_size: Option<usize>,
    forming_timeout: Option<Tick>,
    retreat_threshold: Option<f32>,
    spacing: Option<f32>,
    formation: Option<FormationKind>,
}

impl SquadTable {
    fn over(self, base: SquadConfig) -> SquadConfig {
        SquadConfig {
            min_size: self.min_size.unwrap_or(base.min_size),
            max_size: self.max_size.unwrap_or(base.max_size),
            forming_timeout: self.forming_timeout.unwrap_or(base.forming_timeout),
            retreat_threshold: self.retreat_threshold.unwrap_or(base.retreat_threshold),
            spacing: self.spacing.unwrap_or(base.spacing),
            formation: self.formation.unwrap_or(base.formation),
        }
    }
}

fn squad_table<'de, D: Deserializer<'de>>(
    deserializer: D,
    squad_type: SquadType,
) -> std::result::Result<SquadConfig, D::Error> {
    let table = SquadTable::deserialize(deserializer)?;
    Ok(table.over(SquadConfig::default_for(squad_type)))
}

fn attack_table<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<SquadConfig, D::Error> {
    squad_table(d, SquadType::Attack)
}

fn defense_table<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<SquadConfig, D::Error> {
    squad_table(d, SquadType::Defense)
}

fn harass_table<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<SquadConfig, D::Error> {
    squad_table(d, SquadType::Harass)
}

fn scout_table<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<SquadConfig, D::Error> {
    squad_table(d, SquadType::Scout)
}

fn escort_table<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<SquadConfig, D::Error> {
    squad_table(d, SquadType::Escort)
}

/// Squad behaviour: per-type table plus state machine distances
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadsConfig {
    #[serde(deserialize_with = "attack_table")]
    pub attack: SquadConfig,
    #[serde(deserialize_with = "defense_table")]
    pub defense: SquadConfig,
    #[serde(deserialize_with = "harass_table")]
    pub harass: SquadConfig,
    #[serde(deserialize_with = "scout_table")]
    pub scout: SquadConfig,
    #[serde(deserialize_with = "escort_table")]
    pub escort: SquadConfig,
    /// Fraction of members that must be near the rally point to finish forming
    pub forming_quorum: f32,
    pub rally_radius: f32,
    /// Centroid-to-target distance at which a moving squad engages
    pub engage_target_radius: f32,
    /// Enemy-to-centroid distance at which a moving squad engages
    pub engage_enemy_radius: f32,
    /// Search radius around a position target when engaging
    pub target_search_radius: f32,
    pub advance_step: f32,
    /// Members closer than this to their formation slot are left alone
    pub slot_tolerance: f32,
    pub retreat_step: f32,
    /// Health ratio above which a retreating squad re-forms
    pub recovery_ratio: f32,
}

impl Default for SquadsConfig {
    fn default() -> Self {
        Self {
            attack: SquadConfig::default_for(SquadType::Attack),
            defense: SquadConfig::default_for(SquadType::Defense),
            harass: SquadConfig::default_for(SquadType::Harass),
            scout: SquadConfig::default_for(SquadType::Scout),
            escort: SquadConfig::default_for(SquadType::Escort),
            forming_quorum: 0.7,
            rally_radius: 100.0,
            engage_target_radius: 200.0,
            engage_enemy_radius: 400.0,
            target_search_radius: 500.0,
            advance_step: 100.0,
            slot_tolerance: 50.0,
            retreat_step: 300.0,
            recovery_ratio: 0.6,
        }
    }
}

impl SquadsConfig {
    pub fn for_type(&self, squad_type: SquadType) -> &SquadConfig {
        match squad_type {
            SquadType::Attack => &self.attack,
            SquadType::Defense => &self.defense,
            SquadType::Harass => &self.harass,
            SquadType::Scout => &self.scout,
            SquadType::Escort => &self.escort,
        }
    }
}

/// Threat analysis and base defense geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseConfig {
    /// Enemies within this distance of the base center count as threats
    pub defense_radius: f32,
    pub line_offset: f32,
    pub max_line_width: f32,
    pub line_width_per_unit: f32,
    pub ring_radius: f32,
    pub chokepoint_min_gap: f32,
    pub chokepoint_max_gap: f32,
    pub max_chokepoints: usize,
    /// Minimum cosine between base-to-chokepoint and the threat direction
    /// for a chokepoint to be held against that threat
    pub chokepoint_alignment: f32,
    pub reserve_spacing: f32,
    /// Threats this close to a friendly building get a priority bonus
    pub building_proximity: f32,
    /// Multiplier from summed threat danger levels to a 0..100 threat level
    pub threat_level_scale: f32,
    /// Units at least this fast are eligible for harass and scout squads
    pub fast_unit_speed: f32,
}

impl Default for DefenseConfig {
    fn default() -> Self {
        Self {
            defense_radius: 800.0,
            line_offset: 200.0,
            max_line_width: 400.0,
            line_width_per_unit: 60.0,
            ring_radius: 200.0,
            chokepoint_min_gap: 80.0,
            chokepoint_max_gap: 200.0,
            max_chokepoints: 5,
            chokepoint_alignment: 0.5,
            reserve_spacing: 40.0,
            building_proximity: 200.0,
            threat_level_scale: 0.5,
            fast_unit_speed: 1.5,
        }
    }
}

/// Harvester routing, fleeing and stuck handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub flee_distance: f32,
    /// Health ratio under which a harvester is treated as cautious
    pub cautious_health_ratio: f32,
    pub stuck_threshold_ticks: Tick,
    /// Movement below this distance per tick counts as no progress
    pub stuck_move_epsilon: f32,
    pub nudge_distance: f32,
    /// Nudges attempted before a stuck harvester is retargeted
    pub nudge_attempts: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            flee_distance: 300.0,
            cautious_health_ratio: 0.5,
            stuck_threshold_ticks: 60,
            stuck_move_epsilon: 2.0,
            nudge_distance: 80.0,
            nudge_attempts: 2,
        }
    }
}

/// Escort squads for endangered harvesters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscortConfig {
    pub danger_threshold: f32,
    pub max_escorted: usize,
}

impl Default for EscortConfig {
    fn default() -> Self {
        Self {
            danger_threshold: 30.0,
            max_escorted: 3,
        }
    }
}

/// Complete AI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub cadence: CadenceConfig,
    #[serde(default)]
    pub danger: DangerConfig,
    #[serde(default)]
    pub desperation: DesperationConfig,
    #[serde(default)]
    pub squads: SquadsConfig,
    #[serde(default)]
    pub defense: DefenseConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub escort: EscortConfig,
}

impl AiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AiConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let cadences = [
            ("danger_map", self.cadence.danger_map),
            ("desperation", self.cadence.desperation),
            ("coordination", self.cadence.coordination),
            ("escort", self.cadence.escort),
            ("harvester_routing", self.cadence.harvester_routing),
            ("build_planning", self.cadence.build_planning),
            ("stuck_resolution", self.cadence.stuck_resolution),
        ];
        for (name, interval) in cadences {
            if interval == 0 {
                return Err(AiError::InvalidConfig(format!(
                    "cadence.{} must be at least 1 tick",
                    name
                )));
            }
        }

        if self.danger.zone_size <= 0.0 {
            return Err(AiError::InvalidConfig(format!(
                "danger.zone_size ({}) must be positive",
                self.danger.zone_size
            )));
        }

        if self.desperation.credit_threshold <= 0.0 || self.desperation.desperate_ratio <= 0.0 {
            return Err(AiError::InvalidConfig(
                "desperation thresholds must be positive".into(),
            ));
        }

        for squad_type in SquadType::ALL {
            let squad = self.squads.for_type(squad_type);
            if squad.min_size == 0 || squad.min_size > squad.max_size {
                return Err(AiError::InvalidConfig(format!(
                    "squads.{:?}: min_size ({}) must be in 1..=max_size ({})",
                    squad_type, squad.min_size, squad.max_size
                )));
            }
            if !(0.0..=1.0).contains(&squad.retreat_threshold) {
                return Err(AiError::InvalidConfig(format!(
                    "squads.{:?}: retreat_threshold ({}) must be within 0..=1",
                    squad_type, squad.retreat_threshold
                )));
            }
        }

        if self.defense.chokepoint_min_gap > self.defense.chokepoint_max_gap {
            return Err(AiError::InvalidConfig(format!(
                "defense.chokepoint_min_gap ({}) exceeds chokepoint_max_gap ({})",
                self.defense.chokepoint_min_gap, self.defense.chokepoint_max_gap
            )));
        }

        Ok(())
    }
}

/// Load configuration from `data/ai/{name}.toml`
pub fn load_config(name: &str) -> Result<AiConfig> {
    AiConfig::from_path(&config_path(name))
}

fn config_path(name: &str) -> PathBuf {
    PathBuf::from("data/ai").join(format!("{}.toml", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_cadences() {
        let config = AiConfig::default();
        assert_eq!(config.cadence.danger_map, 30);
        assert_eq!(config.cadence.desperation, 60);
        assert_eq!(config.cadence.coordination, 60);
        assert_eq!(config.cadence.escort, 90);
        assert_eq!(config.cadence.stuck_resolution, 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AiConfig::from_toml_str(
            r#"
            [danger]
            zone_size = 150.0
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.danger.zone_size, 150.0);
        assert_eq!(config.danger.enemy_weight, 25.0);
        assert_eq!(config.squads.attack.max_size, 12);
    }

    #[test]
    fn test_partial_squad_table_keeps_type_defaults() {
        let config = AiConfig::from_toml_str(
            r#"
            [squads.attack]
            max_size = 9

            [squads.escort]
            formation = "line"
            "#,
        )
        .expect("partial squad tables should parse");

        assert_eq!(config.squads.attack.max_size, 9);
        assert_eq!(config.squads.attack.min_size, 4);
        assert_eq!(config.squads.attack.formation, FormationKind::Wedge);
        assert_eq!(config.squads.escort.formation, FormationKind::Line);
        assert_eq!(config.squads.escort.spacing, 45.0);
        assert_eq!(config.squads.defense.max_size, 8);
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let err = AiConfig::from_toml_str(
            r#"
            [cadence]
            escort = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AiError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = AiConfig::from_toml_str("[danger\nzone_size = ").unwrap_err();
        assert!(matches!(err, AiError::TomlError(_)));
    }

    #[test]
    fn test_invalid_squad_sizes_rejected() {
        let mut config = AiConfig::default();
        config.squads.harass.min_size = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_default_config_file() {
        let config = load_config("default").expect("Should load data/ai/default.toml");
        assert_eq!(config.cadence.danger_map, 30);
        assert_eq!(config.squads.defense.formation, FormationKind::Line);
    }
}
