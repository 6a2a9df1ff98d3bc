//! Building kinds and their metadata

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    ConstructionYard,
    PowerPlant,
    Refinery,
    Barracks,
    Factory,
    Turret,
    TechCenter,
    /// Fallback for kinds the rules table does not know
    Unknown,
}

/// Static metadata of a building kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingInfo {
    /// Whether an engineer can capture it
    pub capturable: bool,
    /// Footprint in world units (width, height)
    pub footprint: (f32, f32),
    pub cost: u32,
    /// Damage per shot for defensive structures, 0 otherwise
    pub damage: f32,
    pub attack_range: f32,
    pub danger_level: f32,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 8] = [
        BuildingKind::ConstructionYard,
        BuildingKind::PowerPlant,
        BuildingKind::Refinery,
        BuildingKind::Barracks,
        BuildingKind::Factory,
        BuildingKind::Turret,
        BuildingKind::TechCenter,
        BuildingKind::Unknown,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            BuildingKind::ConstructionYard => "construction_yard",
            BuildingKind::PowerPlant => "power_plant",
            BuildingKind::Refinery => "refinery",
            BuildingKind::Barracks => "barracks",
            BuildingKind::Factory => "factory",
            BuildingKind::Turret => "turret",
            BuildingKind::TechCenter => "tech_center",
            BuildingKind::Unknown => "unknown",
        }
    }

    pub fn from_key(key: &str) -> BuildingKind {
        BuildingKind::ALL
            .iter()
            .copied()
            .find(|k| k.key() == key)
            .unwrap_or(BuildingKind::Unknown)
    }

    pub fn default_info(&self) -> BuildingInfo {
        let passive = |capturable: bool, footprint: (f32, f32), cost: u32| BuildingInfo {
            capturable,
            footprint,
            cost,
            damage: 0.0,
            attack_range: 0.0,
            danger_level: 40.0,
        };

        match self {
            BuildingKind::ConstructionYard => passive(true, (96.0, 96.0), 3000),
            BuildingKind::PowerPlant => passive(true, (64.0, 64.0), 300),
            BuildingKind::Refinery => passive(true, (96.0, 64.0), 2000),
            BuildingKind::Barracks => passive(true, (64.0, 64.0), 500),
            BuildingKind::Factory => passive(true, (96.0, 96.0), 2000),
            BuildingKind::TechCenter => passive(true, (64.0, 64.0), 1500),
            BuildingKind::Turret => BuildingInfo {
                capturable: false,
                footprint: (32.0, 32.0),
                cost: 600,
                damage: 30.0,
                attack_range: 250.0,
                danger_level: 70.0,
            },
            BuildingKind::Unknown => passive(false, (64.0, 64.0), 0),
        }
    }
}
