//! Unit kinds and their default stats
//!
//! The set of kinds is closed. Anything the simulation reports that we do
//! not recognise maps to `UnitKind::Unknown`, whose stats are the explicit
//! default entry.

use serde::{Deserialize, Serialize};

/// Armor class; scales durability when ranking formation slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorClass {
    None,
    Light,
    Medium,
    Heavy,
}

impl ArmorClass {
    pub fn durability_factor(&self) -> f32 {
        match self {
            ArmorClass::None => 1.0,
            ArmorClass::Light => 1.25,
            ArmorClass::Medium => 1.5,
            ArmorClass::Heavy => 2.0,
        }
    }
}

/// Type of mobile unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    // Infantry
    Infantry,
    RocketSoldier,
    Engineer,
    Medic,

    // Vehicles
    Jeep,
    LightTank,
    HeavyTank,
    Artillery,

    // Economy
    Harvester,

    /// Fallback for kinds the rules table does not know
    Unknown,
}

/// Static combat and economy stats of a unit kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    pub armor: ArmorClass,
    pub attack_range: f32,
    /// World units per tick
    pub speed: f32,
    /// Damage per shot; negative values heal
    pub damage: f32,
    pub cost: u32,
    /// Fixed threat rating used when prioritising targets (0..100)
    pub danger_level: f32,
}

impl UnitStats {
    pub fn is_healer(&self) -> bool {
        self.damage < 0.0
    }

    pub fn is_armed(&self) -> bool {
        self.damage > 0.0
    }
}

impl UnitKind {
    pub const ALL: [UnitKind; 10] = [
        UnitKind::Infantry,
        UnitKind::RocketSoldier,
        UnitKind::Engineer,
        UnitKind::Medic,
        UnitKind::Jeep,
        UnitKind::LightTank,
        UnitKind::HeavyTank,
        UnitKind::Artillery,
        UnitKind::Harvester,
        UnitKind::Unknown,
    ];

    /// Stable key used in build commands and external tables
    pub fn key(&self) -> &'static str {
        match self {
            UnitKind::Infantry => "infantry",
            UnitKind::RocketSoldier => "rocket_soldier",
            UnitKind::Engineer => "engineer",
            UnitKind::Medic => "medic",
            UnitKind::Jeep => "jeep",
            UnitKind::LightTank => "light_tank",
            UnitKind::HeavyTank => "heavy_tank",
            UnitKind::Artillery => "artillery",
            UnitKind::Harvester => "harvester",
            UnitKind::Unknown => "unknown",
        }
    }

    /// Look up a kind by key, falling back to `Unknown`
    pub fn from_key(key: &str) -> UnitKind {
        UnitKind::ALL
            .iter()
            .copied()
            .find(|k| k.key() == key)
            .unwrap_or(UnitKind::Unknown)
    }

    pub fn is_harvester(&self) -> bool {
        matches!(self, UnitKind::Harvester)
    }

    /// Get default stats for this unit kind
    pub fn default_stats(&self) -> UnitStats {
        match self {
            UnitKind::Infantry => UnitStats {
                armor: ArmorClass::None,
                attack_range: 120.0,
                speed: 1.0,
                damage: 10.0,
                cost: 100,
                danger_level: 30.0,
            },
            UnitKind::RocketSoldier => UnitStats {
                armor: ArmorClass::None,
                attack_range: 200.0,
                speed: 0.9,
                damage: 25.0,
                cost: 300,
                danger_level: 55.0,
            },
            UnitKind::Engineer => UnitStats {
                armor: ArmorClass::None,
                attack_range: 0.0,
                speed: 1.0,
                damage: 0.0,
                cost: 500,
                danger_level: 50.0, // Captures buildings
            },
            UnitKind::Medic => UnitStats {
                armor: ArmorClass::None,
                attack_range: 80.0,
                speed: 1.0,
                damage: -8.0,
                cost: 200,
                danger_level: 10.0,
            },
            UnitKind::Jeep => UnitStats {
                armor: ArmorClass::Light,
                attack_range: 140.0,
                speed: 2.2,
                damage: 12.0,
                cost: 400,
                danger_level: 35.0,
            },
            UnitKind::LightTank => UnitStats {
                armor: ArmorClass::Medium,
                attack_range: 160.0,
                speed: 1.6,
                damage: 20.0,
                cost: 700,
                danger_level: 60.0,
            },
            UnitKind::HeavyTank => UnitStats {
                armor: ArmorClass::Heavy,
                attack_range: 180.0,
                speed: 0.8,
                damage: 40.0,
                cost: 1500,
                danger_level: 90.0,
            },
            UnitKind::Artillery => UnitStats {
                armor: ArmorClass::Light,
                attack_range: 400.0,
                speed: 0.7,
                damage: 50.0,
                cost: 1200,
                danger_level: 80.0,
            },
            UnitKind::Harvester => UnitStats {
                armor: ArmorClass::Heavy,
                attack_range: 0.0,
                speed: 0.9,
                damage: 0.0,
                cost: 1400,
                danger_level: 5.0,
            },
            UnitKind::Unknown => UnitStats {
                armor: ArmorClass::Light,
                attack_range: 100.0,
                speed: 1.0,
                damage: 10.0,
                cost: 0,
                danger_level: 40.0,
            },
        }
    }
}
