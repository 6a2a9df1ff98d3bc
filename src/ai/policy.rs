//! Difficulty levels and the policy each one selects
//!
//! The policy is built once per AI instance and consulted by every
//! subsystem instead of re-checking the difficulty in place.

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[display(fmt = "dummy")]
    Dummy,
    #[display(fmt = "easy")]
    Easy,
    #[display(fmt = "medium")]
    Medium,
    #[display(fmt = "hard")]
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Dummy,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
    ];

    pub fn from_key(key: &str) -> Option<Difficulty> {
        match key {
            "dummy" => Some(Difficulty::Dummy),
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn policy(self) -> DifficultyPolicy {
        DifficultyPolicy::for_difficulty(self)
    }
}

/// How the danger map is maintained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerMode {
    /// Never updated; every zone reads as safe
    Disabled,
    /// Live enemy presence only
    Presence,
    /// Presence plus remembered attacks and harvester deaths
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesperationMode {
    Fixed,
    /// Credits and harvester ratio
    Basic,
    /// All five economic factors
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyPolicy {
    pub difficulty: Difficulty,
    pub danger: DangerMode,
    pub desperation: DesperationMode,
    pub squads: bool,
    pub harass: bool,
    pub escorts: bool,
    pub builds: bool,
    /// 0..1; higher keeps fewer units in reserve
    pub risk_tolerance: f32,
}

impl DifficultyPolicy {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Dummy => Self {
                difficulty,
                danger: DangerMode::Disabled,
                desperation: DesperationMode::Fixed,
                squads: false,
                harass: false,
                escorts: false,
                builds: false,
                risk_tolerance: 0.5,
            },
            Difficulty::Easy => Self {
                difficulty,
                danger: DangerMode::Disabled,
                desperation: DesperationMode::Fixed,
                squads: true,
                harass: false,
                escorts: false,
                builds: true,
                risk_tolerance: 0.3,
            },
            Difficulty::Medium => Self {
                difficulty,
                danger: DangerMode::Presence,
                desperation: DesperationMode::Basic,
                squads: true,
                harass: false,
                escorts: true,
                builds: true,
                risk_tolerance: 0.5,
            },
            Difficulty::Hard => Self {
                difficulty,
                danger: DangerMode::Memory,
                desperation: DesperationMode::Full,
                squads: true,
                harass: true,
                escorts: true,
                builds: true,
                risk_tolerance: 0.7,
            },
        }
    }
}
