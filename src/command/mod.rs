//! Command objects handed back to the simulation core
//!
//! The decision layer never touches entities directly; every effect it
//! wants is expressed as one of these.

use crate::core::types::{EntityId, Vec2};
use crate::rules::{BuildingKind, UnitKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildCategory {
    Unit,
    Building,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Move {
        unit_ids: Vec<EntityId>,
        destination: Vec2,
    },
    Attack {
        unit_ids: Vec<EntityId>,
        target: EntityId,
    },
    StartBuild {
        category: BuildCategory,
        key: String,
    },
}

impl Command {
    pub fn move_to(unit_ids: Vec<EntityId>, destination: Vec2) -> Self {
        Command::Move {
            unit_ids,
            destination,
        }
    }

    /// Convenience: move a single unit
    pub fn move_unit(unit_id: EntityId, destination: Vec2) -> Self {
        Self::move_to(vec![unit_id], destination)
    }

    pub fn attack(unit_ids: Vec<EntityId>, target: EntityId) -> Self {
        Command::Attack { unit_ids, target }
    }

    pub fn build_unit(kind: UnitKind) -> Self {
        Command::StartBuild {
            category: BuildCategory::Unit,
            key: kind.key().to_string(),
        }
    }

    pub fn build_structure(kind: BuildingKind) -> Self {
        Command::StartBuild {
            category: BuildCategory::Building,
            key: kind.key().to_string(),
        }
    }

    /// Units the command applies to (empty for build requests)
    pub fn unit_ids(&self) -> &[EntityId] {
        match self {
            Command::Move { unit_ids, .. } | Command::Attack { unit_ids, .. } => unit_ids,
            Command::StartBuild { .. } => &[],
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, Command::Move { .. })
    }

    pub fn is_attack(&self) -> bool {
        matches!(self, Command::Attack { .. })
    }
}
