//! Squads: groups of combat units acting together
//!
//! A squad is owned by exactly one AI context and only mutated by that
//! context's update pass.

pub mod coordinator;
pub mod formation;
pub mod state_machine;

use crate::core::types::{EntityId, SquadId, Tick, Vec2};
use crate::rules::{ArmorClass, UnitStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use coordinator::{
    coordinate_squads, form_squad, idle_combat_units, update_squads, CoordinatorOutcome,
};
pub use formation::{compute_formation, FormationKind, FormationMember};
pub use state_machine::update_squad;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquadType {
    Attack,
    Defense,
    Harass,
    Scout,
    Escort,
}

impl SquadType {
    pub const ALL: [SquadType; 5] = [
        SquadType::Attack,
        SquadType::Defense,
        SquadType::Harass,
        SquadType::Scout,
        SquadType::Escort,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquadStatus {
    Forming,
    Moving,
    Engaging,
    Retreating,
    /// Terminal; the squad is removed from its registry
    Disbanding,
}

/// Where a squad is headed: a map point or a specific entity, never both
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquadTarget {
    Position(Vec2),
    Entity(EntityId),
}

/// Tactical role of a member, derived from its unit stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    Tank,
    #[default]
    Damage,
    Support,
    Scout,
    Siege,
}

impl UnitRole {
    pub fn classify(stats: &UnitStats, fast_unit_speed: f32) -> UnitRole {
        if stats.is_healer() {
            UnitRole::Support
        } else if stats.armor == ArmorClass::Heavy {
            UnitRole::Tank
        } else if stats.speed >= fast_unit_speed {
            UnitRole::Scout
        } else if stats.attack_range >= 250.0 {
            UnitRole::Siege
        } else {
            UnitRole::Damage
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Squad {
    pub id: SquadId,
    pub squad_type: SquadType,
    pub members: Vec<EntityId>,
    pub status: SquadStatus,
    pub formation: FormationKind,
    pub target: Option<SquadTarget>,
    pub rally_point: Option<Vec2>,
    pub last_order_tick: Tick,
    pub created_tick: Tick,
    /// Tick the current status was entered
    pub status_since: Tick,
    pub roles: BTreeMap<EntityId, UnitRole>,
}

impl Squad {
    pub fn new(
        id: SquadId,
        squad_type: SquadType,
        members: Vec<EntityId>,
        formation: FormationKind,
        target: Option<SquadTarget>,
        tick: Tick,
    ) -> Self {
        Self {
            id,
            squad_type,
            members,
            status: SquadStatus::Forming,
            formation,
            target,
            rally_point: None,
            last_order_tick: tick,
            created_tick: tick,
            status_since: tick,
            roles: BTreeMap::new(),
        }
    }

    pub fn contains(&self, unit: EntityId) -> bool {
        self.members.contains(&unit)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn role_of(&self, unit: EntityId) -> UnitRole {
        self.roles.get(&unit).copied().unwrap_or_default()
    }

    /// Switch status, recording when it happened; returns the previous status
    pub fn transition(&mut self, status: SquadStatus, tick: Tick) -> SquadStatus {
        let previous = self.status;
        if previous != status {
            self.status = status;
            self.status_since = tick;
        }
        previous
    }
}

/// Per-context squad registry with sequential id allocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SquadRegistry {
    squads: BTreeMap<SquadId, Squad>,
    next_id: u32,
}

impl SquadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&mut self) -> SquadId {
        self.next_id += 1;
        SquadId(self.next_id)
    }

    pub fn insert(&mut self, squad: Squad) {
        self.squads.insert(squad.id, squad);
    }

    pub fn remove(&mut self, id: SquadId) -> Option<Squad> {
        self.squads.remove(&id)
    }

    pub fn get(&self, id: SquadId) -> Option<&Squad> {
        self.squads.get(&id)
    }

    pub fn get_mut(&mut self, id: SquadId) -> Option<&mut Squad> {
        self.squads.get_mut(&id)
    }

    pub fn ids(&self) -> Vec<SquadId> {
        self.squads.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values()
    }

    pub fn len(&self) -> usize {
        self.squads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squads.is_empty()
    }

    pub fn of_type(&self, squad_type: SquadType) -> impl Iterator<Item = &Squad> {
        self.squads.values().filter(move |s| s.squad_type == squad_type)
    }

    /// Squad currently holding `unit`, if any
    pub fn squad_of(&self, unit: EntityId) -> Option<SquadId> {
        self.squads
            .values()
            .find(|s| s.contains(unit))
            .map(|s| s.id)
    }

    pub fn is_assigned(&self, unit: EntityId) -> bool {
        self.squad_of(unit).is_some()
    }

    pub fn clear(&mut self) {
        self.squads.clear();
        self.next_id = 0;
    }
}
