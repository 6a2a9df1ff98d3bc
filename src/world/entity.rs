//! Entity records as reported by the simulation core

use crate::core::types::{EntityId, PlayerId, Vec2};
use crate::rules::{BuildingKind, RulesTable, UnitKind};
use serde::{Deserialize, Serialize};

/// What an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Unit(UnitKind),
    Building(BuildingKind),
    /// Impassable terrain feature
    Rock,
    /// Harvestable resource field
    ResourceField,
}

/// What a harvester is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestActivity {
    Idle,
    MovingToResource,
    Harvesting,
    Returning,
    Unloading,
}

impl HarvestActivity {
    /// Activities in which the harvester is expected to make progress
    pub fn is_travelling(&self) -> bool {
        matches!(self, HarvestActivity::MovingToResource | HarvestActivity::Returning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarvesterState {
    pub activity: HarvestActivity,
    /// Resource field currently assigned
    pub target: Option<EntityId>,
    pub cargo: f32,
}

/// Type-specific sub-state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    None,
    Combat { target: Option<EntityId> },
    Harvester(HarvesterState),
    Resource { amount: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub owner: Option<PlayerId>,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub kind: EntityKind,
    pub state: EntityState,
}

impl EntitySnapshot {
    fn new(id: EntityId, owner: Option<PlayerId>, kind: EntityKind, position: Vec2) -> Self {
        Self {
            id,
            owner,
            position,
            health: 100.0,
            max_health: 100.0,
            kind,
            state: EntityState::None,
        }
    }

    pub fn unit(id: EntityId, owner: PlayerId, kind: UnitKind, position: Vec2) -> Self {
        let mut entity = Self::new(id, Some(owner), EntityKind::Unit(kind), position);
        entity.state = if kind.is_harvester() {
            EntityState::Harvester(HarvesterState {
                activity: HarvestActivity::Idle,
                target: None,
                cargo: 0.0,
            })
        } else {
            EntityState::Combat { target: None }
        };
        entity
    }

    pub fn building(id: EntityId, owner: PlayerId, kind: BuildingKind, position: Vec2) -> Self {
        let mut entity = Self::new(id, Some(owner), EntityKind::Building(kind), position);
        entity.health = 500.0;
        entity.max_health = 500.0;
        entity
    }

    pub fn rock(id: EntityId, position: Vec2) -> Self {
        Self::new(id, None, EntityKind::Rock, position)
    }

    pub fn resource(id: EntityId, position: Vec2, amount: f32) -> Self {
        let mut entity = Self::new(id, None, EntityKind::ResourceField, position);
        entity.state = EntityState::Resource { amount };
        entity
    }

    pub fn with_health(mut self, health: f32, max_health: f32) -> Self {
        self.health = health;
        self.max_health = max_health;
        self
    }

    pub fn with_state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Alive and owned by a player other than `player`
    pub fn is_hostile_to(&self, player: PlayerId) -> bool {
        self.is_alive()
            && matches!(self.owner, Some(owner) if owner != player)
            && matches!(self.kind, EntityKind::Unit(_) | EntityKind::Building(_))
    }

    pub fn unit_kind(&self) -> Option<UnitKind> {
        match self.kind {
            EntityKind::Unit(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn building_kind(&self) -> Option<BuildingKind> {
        match self.kind {
            EntityKind::Building(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_harvester(&self) -> bool {
        matches!(self.kind, EntityKind::Unit(UnitKind::Harvester))
    }

    /// Rocks and buildings block movement
    pub fn is_obstacle(&self) -> bool {
        matches!(self.kind, EntityKind::Rock | EntityKind::Building(_))
    }

    pub fn combat_target(&self) -> Option<EntityId> {
        match self.state {
            EntityState::Combat { target } => target,
            _ => None,
        }
    }

    pub fn harvester_state(&self) -> Option<&HarvesterState> {
        match &self.state {
            EntityState::Harvester(state) => Some(state),
            _ => None,
        }
    }

    pub fn resource_amount(&self) -> f32 {
        match self.state {
            EntityState::Resource { amount } => amount,
            _ => 0.0,
        }
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Damage per shot from the rules table; 0 for non-combat entities
    pub fn damage(&self, rules: &RulesTable) -> f32 {
        match self.kind {
            EntityKind::Unit(kind) => rules.unit(kind).damage,
            EntityKind::Building(kind) => rules.building(kind).damage,
            _ => 0.0,
        }
    }

    pub fn danger_level(&self, rules: &RulesTable) -> f32 {
        match self.kind {
            EntityKind::Unit(kind) => rules.unit(kind).danger_level,
            EntityKind::Building(kind) => rules.building(kind).danger_level,
            _ => rules.unit(UnitKind::Unknown).danger_level,
        }
    }

    pub fn attack_range(&self, rules: &RulesTable) -> f32 {
        match self.kind {
            EntityKind::Unit(kind) => rules.unit(kind).attack_range,
            EntityKind::Building(kind) => rules.building(kind).attack_range,
            _ => 0.0,
        }
    }

    pub fn speed(&self, rules: &RulesTable) -> f32 {
        match self.kind {
            EntityKind::Unit(kind) => rules.unit(kind).speed,
            _ => 0.0,
        }
    }

    /// Max health scaled by armor class
    pub fn durability(&self, rules: &RulesTable) -> f32 {
        match self.kind {
            EntityKind::Unit(kind) => self.max_health * rules.unit(kind).armor.durability_factor(),
            _ => self.max_health,
        }
    }
}
