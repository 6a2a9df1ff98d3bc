//! Read-only world snapshot handed to the AI once per tick

use crate::core::types::{EntityId, PlayerId, Tick, Vec2};
use crate::world::entity::{EntityKind, EntitySnapshot};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Economic state of one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEconomy {
    pub player: PlayerId,
    pub credits: f32,
    /// Credits earned per minute
    pub income: f32,
    /// Credits spent per minute
    pub expense: f32,
    pub harvesters: u32,
    pub refineries: u32,
    pub queued_harvesters: u32,
    pub queued_refineries: u32,
}

impl PlayerEconomy {
    pub fn new(player: PlayerId, credits: f32) -> Self {
        Self {
            player,
            credits,
            income: 0.0,
            expense: 0.0,
            harvesters: 0,
            refineries: 0,
            queued_harvesters: 0,
            queued_refineries: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatEventKind {
    Attacked,
    Destroyed,
}

/// Combat event reported since the previous tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEvent {
    pub kind: CombatEventKind,
    pub tick: Tick,
    pub victim: EntityId,
    pub victim_owner: Option<PlayerId>,
    pub victim_kind: EntityKind,
    pub attacker: Option<EntityId>,
    pub position: Vec2,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    /// Map extent (width, height) in world units
    pub map_size: Vec2,
    entities: Vec<EntitySnapshot>,
    economies: Vec<PlayerEconomy>,
    events: Vec<CombatEvent>,
    #[serde(skip)]
    index: AHashMap<EntityId, usize>,
}

impl WorldSnapshot {
    pub fn new(tick: Tick, width: f32, height: f32) -> Self {
        Self {
            tick,
            map_size: Vec2::new(width, height),
            ..Default::default()
        }
    }

    pub fn add_entity(&mut self, entity: EntitySnapshot) {
        self.index.insert(entity.id, self.entities.len());
        self.entities.push(entity);
    }

    pub fn with_entity(mut self, entity: EntitySnapshot) -> Self {
        self.add_entity(entity);
        self
    }

    pub fn add_economy(&mut self, economy: PlayerEconomy) {
        self.economies.retain(|e| e.player != economy.player);
        self.economies.push(economy);
    }

    pub fn with_economy(mut self, economy: PlayerEconomy) -> Self {
        self.add_economy(economy);
        self
    }

    pub fn add_event(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Rebuild the id index, e.g. after deserialization
    pub fn rebuild_index(&mut self) {
        self.index = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
    }

    pub fn entities(&self) -> &[EntitySnapshot] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [EntitySnapshot] {
        &mut self.entities
    }

    /// Drop entities that no longer exist (health <= 0)
    pub fn remove_dead(&mut self) {
        self.entities.retain(|e| e.is_alive());
        self.rebuild_index();
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn economies(&self) -> &[PlayerEconomy] {
        &self.economies
    }

    pub fn economy(&self, player: PlayerId) -> Option<&PlayerEconomy> {
        self.economies.iter().find(|e| e.player == player)
    }

    pub fn economy_mut(&mut self, player: PlayerId) -> Option<&mut PlayerEconomy> {
        self.economies.iter_mut().find(|e| e.player == player)
    }

    pub fn get(&self, id: EntityId) -> Option<&EntitySnapshot> {
        if self.index.len() == self.entities.len() {
            self.index.get(&id).and_then(|&i| self.entities.get(i))
        } else {
            self.entities.iter().find(|e| e.id == id)
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntitySnapshot> {
        if self.index.len() == self.entities.len() {
            let i = *self.index.get(&id)?;
            self.entities.get_mut(i)
        } else {
            self.entities.iter_mut().find(|e| e.id == id)
        }
    }

    /// Entity by id, only if it is still alive
    pub fn get_alive(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.get(id).filter(|e| e.is_alive())
    }

    pub fn map_center(&self) -> Vec2 {
        self.map_size * 0.5
    }

    pub fn map_diagonal(&self) -> f32 {
        self.map_size.length()
    }

    /// Player ids with an economy entry, ascending
    pub fn players(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self.economies.iter().map(|e| e.player).collect();
        players.sort();
        players
    }
}
