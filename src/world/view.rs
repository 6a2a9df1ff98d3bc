//! One player's view of the world snapshot
//!
//! Bundles the snapshot, the rules table and the viewing player so the
//! decision code can ask "my units", "armed enemies near X" and so on.

use crate::core::types::{EntityId, PlayerId, Tick, Vec2};
use crate::rules::{BuildingKind, RulesTable};
use crate::world::entity::{EntityKind, EntitySnapshot};
use crate::world::snapshot::{PlayerEconomy, WorldSnapshot};
use ordered_float::OrderedFloat;

#[derive(Clone, Copy)]
pub struct PlayerView<'a> {
    pub snapshot: &'a WorldSnapshot,
    pub rules: &'a RulesTable,
    pub player: PlayerId,
}

impl<'a> PlayerView<'a> {
    pub fn new(snapshot: &'a WorldSnapshot, rules: &'a RulesTable, player: PlayerId) -> Self {
        Self {
            snapshot,
            rules,
            player,
        }
    }

    pub fn tick(&self) -> Tick {
        self.snapshot.tick
    }

    pub fn economy(&self) -> Option<&'a PlayerEconomy> {
        self.snapshot.economy(self.player)
    }

    /// Economies of every other player
    pub fn opponent_economies(&self) -> impl Iterator<Item = &'a PlayerEconomy> + 'a {
        let player = self.player;
        self.snapshot
            .economies()
            .iter()
            .filter(move |e| e.player != player)
    }

    /// Own entity by id, if alive
    pub fn own(&self, id: EntityId) -> Option<&'a EntitySnapshot> {
        self.snapshot
            .get_alive(id)
            .filter(|e| e.is_owned_by(self.player))
    }

    pub fn own_units(&self) -> impl Iterator<Item = &'a EntitySnapshot> + 'a {
        let player = self.player;
        self.snapshot
            .entities()
            .iter()
            .filter(move |e| e.is_alive() && e.is_owned_by(player) && e.unit_kind().is_some())
    }

    pub fn own_buildings(&self) -> impl Iterator<Item = &'a EntitySnapshot> + 'a {
        let player = self.player;
        self.snapshot
            .entities()
            .iter()
            .filter(move |e| e.is_alive() && e.is_owned_by(player) && e.building_kind().is_some())
    }

    pub fn own_harvesters(&self) -> impl Iterator<Item = &'a EntitySnapshot> + 'a {
        self.own_units().filter(|e| e.is_harvester())
    }

    /// Own units that can fight (armed or healing), harvesters excluded
    pub fn own_combat_units(&self) -> impl Iterator<Item = &'a EntitySnapshot> + 'a {
        let rules = self.rules;
        self.own_units()
            .filter(move |e| !e.is_harvester() && e.damage(rules) != 0.0)
    }

    pub fn own_refineries(&self) -> impl Iterator<Item = &'a EntitySnapshot> + 'a {
        self.own_buildings()
            .filter(|e| e.building_kind() == Some(BuildingKind::Refinery))
    }

    /// Every live enemy unit and building
    pub fn enemies(&self) -> impl Iterator<Item = &'a EntitySnapshot> + 'a {
        let player = self.player;
        self.snapshot
            .entities()
            .iter()
            .filter(move |e| e.is_hostile_to(player))
    }

    /// Live enemies able to deal damage
    pub fn armed_enemies(&self) -> impl Iterator<Item = &'a EntitySnapshot> + 'a {
        let rules = self.rules;
        self.enemies().filter(move |e| e.damage(rules) > 0.0)
    }

    pub fn resource_fields(&self) -> impl Iterator<Item = &'a EntitySnapshot> + 'a {
        self.snapshot
            .entities()
            .iter()
            .filter(|e| e.kind == EntityKind::ResourceField && e.resource_amount() > 0.0)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &'a EntitySnapshot> + 'a {
        self.snapshot
            .entities()
            .iter()
            .filter(|e| e.is_alive() && e.is_obstacle())
    }

    /// Centroid of own buildings, falling back to own units
    pub fn base_center(&self) -> Option<Vec2> {
        Vec2::centroid(self.own_buildings().map(|b| b.position))
            .or_else(|| Vec2::centroid(self.own_units().map(|u| u.position)))
    }

    /// Nearest live enemy to `pos`, optionally within `max_distance`.
    /// Ties resolve to the lower entity id.
    pub fn nearest_enemy(&self, pos: Vec2, max_distance: Option<f32>) -> Option<&'a EntitySnapshot> {
        nearest(self.enemies(), pos, max_distance)
    }

    pub fn nearest_armed_enemy(
        &self,
        pos: Vec2,
        max_distance: Option<f32>,
    ) -> Option<&'a EntitySnapshot> {
        nearest(self.armed_enemies(), pos, max_distance)
    }

    pub fn nearest_refinery(&self, pos: Vec2) -> Option<&'a EntitySnapshot> {
        nearest(self.own_refineries(), pos, None)
    }

    pub fn any_enemy_within(&self, pos: Vec2, radius: f32) -> bool {
        self.enemies().any(|e| e.position.distance(&pos) <= radius)
    }
}

/// Nearest entity to `pos` with deterministic tie-breaking on id
pub fn nearest<'a, I>(entities: I, pos: Vec2, max_distance: Option<f32>) -> Option<&'a EntitySnapshot>
where
    I: Iterator<Item = &'a EntitySnapshot>,
{
    entities
        .filter(|e| max_distance.map_or(true, |max| e.position.distance(&pos) <= max))
        .min_by_key(|e| (OrderedFloat(e.position.distance(&pos)), e.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::UnitKind;

    fn world() -> WorldSnapshot {
        WorldSnapshot::new(0, 2000.0, 2000.0)
            .with_entity(EntitySnapshot::building(
                EntityId(1),
                PlayerId(1),
                BuildingKind::ConstructionYard,
                Vec2::new(100.0, 100.0),
            ))
            .with_entity(EntitySnapshot::building(
                EntityId(2),
                PlayerId(1),
                BuildingKind::Refinery,
                Vec2::new(300.0, 100.0),
            ))
            .with_entity(EntitySnapshot::unit(
                EntityId(3),
                PlayerId(1),
                UnitKind::Harvester,
                Vec2::new(400.0, 400.0),
            ))
            .with_entity(EntitySnapshot::unit(
                EntityId(4),
                PlayerId(1),
                UnitKind::LightTank,
                Vec2::new(200.0, 200.0),
            ))
            .with_entity(EntitySnapshot::unit(
                EntityId(5),
                PlayerId(2),
                UnitKind::Engineer,
                Vec2::new(600.0, 600.0),
            ))
            .with_entity(EntitySnapshot::unit(
                EntityId(6),
                PlayerId(2),
                UnitKind::HeavyTank,
                Vec2::new(900.0, 900.0),
            ))
    }

    #[test]
    fn test_base_center_from_buildings() {
        let snapshot = world();
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        assert_eq!(view.base_center(), Some(Vec2::new(200.0, 100.0)));
    }

    #[test]
    fn test_combat_units_exclude_harvesters() {
        let snapshot = world();
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        let ids: Vec<EntityId> = view.own_combat_units().map(|u| u.id).collect();
        assert_eq!(ids, vec![EntityId(4)]);
    }

    #[test]
    fn test_armed_enemies_skip_engineers() {
        let snapshot = world();
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        assert_eq!(view.enemies().count(), 2);
        let armed: Vec<EntityId> = view.armed_enemies().map(|e| e.id).collect();
        assert_eq!(armed, vec![EntityId(6)]);
    }

    #[test]
    fn test_nearest_enemy_respects_radius() {
        let snapshot = world();
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        let origin = Vec2::new(500.0, 500.0);
        assert_eq!(view.nearest_enemy(origin, None).map(|e| e.id), Some(EntityId(5)));
        assert!(view.nearest_enemy(origin, Some(50.0)).is_none());
    }
}
