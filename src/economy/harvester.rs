//! Harvester roles, risk-aware routing and stuck resolution

use crate::command::Command;
use crate::core::config::HarvestConfig;
use crate::core::types::{EntityId, Tick, Vec2};
use crate::economy::danger_map::DangerMap;
use crate::economy::desperation::RiskBand;
use crate::world::{EntitySnapshot, HarvestActivity, PlayerView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvesterRole {
    Cautious,
    #[default]
    Standard,
    Bold,
}

impl HarvesterRole {
    /// Highest zone danger this role tolerates under `band`
    pub fn max_danger(&self, band: RiskBand) -> f32 {
        match self {
            HarvesterRole::Cautious => band.max_danger() / 2.0,
            HarvesterRole::Standard => band.max_danger(),
            HarvesterRole::Bold => 100.0,
        }
    }
}

/// Own harvesters ordered by id
fn harvesters_by_id<'a>(view: &PlayerView<'a>) -> Vec<&'a EntitySnapshot> {
    let mut harvesters: Vec<&EntitySnapshot> = view.own_harvesters().collect();
    harvesters.sort_by_key(|h| h.id);
    harvesters
}

/// Damaged harvesters turn cautious; a desperation-sized share of the rest
/// (lowest ids first) turns bold
pub fn assign_roles(
    view: &PlayerView,
    desperation: f32,
    config: &HarvestConfig,
) -> BTreeMap<EntityId, HarvesterRole> {
    let mut roles = BTreeMap::new();
    let mut healthy = Vec::new();

    for harvester in harvesters_by_id(view) {
        if harvester.health_ratio() < config.cautious_health_ratio {
            roles.insert(harvester.id, HarvesterRole::Cautious);
        } else {
            healthy.push(harvester.id);
        }
    }

    let bold = (healthy.len() as f32 * desperation.clamp(0.0, 100.0) / 100.0).round() as usize;
    for (i, id) in healthy.into_iter().enumerate() {
        let role = if i < bold {
            HarvesterRole::Bold
        } else {
            HarvesterRole::Standard
        };
        roles.insert(id, role);
    }

    roles
}

/// Flee dangerous zones and send idle harvesters to the safest field
pub fn route_harvesters(
    view: &PlayerView,
    danger: &DangerMap,
    roles: &BTreeMap<EntityId, HarvesterRole>,
    desperation: f32,
    config: &HarvestConfig,
    commands: &mut Vec<Command>,
) {
    let band = RiskBand::from_score(desperation);
    let fields: Vec<&EntitySnapshot> = view.resource_fields().collect();

    for harvester in harvesters_by_id(view) {
        let role = roles.get(&harvester.id).copied().unwrap_or_default();
        let limit = role.max_danger(band);
        let position = harvester.position;

        if danger.danger_at(position) > limit {
            if let Some(destination) = flee_destination(view, position, band, config) {
                debug!(harvester = %harvester.id, ?role, "harvester fleeing");
                commands.push(Command::move_unit(harvester.id, destination));
            }
            continue;
        }

        if !needs_field(view, harvester) {
            continue;
        }

        let acceptable: Vec<&EntitySnapshot> = fields
            .iter()
            .copied()
            .filter(|f| danger.danger_at(f.position) <= limit)
            .collect();
        let pool = if acceptable.is_empty() { &fields } else { &acceptable };

        if let Some(field) = danger.select_safest_target(position, pool, desperation) {
            commands.push(Command::move_unit(harvester.id, field.position));
        }
    }
}

fn flee_destination(
    view: &PlayerView,
    position: Vec2,
    band: RiskBand,
    config: &HarvestConfig,
) -> Option<Vec2> {
    if let Some(enemy) = view.nearest_armed_enemy(position, None) {
        let away = (position - enemy.position).normalize_or(Vec2::new(-1.0, 0.0));
        return Some(position + away * (config.flee_distance * band.flee_multiplier()));
    }
    view.nearest_refinery(position).map(|r| r.position)
}

/// Idle, or working a field that is gone or empty
fn needs_field(view: &PlayerView, harvester: &EntitySnapshot) -> bool {
    let Some(state) = harvester.harvester_state() else {
        return false;
    };
    match state.activity {
        HarvestActivity::Idle => true,
        HarvestActivity::MovingToResource | HarvestActivity::Harvesting => !field_available(view, state.target),
        HarvestActivity::Returning | HarvestActivity::Unloading => false,
    }
}

fn field_available(view: &PlayerView, field: Option<EntityId>) -> bool {
    field
        .and_then(|id| view.snapshot.get(id))
        .map_or(false, |f| f.resource_amount() > 0.0)
}

/// Progress tracking for one harvester
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StuckState {
    pub last_position: Vec2,
    pub stuck_ticks: Tick,
    pub attempts: u32,
}

impl StuckState {
    fn new(position: Vec2) -> Self {
        Self {
            last_position: position,
            stuck_ticks: 0,
            attempts: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StuckTracker {
    states: BTreeMap<EntityId, StuckState>,
}

impl StuckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EntityId) -> Option<&StuckState> {
        self.states.get(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Advance tracking by `elapsed` ticks and resolve harvesters that have
    /// not moved for long enough
    pub fn update(
        &mut self,
        view: &PlayerView,
        danger: &DangerMap,
        desperation: f32,
        elapsed: Tick,
        config: &HarvestConfig,
        commands: &mut Vec<Command>,
    ) {
        let harvesters = harvesters_by_id(view);
        self.states
            .retain(|id, _| harvesters.iter().any(|h| h.id == *id));

        for harvester in harvesters {
            let Some(activity) = harvester.harvester_state().map(|s| s.activity) else {
                continue;
            };

            if !self.states.contains_key(&harvester.id) {
                self.states
                    .insert(harvester.id, StuckState::new(harvester.position));
                continue;
            }
            let Some(state) = self.states.get_mut(&harvester.id) else {
                continue;
            };

            let moved = harvester.position.distance(&state.last_position);
            state.last_position = harvester.position;

            if activity == HarvestActivity::Harvesting {
                state.stuck_ticks = 0;
                state.attempts = 0;
                continue;
            }

            if !activity.is_travelling() || moved >= config.stuck_move_epsilon {
                state.stuck_ticks = 0;
                continue;
            }

            state.stuck_ticks += elapsed;
            if state.stuck_ticks < config.stuck_threshold_ticks {
                continue;
            }

            state.stuck_ticks = 0;
            state.attempts += 1;
            let attempts = state.attempts;
            debug!(harvester = %harvester.id, attempts, "resolving stuck harvester");

            if attempts <= config.nudge_attempts {
                let heading = travel_heading(view, harvester);
                let side = if attempts % 2 == 1 { 1.0 } else { -1.0 };
                let destination =
                    harvester.position + heading.perpendicular() * (side * config.nudge_distance);
                commands.push(Command::move_unit(harvester.id, destination));
            } else if let Some(field) = alternative_field(view, danger, harvester, desperation) {
                commands.push(Command::move_unit(harvester.id, field.position));
            }
        }
    }
}

/// Direction the harvester is trying to go
fn travel_heading(view: &PlayerView, harvester: &EntitySnapshot) -> Vec2 {
    let fallback = Vec2::new(1.0, 0.0);
    let Some(state) = harvester.harvester_state() else {
        return fallback;
    };
    let goal = match state.activity {
        HarvestActivity::Returning => view.nearest_refinery(harvester.position).map(|r| r.position),
        _ => state
            .target
            .and_then(|id| view.snapshot.get(id))
            .map(|f| f.position),
    };
    goal.map_or(fallback, |g| (g - harvester.position).normalize_or(fallback))
}

fn alternative_field<'a>(
    view: &PlayerView<'a>,
    danger: &DangerMap,
    harvester: &EntitySnapshot,
    desperation: f32,
) -> Option<&'a EntitySnapshot> {
    let current = harvester.harvester_state().and_then(|s| s.target);
    let candidates: Vec<&EntitySnapshot> = view
        .resource_fields()
        .filter(|f| Some(f.id) != current)
        .collect();
    danger.select_safest_target(harvester.position, &candidates, desperation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::policy::DangerMode;
    use crate::core::config::DangerConfig;
    use crate::core::types::PlayerId;
    use crate::rules::{RulesTable, UnitKind};
    use crate::world::{EntityState, HarvesterState, WorldSnapshot};

    const ME: PlayerId = PlayerId(1);

    fn harvester(id: u32, x: f32, y: f32) -> EntitySnapshot {
        EntitySnapshot::unit(EntityId(id), ME, UnitKind::Harvester, Vec2::new(x, y))
    }

    fn moving_to(field: u32) -> EntityState {
        EntityState::Harvester(HarvesterState {
            activity: HarvestActivity::MovingToResource,
            target: Some(EntityId(field)),
            cargo: 0.0,
        })
    }

    #[test]
    fn test_role_assignment() {
        let snapshot = WorldSnapshot::new(60, 2000.0, 2000.0)
            .with_entity(harvester(1, 0.0, 0.0))
            .with_entity(harvester(2, 0.0, 0.0).with_health(100.0, 400.0))
            .with_entity(harvester(3, 0.0, 0.0))
            .with_entity(harvester(4, 0.0, 0.0))
            .with_entity(harvester(5, 0.0, 0.0));
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, ME);

        let roles = assign_roles(&view, 50.0, &HarvestConfig::default());
        assert_eq!(roles[&EntityId(2)], HarvesterRole::Cautious);
        assert_eq!(roles[&EntityId(1)], HarvesterRole::Bold);
        assert_eq!(roles[&EntityId(3)], HarvesterRole::Bold);
        assert_eq!(roles[&EntityId(4)], HarvesterRole::Standard);
        assert_eq!(roles[&EntityId(5)], HarvesterRole::Standard);
    }

    #[test]
    fn test_role_limits() {
        assert_eq!(HarvesterRole::Cautious.max_danger(RiskBand::Balanced), 25.0);
        assert_eq!(HarvesterRole::Standard.max_danger(RiskBand::Balanced), 50.0);
        assert_eq!(HarvesterRole::Bold.max_danger(RiskBand::VeryCautious), 100.0);
    }

    #[test]
    fn test_idle_harvester_sent_to_field() {
        let snapshot = WorldSnapshot::new(30, 2000.0, 2000.0)
            .with_entity(harvester(1, 100.0, 100.0))
            .with_entity(EntitySnapshot::resource(EntityId(20), Vec2::new(900.0, 100.0), 500.0))
            .with_entity(EntitySnapshot::resource(EntityId(21), Vec2::new(300.0, 100.0), 500.0))
            .with_entity(EntitySnapshot::resource(EntityId(22), Vec2::new(200.0, 100.0), 0.0));
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, ME);
        let map = DangerMap::new(DangerConfig::default());
        let mut commands = Vec::new();

        route_harvesters(&view, &map, &BTreeMap::new(), 30.0, &HarvestConfig::default(), &mut commands);
        assert_eq!(commands, vec![Command::move_unit(EntityId(1), Vec2::new(300.0, 100.0))]);
    }

    #[test]
    fn test_harvester_flees_dangerous_zone() {
        let mut snapshot = WorldSnapshot::new(30, 2000.0, 2000.0).with_entity(harvester(1, 500.0, 500.0));
        for i in 0..3 {
            snapshot.add_entity(EntitySnapshot::unit(
                EntityId(10 + i),
                PlayerId(2),
                UnitKind::Infantry,
                Vec2::new(550.0, 500.0),
            ));
        }
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, ME);
        let mut map = DangerMap::new(DangerConfig::default());
        map.update(&view, DangerMode::Presence);
        let mut commands = Vec::new();

        // Balanced band (30), standard role: 75 > 50
        route_harvesters(&view, &map, &BTreeMap::new(), 30.0, &HarvestConfig::default(), &mut commands);
        assert_eq!(commands, vec![Command::move_unit(EntityId(1), Vec2::new(200.0, 500.0))]);
    }

    #[test]
    fn test_stuck_harvester_nudged_then_retargeted() {
        let rules = RulesTable::standard();
        let map = DangerMap::new(DangerConfig::default());
        let config = HarvestConfig::default();
        let mut tracker = StuckTracker::new();
        let mut commands = Vec::new();

        let snapshot = WorldSnapshot::new(0, 2000.0, 2000.0)
            .with_entity(harvester(1, 100.0, 100.0).with_state(moving_to(20)))
            .with_entity(EntitySnapshot::resource(EntityId(20), Vec2::new(900.0, 100.0), 500.0))
            .with_entity(EntitySnapshot::resource(EntityId(21), Vec2::new(100.0, 900.0), 500.0));
        let view = PlayerView::new(&snapshot, &rules, ME);

        for _ in 0..config.stuck_threshold_ticks {
            tracker.update(&view, &map, 30.0, 1, &config, &mut commands);
        }
        assert!(commands.is_empty());
        tracker.update(&view, &map, 30.0, 1, &config, &mut commands);
        assert_eq!(commands, vec![Command::move_unit(EntityId(1), Vec2::new(100.0, 180.0))]);

        for _ in 0..config.stuck_threshold_ticks {
            tracker.update(&view, &map, 30.0, 1, &config, &mut commands);
        }
        assert_eq!(commands[1], Command::move_unit(EntityId(1), Vec2::new(100.0, 20.0)));

        for _ in 0..config.stuck_threshold_ticks {
            tracker.update(&view, &map, 30.0, 1, &config, &mut commands);
        }
        assert_eq!(commands[2], Command::move_unit(EntityId(1), Vec2::new(100.0, 900.0)));
        assert_eq!(tracker.get(EntityId(1)).unwrap().attempts, 3);
    }

    #[test]
    fn test_harvesting_resets_attempts() {
        let rules = RulesTable::standard();
        let map = DangerMap::new(DangerConfig::default());
        let config = HarvestConfig::default();
        let mut tracker = StuckTracker::new();
        let mut commands = Vec::new();

        let stuck = WorldSnapshot::new(0, 2000.0, 2000.0)
            .with_entity(harvester(1, 100.0, 100.0).with_state(moving_to(20)));
        let view = PlayerView::new(&stuck, &rules, ME);
        for _ in 0..=config.stuck_threshold_ticks {
            tracker.update(&view, &map, 30.0, 1, &config, &mut commands);
        }
        assert_eq!(tracker.get(EntityId(1)).unwrap().attempts, 1);

        let working = WorldSnapshot::new(0, 2000.0, 2000.0).with_entity(
            harvester(1, 100.0, 100.0).with_state(EntityState::Harvester(HarvesterState {
                activity: HarvestActivity::Harvesting,
                target: Some(EntityId(20)),
                cargo: 10.0,
            })),
        );
        tracker.update(&PlayerView::new(&working, &rules, ME), &map, 30.0, 1, &config, &mut commands);
        assert_eq!(tracker.get(EntityId(1)).unwrap().attempts, 0);
    }
}
