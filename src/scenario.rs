//! Seeded synthetic skirmish
//!
//! Generates a map with bases, armies, harvesters, resource fields and
//! rocks from a ChaCha seed, and advances it with a deliberately crude
//! simulation: straight-line movement, flat damage, a simple harvest cycle
//! and delayed production. It exists to feed the decision layer realistic
//! snapshot sequences in tests, benches and the replay checker.

use crate::ai::{update_players, update_players_sequential, AiContext, Difficulty, PlayerCommands};
use crate::command::{BuildCategory, Command};
use crate::core::config::AiConfig;
use crate::core::types::{EntityId, PlayerId, Tick, Vec2};
use crate::rules::{BuildingKind, RulesTable, UnitKind};
use crate::world::{
    CombatEvent, CombatEventKind, EntityKind, EntitySnapshot, EntityState, HarvestActivity,
    PlayerEconomy, WorldSnapshot,
};
use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f32::consts::PI;
use tracing::{debug, trace};

/// Rules speed is scaled by this to get world units per tick
const SPEED_SCALE: f32 = 3.0;
/// Rules damage is scaled by this to get damage per tick
const DAMAGE_SCALE: f32 = 0.2;
const HARVEST_RATE: f32 = 2.0;
const CARGO_CAPACITY: f32 = 100.0;
/// Distance at which harvesters reach fields and refineries
const INTERACT_RADIUS: f32 = 40.0;
const BUILD_TICKS: Tick = 240;
/// Window over which income and expense are measured
const ECONOMY_WINDOW: Tick = 600;
const TICKS_PER_MINUTE: f32 = 3600.0;

const ARMY_POOL: [UnitKind; 7] = [
    UnitKind::Infantry,
    UnitKind::Infantry,
    UnitKind::RocketSoldier,
    UnitKind::LightTank,
    UnitKind::HeavyTank,
    UnitKind::Jeep,
    UnitKind::Artillery,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub seed: u64,
    pub players: u8,
    pub width: f32,
    pub height: f32,
    pub units_per_player: u32,
    pub harvesters_per_player: u32,
    pub resource_fields: u32,
    /// Rock pairs; each pair is placed close enough to form a chokepoint
    pub rock_pairs: u32,
    pub starting_credits: f32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            players: 2,
            width: 3000.0,
            height: 3000.0,
            units_per_player: 8,
            harvesters_per_player: 3,
            resource_fields: 10,
            rock_pairs: 6,
            starting_credits: 4000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Order {
    Move(Vec2),
    Attack(EntityId),
}

#[derive(Debug, Clone)]
struct PendingBuild {
    ready: Tick,
    player: PlayerId,
    kind: EntityKind,
}

#[derive(Debug, Clone, Copy, Default)]
struct Ledger {
    earned: f32,
    spent: f32,
}

pub struct Skirmish {
    snapshot: WorldSnapshot,
    rules: RulesTable,
    orders: BTreeMap<EntityId, Order>,
    pending: Vec<PendingBuild>,
    ledgers: BTreeMap<PlayerId, Ledger>,
    next_id: u32,
}

impl Skirmish {
    pub fn generate(config: &ScenarioConfig, rules: RulesTable) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut skirmish = Self {
            snapshot: WorldSnapshot::new(0, config.width, config.height),
            rules,
            orders: BTreeMap::new(),
            pending: Vec::new(),
            ledgers: BTreeMap::new(),
            next_id: 0,
        };

        let center = Vec2::new(config.width / 2.0, config.height / 2.0);
        let base_radius = 0.35 * config.width.min(config.height);

        for p in 0..config.players {
            let player = PlayerId(p + 1);
            let angle = PI + 2.0 * PI * p as f32 / config.players.max(1) as f32;
            let base = center + Vec2::new(angle.cos(), angle.sin()) * base_radius;
            skirmish.spawn_base(&mut rng, config, player, base);
        }

        for _ in 0..config.resource_fields {
            let position = random_point(&mut rng, config, 100.0);
            let amount = rng.gen_range(2000.0..5000.0);
            let id = skirmish.allocate_id();
            skirmish
                .snapshot
                .add_entity(EntitySnapshot::resource(id, position, amount));
        }

        for _ in 0..config.rock_pairs {
            let first = random_point(&mut rng, config, 150.0);
            let angle = rng.gen_range(0.0..2.0 * PI);
            let gap = rng.gen_range(90.0..190.0);
            let second = first + Vec2::new(angle.cos(), angle.sin()) * gap;
            let id = skirmish.allocate_id();
            skirmish.snapshot.add_entity(EntitySnapshot::rock(id, first));
            let id = skirmish.allocate_id();
            skirmish.snapshot.add_entity(EntitySnapshot::rock(id, second));
        }

        skirmish.refresh_economy_counts();
        skirmish
    }

    fn spawn_base(
        &mut self,
        rng: &mut ChaCha8Rng,
        config: &ScenarioConfig,
        player: PlayerId,
        base: Vec2,
    ) {
        let structures = [
            (BuildingKind::ConstructionYard, Vec2::ZERO),
            (BuildingKind::Refinery, Vec2::new(150.0, 0.0)),
            (BuildingKind::PowerPlant, Vec2::new(0.0, 150.0)),
            (BuildingKind::Barracks, Vec2::new(-150.0, 0.0)),
        ];
        for (kind, offset) in structures {
            let id = self.allocate_id();
            self.snapshot
                .add_entity(EntitySnapshot::building(id, player, kind, base + offset));
        }

        for _ in 0..config.units_per_player {
            let kind = ARMY_POOL[rng.gen_range(0..ARMY_POOL.len())];
            let offset = Vec2::new(rng.gen_range(-250.0..250.0), rng.gen_range(-250.0..250.0));
            let id = self.allocate_id();
            self.snapshot
                .add_entity(EntitySnapshot::unit(id, player, kind, base + offset));
        }

        for i in 0..config.harvesters_per_player {
            let id = self.allocate_id();
            let position = base + Vec2::new(150.0, 60.0 + 40.0 * i as f32);
            self.snapshot.add_entity(EntitySnapshot::unit(
                id,
                player,
                UnitKind::Harvester,
                position,
            ));
        }

        self.snapshot
            .add_economy(PlayerEconomy::new(player, config.starting_credits));
        self.ledgers.insert(player, Ledger::default());
    }

    fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    pub fn snapshot(&self) -> &WorldSnapshot {
        &self.snapshot
    }

    pub fn rules(&self) -> &RulesTable {
        &self.rules
    }

    pub fn tick(&self) -> Tick {
        self.snapshot.tick
    }

    /// Accept the commands each player issued this tick
    pub fn apply(&mut self, issued: &[PlayerCommands]) {
        for batch in issued {
            for command in &batch.commands {
                self.apply_command(batch.player, command);
            }
        }
    }

    fn apply_command(&mut self, player: PlayerId, command: &Command) {
        match command {
            Command::Move {
                unit_ids,
                destination,
            } => {
                let field = self.field_near(*destination);
                for &id in unit_ids {
                    let Some(unit) = self.owned_unit_mut(player, id) else {
                        continue;
                    };
                    match &mut unit.state {
                        EntityState::Harvester(state) => match field {
                            Some(field) => {
                                state.activity = HarvestActivity::MovingToResource;
                                state.target = Some(field);
                            }
                            None => state.activity = HarvestActivity::Idle,
                        },
                        EntityState::Combat { target } => *target = None,
                        _ => {}
                    }
                    self.orders.insert(id, Order::Move(*destination));
                }
            }
            Command::Attack { unit_ids, target } => {
                for &id in unit_ids {
                    let Some(unit) = self.owned_unit_mut(player, id) else {
                        continue;
                    };
                    let EntityState::Combat { target: current } = &mut unit.state else {
                        continue;
                    };
                    *current = Some(*target);
                    self.orders.insert(id, Order::Attack(*target));
                }
            }
            Command::StartBuild { category, key } => {
                let (kind, cost) = match category {
                    BuildCategory::Unit => {
                        let kind = UnitKind::from_key(key);
                        (EntityKind::Unit(kind), self.rules.unit(kind).cost)
                    }
                    BuildCategory::Building => {
                        let kind = BuildingKind::from_key(key);
                        (EntityKind::Building(kind), self.rules.building(kind).cost)
                    }
                };
                let cost = cost as f32;
                let Some(economy) = self.snapshot.economy_mut(player) else {
                    return;
                };
                if economy.credits < cost {
                    return;
                }
                economy.credits -= cost;
                match kind {
                    EntityKind::Unit(UnitKind::Harvester) => economy.queued_harvesters += 1,
                    EntityKind::Building(BuildingKind::Refinery) => economy.queued_refineries += 1,
                    _ => {}
                }
                if let Some(ledger) = self.ledgers.get_mut(&player) {
                    ledger.spent += cost;
                }
                self.pending.push(PendingBuild {
                    ready: self.snapshot.tick + BUILD_TICKS,
                    player,
                    kind,
                });
            }
        }
    }

    fn owned_unit_mut(&mut self, player: PlayerId, id: EntityId) -> Option<&mut EntitySnapshot> {
        self.snapshot
            .get_mut(id)
            .filter(|e| e.is_alive() && e.is_owned_by(player) && e.unit_kind().is_some())
    }

    fn field_near(&self, position: Vec2) -> Option<EntityId> {
        self.snapshot
            .entities()
            .iter()
            .filter(|e| e.kind == EntityKind::ResourceField && e.resource_amount() > 0.0)
            .filter(|e| e.position.distance(&position) <= INTERACT_RADIUS)
            .min_by_key(|e| (OrderedFloat(e.position.distance(&position)), e.id))
            .map(|e| e.id)
    }

    /// Advance the world by one tick
    pub fn step(&mut self) {
        self.snapshot.tick += 1;
        self.snapshot.clear_events();

        self.complete_builds();

        let mut units: Vec<EntityId> = self
            .snapshot
            .entities()
            .iter()
            .filter(|e| e.is_alive() && e.unit_kind().is_some())
            .map(|e| e.id)
            .collect();
        units.sort();

        for id in units {
            if self.snapshot.get_alive(id).is_none() {
                continue;
            }
            match self.orders.get(&id).copied() {
                Some(Order::Move(destination)) => self.step_move(id, destination),
                Some(Order::Attack(target)) => self.step_attack(id, target),
                None => self.step_idle(id),
            }
        }

        self.snapshot.remove_dead();
        let snapshot = &self.snapshot;
        self.orders.retain(|id, _| snapshot.get(*id).is_some());
        self.refresh_economy_counts();

        if self.snapshot.tick % ECONOMY_WINDOW == 0 {
            self.roll_economy_window();
        }
    }

    fn complete_builds(&mut self) {
        let tick = self.snapshot.tick;
        let (ready, waiting): (Vec<PendingBuild>, Vec<PendingBuild>) =
            self.pending.drain(..).partition(|b| b.ready <= tick);
        self.pending = waiting;

        for build in ready {
            let Some(yard) = self.base_of(build.player) else {
                continue;
            };
            let id = self.allocate_id();
            let offset = Vec2::new(((id.0 % 7) as f32 - 3.0) * 50.0, 220.0);
            let entity = match build.kind {
                EntityKind::Unit(kind) => EntitySnapshot::unit(id, build.player, kind, yard + offset),
                EntityKind::Building(kind) => {
                    EntitySnapshot::building(id, build.player, kind, yard + offset)
                }
                _ => continue,
            };
            trace!(player = %build.player, id = %id, kind = ?build.kind, "build complete");
            self.snapshot.add_entity(entity);

            if let Some(economy) = self.snapshot.economy_mut(build.player) {
                match build.kind {
                    EntityKind::Unit(UnitKind::Harvester) => {
                        economy.queued_harvesters = economy.queued_harvesters.saturating_sub(1)
                    }
                    EntityKind::Building(BuildingKind::Refinery) => {
                        economy.queued_refineries = economy.queued_refineries.saturating_sub(1)
                    }
                    _ => {}
                }
            }
        }
    }

    fn base_of(&self, player: PlayerId) -> Option<Vec2> {
        self.snapshot
            .entities()
            .iter()
            .find(|e| {
                e.is_alive()
                    && e.is_owned_by(player)
                    && e.building_kind() == Some(BuildingKind::ConstructionYard)
            })
            .map(|e| e.position)
    }

    fn speed_of(&self, entity: &EntitySnapshot) -> f32 {
        entity.speed(&self.rules) * SPEED_SCALE
    }

    fn step_move(&mut self, id: EntityId, destination: Vec2) {
        let Some(unit) = self.snapshot.get(id) else {
            return;
        };
        let step = self.speed_of(unit);
        let arrived = unit.position.distance(&destination) <= step;
        if let Some(unit) = self.snapshot.get_mut(id) {
            unit.position = advance(unit.position, destination, step);
        }
        if arrived {
            self.orders.remove(&id);
        }
    }

    fn step_attack(&mut self, id: EntityId, target: EntityId) {
        let Some(unit) = self.snapshot.get(id).cloned() else {
            return;
        };
        let Some(owner) = unit.owner else {
            return;
        };
        let target_position = self
            .snapshot
            .get_alive(target)
            .filter(|t| t.is_hostile_to(owner))
            .map(|t| t.position);
        let damage = unit.damage(&self.rules) * DAMAGE_SCALE;

        let Some(target_position) = target_position.filter(|_| damage > 0.0) else {
            self.orders.remove(&id);
            if let Some(unit) = self.snapshot.get_mut(id) {
                unit.state = EntityState::Combat { target: None };
            }
            return;
        };

        if unit.position.distance(&target_position) > unit.attack_range(&self.rules) {
            let step = self.speed_of(&unit);
            if let Some(unit) = self.snapshot.get_mut(id) {
                unit.position = advance(unit.position, target_position, step);
            }
        } else {
            self.deal_damage(id, target, damage);
        }
    }

    fn step_idle(&mut self, id: EntityId) {
        let Some(unit) = self.snapshot.get(id).cloned() else {
            return;
        };
        if unit.is_harvester() {
            self.step_harvester(unit);
            return;
        }

        let (Some(owner), true) = (unit.owner, unit.damage(&self.rules) > 0.0) else {
            return;
        };
        let range = unit.attack_range(&self.rules);
        let nearby = self
            .snapshot
            .entities()
            .iter()
            .filter(|e| e.is_hostile_to(owner) && e.position.distance(&unit.position) <= range)
            .min_by_key(|e| (OrderedFloat(e.position.distance(&unit.position)), e.id))
            .map(|e| e.id);

        if let Some(target) = nearby {
            self.orders.insert(id, Order::Attack(target));
            if let Some(unit) = self.snapshot.get_mut(id) {
                unit.state = EntityState::Combat {
                    target: Some(target),
                };
            }
        }
    }

    fn step_harvester(&mut self, mut unit: EntitySnapshot) {
        let Some(mut state) = unit.harvester_state().copied() else {
            return;
        };
        let Some(owner) = unit.owner else {
            return;
        };
        let step = self.speed_of(&unit);

        match state.activity {
            HarvestActivity::MovingToResource => {
                match state.target.and_then(|t| self.snapshot.get(t)).map(|f| f.position) {
                    Some(field) if unit.position.distance(&field) <= INTERACT_RADIUS => {
                        state.activity = HarvestActivity::Harvesting;
                    }
                    Some(field) => unit.position = advance(unit.position, field, step),
                    None => state.activity = HarvestActivity::Idle,
                }
            }
            HarvestActivity::Harvesting => {
                let field = state.target.and_then(|t| self.snapshot.get_mut(t));
                let taken = match field {
                    Some(field) => match &mut field.state {
                        EntityState::Resource { amount } => {
                            let taken = amount.min(HARVEST_RATE);
                            *amount -= taken;
                            taken
                        }
                        _ => 0.0,
                    },
                    None => 0.0,
                };
                state.cargo += taken;
                if state.cargo >= CARGO_CAPACITY || taken == 0.0 {
                    state.activity = HarvestActivity::Returning;
                }
            }
            HarvestActivity::Returning | HarvestActivity::Unloading => {
                let refinery = self
                    .snapshot
                    .entities()
                    .iter()
                    .filter(|e| {
                        e.is_alive()
                            && e.is_owned_by(owner)
                            && e.building_kind() == Some(BuildingKind::Refinery)
                    })
                    .min_by_key(|e| (OrderedFloat(e.position.distance(&unit.position)), e.id))
                    .map(|e| e.position);
                match refinery {
                    Some(refinery) if unit.position.distance(&refinery) <= INTERACT_RADIUS => {
                        self.deliver(owner, state.cargo);
                        state.cargo = 0.0;
                        let field_left = state
                            .target
                            .and_then(|t| self.snapshot.get(t))
                            .map_or(false, |f| f.resource_amount() > 0.0);
                        state.activity = if field_left {
                            HarvestActivity::MovingToResource
                        } else {
                            HarvestActivity::Idle
                        };
                    }
                    Some(refinery) => {
                        state.activity = HarvestActivity::Returning;
                        unit.position = advance(unit.position, refinery, step);
                    }
                    None => {}
                }
            }
            HarvestActivity::Idle => {}
        }

        unit.state = EntityState::Harvester(state);
        if let Some(slot) = self.snapshot.get_mut(unit.id) {
            *slot = unit;
        }
    }

    fn deliver(&mut self, player: PlayerId, cargo: f32) {
        if let Some(economy) = self.snapshot.economy_mut(player) {
            economy.credits += cargo;
        }
        if let Some(ledger) = self.ledgers.get_mut(&player) {
            ledger.earned += cargo;
        }
    }

    fn deal_damage(&mut self, attacker: EntityId, target: EntityId, damage: f32) {
        let tick = self.snapshot.tick;
        let Some(victim) = self.snapshot.get_mut(target) else {
            return;
        };
        victim.health -= damage;
        let destroyed = victim.health <= 0.0;
        let event = CombatEvent {
            kind: CombatEventKind::Attacked,
            tick,
            victim: victim.id,
            victim_owner: victim.owner,
            victim_kind: victim.kind,
            attacker: Some(attacker),
            position: victim.position,
        };

        self.snapshot.add_event(event.clone());
        if destroyed {
            self.snapshot.add_event(CombatEvent {
                kind: CombatEventKind::Destroyed,
                ..event
            });
        }
    }

    fn refresh_economy_counts(&mut self) {
        let mut harvesters: BTreeMap<PlayerId, u32> = BTreeMap::new();
        let mut refineries: BTreeMap<PlayerId, u32> = BTreeMap::new();
        for entity in self.snapshot.entities() {
            let Some(owner) = entity.owner.filter(|_| entity.is_alive()) else {
                continue;
            };
            if entity.is_harvester() {
                *harvesters.entry(owner).or_default() += 1;
            } else if entity.building_kind() == Some(BuildingKind::Refinery) {
                *refineries.entry(owner).or_default() += 1;
            }
        }

        for player in self.snapshot.players() {
            if let Some(economy) = self.snapshot.economy_mut(player) {
                economy.harvesters = harvesters.get(&player).copied().unwrap_or(0);
                economy.refineries = refineries.get(&player).copied().unwrap_or(0);
            }
        }
    }

    fn roll_economy_window(&mut self) {
        let scale = TICKS_PER_MINUTE / ECONOMY_WINDOW as f32;
        let players: Vec<PlayerId> = self.ledgers.keys().copied().collect();
        for player in players {
            let ledger = self.ledgers.insert(player, Ledger::default()).unwrap_or_default();
            if let Some(economy) = self.snapshot.economy_mut(player) {
                economy.income = ledger.earned * scale;
                economy.expense = ledger.spent * scale;
            }
        }
    }
}

/// Commands every player issued on one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickRecord {
    pub tick: Tick,
    pub issued: Vec<PlayerCommands>,
}

/// Play a generated skirmish with one AI per player at the given difficulty
///
/// Returns the final world and the command stream of every tick that
/// produced at least one command. With `parallel` the players are updated
/// on the rayon pool; the stream must not depend on it.
pub fn run_skirmish(
    scenario: &ScenarioConfig,
    difficulty: Difficulty,
    ai_config: &AiConfig,
    ticks: Tick,
    parallel: bool,
) -> (Skirmish, Vec<TickRecord>) {
    let mut skirmish = Skirmish::generate(scenario, RulesTable::standard());
    let mut contexts: Vec<AiContext> = skirmish
        .snapshot()
        .players()
        .into_iter()
        .map(|player| AiContext::new(player, difficulty, ai_config.clone()))
        .collect();
    let mut records = Vec::new();

    for _ in 0..ticks {
        let issued = if parallel {
            update_players(&mut contexts, skirmish.snapshot(), skirmish.rules())
        } else {
            update_players_sequential(&mut contexts, skirmish.snapshot(), skirmish.rules())
        };
        skirmish.apply(&issued);
        if issued.iter().any(|p| !p.commands.is_empty()) {
            records.push(TickRecord {
                tick: skirmish.tick(),
                issued,
            });
        }
        skirmish.step();
    }

    debug!(
        seed = scenario.seed,
        %difficulty,
        ticks,
        records = records.len(),
        "skirmish finished"
    );
    (skirmish, records)
}

fn advance(from: Vec2, to: Vec2, step: f32) -> Vec2 {
    let distance = from.distance(&to);
    if distance <= step || distance <= f32::EPSILON {
        to
    } else {
        from + (to - from) * (step / distance)
    }
}

fn random_point(rng: &mut ChaCha8Rng, config: &ScenarioConfig, margin: f32) -> Vec2 {
    Vec2::new(
        rng.gen_range(margin..(config.width - margin).max(margin + 1.0)),
        rng.gen_range(margin..(config.height - margin).max(margin + 1.0)),
    )
}
