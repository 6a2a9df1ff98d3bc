//! Difficulty-dependent behaviour of a single AI context
//!
//! Each test hand-builds snapshots and checks one subsystem through the
//! public `AiContext::update` entry point.

use skirmish_ai::ai::{AiContext, Difficulty};
use skirmish_ai::command::Command;
use skirmish_ai::core::{EntityId, PlayerId, Tick, Vec2};
use skirmish_ai::defense::analyze;
use skirmish_ai::economy::RiskBand;
use skirmish_ai::rules::{BuildingKind, RulesTable, UnitKind};
use skirmish_ai::world::{
    CombatEvent, CombatEventKind, EntityKind, EntitySnapshot, PlayerEconomy, PlayerView,
    WorldSnapshot,
};

const ME: PlayerId = PlayerId(1);
const ENEMY: PlayerId = PlayerId(2);
const KILL_SITE: Vec2 = Vec2 { x: 1100.0, y: 300.0 };

fn quiet_world(tick: Tick) -> WorldSnapshot {
    WorldSnapshot::new(tick, 2000.0, 2000.0)
        .with_economy(PlayerEconomy::new(ME, 0.0))
        .with_entity(EntitySnapshot::building(
            EntityId(1),
            ME,
            BuildingKind::ConstructionYard,
            Vec2::new(200.0, 200.0),
        ))
}

fn harvester_killed(tick: Tick) -> WorldSnapshot {
    let mut snapshot = quiet_world(tick);
    snapshot.add_event(CombatEvent {
        kind: CombatEventKind::Destroyed,
        tick,
        victim: EntityId(40),
        victim_owner: Some(ME),
        victim_kind: EntityKind::Unit(UnitKind::Harvester),
        attacker: Some(EntityId(90)),
        position: KILL_SITE,
    });
    snapshot
}

#[test]
fn test_hard_remembers_harvester_deaths() {
    let rules = RulesTable::standard();
    let mut ai = AiContext::with_defaults(ME, Difficulty::Hard);

    ai.update(&harvester_killed(30), &rules);
    assert_eq!(ai.danger_map().danger_at(KILL_SITE), 30.0);
    assert_eq!(ai.danger_map().death_records().len(), 1);

    // Still inside the 900 tick memory window
    ai.update(&quiet_world(900), &rules);
    assert_eq!(ai.danger_map().danger_at(KILL_SITE), 30.0);

    ai.update(&quiet_world(960), &rules);
    assert_eq!(ai.danger_map().danger_at(KILL_SITE), 0.0);
}

#[test]
fn test_medium_ignores_event_history() {
    let rules = RulesTable::standard();
    let mut ai = AiContext::with_defaults(ME, Difficulty::Medium);

    ai.update(&harvester_killed(30), &rules);
    assert_eq!(ai.danger_map().danger_at(KILL_SITE), 0.0);
    assert!(ai.danger_map().death_records().is_empty());
}

#[test]
fn test_desperation_by_difficulty() {
    let rules = RulesTable::standard();
    let broke = quiet_world(60);

    let mut easy = AiContext::with_defaults(ME, Difficulty::Easy);
    easy.update(&broke, &rules);
    assert_eq!(easy.desperation(), 30.0);
    assert_eq!(easy.risk_band(), RiskBand::Balanced);

    // No credits, no harvesters: both basic factors are maxed
    let mut medium = AiContext::with_defaults(ME, Difficulty::Medium);
    medium.update(&broke, &rules);
    assert_eq!(medium.desperation(), 100.0);
    assert_eq!(medium.risk_band(), RiskBand::Desperate);

    // 0.35 * 100 + 0.20 * 100 + 0.10 * 20 (early game), no opponents
    let mut hard = AiContext::with_defaults(ME, Difficulty::Hard);
    hard.update(&broke, &rules);
    assert!((hard.desperation() - 57.0).abs() < 1e-4);
    assert_eq!(hard.risk_band(), RiskBand::Aggressive);
}

#[test]
fn test_threat_analysis_points_at_attackers() {
    let rules = RulesTable::standard();
    let snapshot = quiet_world(60)
        .with_entity(EntitySnapshot::unit(
            EntityId(50),
            ENEMY,
            UnitKind::HeavyTank,
            Vec2::new(600.0, 200.0),
        ))
        .with_entity(EntitySnapshot::unit(
            EntityId(51),
            ENEMY,
            UnitKind::Infantry,
            Vec2::new(600.0, 260.0),
        ))
        .with_entity(EntitySnapshot::unit(
            EntityId(52),
            ENEMY,
            UnitKind::Harvester,
            Vec2::new(300.0, 200.0),
        ));
    let view = PlayerView::new(&snapshot, &rules, ME);
    let config = skirmish_ai::core::AiConfig::default();

    let analysis = analyze(&view, &config.defense).expect("base exists");
    assert_eq!(analysis.threats.len(), 2);
    assert!(analysis.level > 0.0);
    let direction = analysis.direction.expect("threats have a direction");
    assert!(direction.x > 0.9);
    assert!((direction.length() - 1.0).abs() < 1e-4);
}

#[test]
fn test_defense_squad_answers_raid() {
    let rules = RulesTable::standard();
    let mut snapshot = quiet_world(60).with_entity(EntitySnapshot::unit(
        EntityId(50),
        ENEMY,
        UnitKind::LightTank,
        Vec2::new(700.0, 200.0),
    ));
    for i in 0..5 {
        snapshot.add_entity(EntitySnapshot::unit(
            EntityId(10 + i),
            ME,
            UnitKind::Infantry,
            Vec2::new(250.0, 150.0 + 20.0 * i as f32),
        ));
    }

    let mut ai = AiContext::with_defaults(ME, Difficulty::Medium);
    let commands = ai.update(&snapshot, &rules);

    let defense: Vec<_> = ai
        .squads()
        .of_type(skirmish_ai::squad::SquadType::Defense)
        .collect();
    assert_eq!(defense.len(), 1);
    assert!(defense[0].size() >= 2);
    assert!(commands.iter().all(|c| !matches!(c, Command::StartBuild { .. })));
}

#[test]
fn test_dummy_forms_no_squads() {
    let rules = RulesTable::standard();
    let mut snapshot = quiet_world(0);
    for i in 0..6 {
        snapshot.add_entity(EntitySnapshot::unit(
            EntityId(10 + i),
            ME,
            UnitKind::LightTank,
            Vec2::new(300.0, 300.0 + 20.0 * i as f32),
        ));
    }
    snapshot.add_entity(EntitySnapshot::building(
        EntityId(80),
        ENEMY,
        BuildingKind::Barracks,
        Vec2::new(1800.0, 1800.0),
    ));

    let mut ai = AiContext::with_defaults(ME, Difficulty::Dummy);
    for tick in [0, 60, 120] {
        let mut world = snapshot.clone();
        world.tick = tick;
        ai.update(&world, &rules);
    }
    assert!(ai.squads().is_empty());
    assert!(ai.danger_map().is_empty());
}
