//! End-to-end runs of the decision layer against the synthetic skirmish
//!
//! These drive full AI contexts tick by tick and check the properties that
//! only show up over many updates: reproducibility, squad formation and
//! harvester routing.

use skirmish_ai::ai::{update_players_sequential, AiContext, Difficulty};
use skirmish_ai::command::Command;
use skirmish_ai::core::{load_config, AiConfig, PlayerId};
use skirmish_ai::rules::RulesTable;
use skirmish_ai::scenario::{run_skirmish, ScenarioConfig, Skirmish};
use skirmish_ai::squad::SquadType;
use skirmish_ai::world::HarvestActivity;

fn contexts(skirmish: &Skirmish, difficulty: Difficulty) -> Vec<AiContext> {
    skirmish
        .snapshot()
        .players()
        .into_iter()
        .map(|p| AiContext::with_defaults(p, difficulty))
        .collect()
}

#[test]
fn test_same_seed_same_command_stream() {
    let scenario = ScenarioConfig {
        players: 3,
        ..ScenarioConfig::default()
    };
    let config = AiConfig::default();

    let (_, first) = run_skirmish(&scenario, Difficulty::Hard, &config, 600, false);
    let (_, second) = run_skirmish(&scenario, Difficulty::Hard, &config, 600, false);

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_parallel_matches_sequential() {
    let scenario = ScenarioConfig {
        seed: 1234,
        players: 4,
        ..ScenarioConfig::default()
    };
    let config = AiConfig::default();

    let (parallel_world, parallel) = run_skirmish(&scenario, Difficulty::Hard, &config, 400, true);
    let (sequential_world, sequential) =
        run_skirmish(&scenario, Difficulty::Hard, &config, 400, false);

    assert_eq!(parallel, sequential);
    assert_eq!(
        parallel_world.snapshot().entities().len(),
        sequential_world.snapshot().entities().len()
    );
}

#[test]
fn test_dummy_never_builds() {
    let scenario = ScenarioConfig {
        starting_credits: 20000.0,
        harvesters_per_player: 0,
        ..ScenarioConfig::default()
    };
    let (_, records) = run_skirmish(&scenario, Difficulty::Dummy, &AiConfig::default(), 300, false);

    let builds = records
        .iter()
        .flat_map(|r| r.issued.iter())
        .flat_map(|p| p.commands.iter())
        .filter(|c| matches!(c, Command::StartBuild { .. }))
        .count();
    assert_eq!(builds, 0);
}

#[test]
fn test_easy_builds_harvesters_when_short() {
    let scenario = ScenarioConfig {
        starting_credits: 20000.0,
        harvesters_per_player: 0,
        ..ScenarioConfig::default()
    };
    let (_, records) = run_skirmish(&scenario, Difficulty::Easy, &AiConfig::default(), 61, false);

    let first_tick = records.iter().find(|r| r.tick == 0).expect("tick 0 issues orders");
    for issued in &first_tick.issued {
        assert!(issued
            .commands
            .iter()
            .any(|c| *c == Command::build_unit(skirmish_ai::rules::UnitKind::Harvester)));
    }
}

#[test]
fn test_hard_forms_squads_on_first_update() {
    let mut skirmish = Skirmish::generate(&ScenarioConfig::default(), RulesTable::standard());
    let mut ais = contexts(&skirmish, Difficulty::Hard);

    let issued = update_players_sequential(&mut ais, skirmish.snapshot(), skirmish.rules());
    skirmish.apply(&issued);

    for ai in &ais {
        assert!(!ai.squads().is_empty(), "{} formed no squads", ai.player());
        assert!(ai
            .squads()
            .iter()
            .all(|s| s.squad_type != SquadType::Defense && s.squad_type != SquadType::Escort));
        assert!(!ai.chokepoints().is_empty());
    }
}

#[test]
fn test_idle_harvesters_sent_to_fields() {
    let mut skirmish = Skirmish::generate(&ScenarioConfig::default(), RulesTable::standard());
    let mut ais = contexts(&skirmish, Difficulty::Medium);

    let issued = update_players_sequential(&mut ais, skirmish.snapshot(), skirmish.rules());
    skirmish.apply(&issued);
    skirmish.step();

    let moving = skirmish
        .snapshot()
        .entities()
        .iter()
        .filter(|e| e.is_owned_by(PlayerId(1)))
        .filter_map(|e| e.harvester_state())
        .filter(|s| s.activity == HarvestActivity::MovingToResource)
        .count();
    assert_eq!(moving, ScenarioConfig::default().harvesters_per_player as usize);
}

#[test]
fn test_reset_context_replays_identically() {
    let mut skirmish = Skirmish::generate(&ScenarioConfig::default(), RulesTable::standard());
    let mut ai = AiContext::with_defaults(PlayerId(1), Difficulty::Hard);

    let first = ai.update(skirmish.snapshot(), skirmish.rules());
    ai.reset();
    let again = ai.update(skirmish.snapshot(), skirmish.rules());
    assert_eq!(first, again);

    skirmish.step();
    assert_eq!(skirmish.tick(), 1);
}

#[test]
fn test_shipped_configs_load() {
    let default = load_config("default").expect("default config");
    assert_eq!(default.cadence.coordination, 60);

    let aggressive = load_config("aggressive").expect("aggressive config");
    assert_eq!(aggressive.cadence.coordination, 30);
    assert_eq!(aggressive.squads.attack.min_size, 3);
    // Untouched sections keep their defaults
    assert_eq!(aggressive.squads.defense.min_size, 2);
    assert_eq!(aggressive.danger.zone_size, 200.0);
}
