//! Property tests for the geometry and scoring invariants

use proptest::prelude::*;
use skirmish_ai::ai::{DangerMode, DesperationMode};
use skirmish_ai::core::{AiConfig, EntityId, PlayerId, Vec2};
use skirmish_ai::defense::{assign_units_to_positions, reserve_size};
use skirmish_ai::economy::{desperation_score, DangerMap};
use skirmish_ai::rules::{RulesTable, UnitKind};
use skirmish_ai::squad::{compute_formation, FormationKind, FormationMember};
use skirmish_ai::world::{EntitySnapshot, PlayerEconomy, PlayerView, WorldSnapshot};

const KINDS: [FormationKind; 5] = [
    FormationKind::Line,
    FormationKind::Wedge,
    FormationKind::Box,
    FormationKind::Concave,
    FormationKind::Spread,
];

fn members(n: u32) -> Vec<FormationMember> {
    (0..n)
        .map(|i| FormationMember {
            id: EntityId(i + 1),
            durability: ((i * 37) % 11) as f32 * 50.0,
            attack_range: ((i * 13) % 7) as f32 * 60.0,
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_formation_has_one_slot_per_member(
        n in 0u32..40,
        kind in 0usize..5,
        spacing in 10.0f32..120.0,
        fx in -1.0f32..1.0,
        fy in -1.0f32..1.0,
    ) {
        let positions = compute_formation(
            &members(n),
            Vec2::new(1000.0, 1000.0),
            Vec2::new(fx, fy),
            KINDS[kind],
            spacing,
        );
        prop_assert_eq!(positions.len(), n as usize);
        for p in positions.values() {
            prop_assert!(p.x.is_finite() && p.y.is_finite());
        }
    }

    #[test]
    fn prop_spread_keeps_separation(n in 2u32..30, spacing in 10.0f32..100.0) {
        let positions = compute_formation(
            &members(n),
            Vec2::ZERO,
            Vec2::new(0.0, 1.0),
            FormationKind::Spread,
            spacing,
        );
        let points: Vec<Vec2> = positions.values().copied().collect();
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                prop_assert!(points[i].distance(&points[j]) >= spacing * 1.5 * 0.999);
            }
        }
    }

    #[test]
    fn prop_reserve_bounded_and_monotonic(
        total in 1usize..200,
        threat in 0.0f32..100.0,
        extra in 0.0f32..50.0,
        risk in 0.0f32..1.0,
    ) {
        let low = reserve_size(total, threat, risk);
        let high = reserve_size(total, threat + extra, risk);
        prop_assert!(low >= 1);
        prop_assert!(high >= low);
        prop_assert!(high <= total.max(1));
    }

    #[test]
    fn prop_zone_danger_within_bounds(
        enemies in prop::collection::vec((0.0f32..2000.0, 0.0f32..2000.0), 0..60),
    ) {
        let rules = RulesTable::standard();
        let mut snapshot = WorldSnapshot::new(30, 2000.0, 2000.0);
        for (i, (x, y)) in enemies.iter().enumerate() {
            snapshot.add_entity(EntitySnapshot::unit(
                EntityId(100 + i as u32),
                PlayerId(2),
                UnitKind::HeavyTank,
                Vec2::new(*x, *y),
            ));
        }
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        let mut map = DangerMap::new(AiConfig::default().danger);
        map.update(&view, DangerMode::Memory);

        for (_, zone) in map.zones() {
            prop_assert!((0.0..=100.0).contains(&zone.danger));
        }
        for (x, y) in &enemies {
            let danger = map.path_danger(Vec2::ZERO, Vec2::new(*x, *y));
            prop_assert!((0.0..=100.0).contains(&danger));
        }
    }

    #[test]
    fn prop_desperation_within_bounds(
        credits in 0.0f32..20000.0,
        income in 0.0f32..5000.0,
        expense in 0.0f32..5000.0,
        harvesters in 0u32..20,
        refineries in 0u32..5,
        rival in 0.0f32..20000.0,
        tick in 0u64..10000,
    ) {
        let rules = RulesTable::standard();
        let mut own = PlayerEconomy::new(PlayerId(1), credits);
        own.income = income;
        own.expense = expense;
        own.harvesters = harvesters;
        own.refineries = refineries;
        let snapshot = WorldSnapshot::new(tick, 2000.0, 2000.0)
            .with_economy(own)
            .with_economy(PlayerEconomy::new(PlayerId(2), rival));
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        let config = AiConfig::default().desperation;

        for mode in [DesperationMode::Fixed, DesperationMode::Basic, DesperationMode::Full] {
            let score = desperation_score(&view, mode, &config);
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }

    #[test]
    fn prop_assignment_respects_capacity(
        units in prop::collection::vec((0.0f32..1000.0, 0.0f32..1000.0), 0..20),
        slots in prop::collection::vec((0.0f32..1000.0, 0.0f32..1000.0), 0..10),
        capacity in 1usize..3,
    ) {
        let units: Vec<(EntityId, Vec2)> = units
            .iter()
            .enumerate()
            .map(|(i, (x, y))| (EntityId(i as u32 + 1), Vec2::new(*x, *y)))
            .collect();
        let slots: Vec<Vec2> = slots.iter().map(|(x, y)| Vec2::new(*x, *y)).collect();

        let assigned = assign_units_to_positions(&units, &slots, capacity);
        prop_assert_eq!(assigned.len(), units.len().min(slots.len() * capacity));
        for slot in 0..slots.len() {
            prop_assert!(assigned.values().filter(|&&s| s == slot).count() <= capacity);
        }
    }
}
