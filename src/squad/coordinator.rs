//! Squad coordination: turning idle combat units into squads
//!
//! Runs on the coordination cadence after every existing squad has taken
//! its state machine step.

use crate::ai::policy::DifficultyPolicy;
use crate::command::Command;
use crate::core::config::{AiConfig, SquadsConfig};
use crate::core::types::{EntityId, SquadId, Vec2};
use crate::defense::{
    assign_units_to_positions, base_defense_positions, chokepoint_defense_positions,
    guarding_chokepoint, reserve_positions, reserve_size, Chokepoint, DefenseAnalysis,
};
use crate::squad::state_machine::update_squad;
use crate::squad::{Squad, SquadRegistry, SquadStatus, SquadTarget, SquadType, UnitRole};
use crate::world::view::nearest;
use crate::world::{EntitySnapshot, PlayerView};
use ordered_float::OrderedFloat;
use tracing::debug;

/// What one coordination pass did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorOutcome {
    pub formed: Vec<SquadId>,
    pub disbanded: Vec<SquadId>,
    /// Units held back at the base
    pub reserve: Vec<EntityId>,
}

/// Step every squad's state machine, removing the ones that disband
pub fn update_squads(
    registry: &mut SquadRegistry,
    view: &PlayerView,
    config: &SquadsConfig,
    commands: &mut Vec<Command>,
) -> Vec<SquadId> {
    let mut disbanded = Vec::new();
    for id in registry.ids() {
        let Some(squad) = registry.get_mut(id) else {
            continue;
        };
        if update_squad(squad, view, config, commands) == SquadStatus::Disbanding {
            registry.remove(id);
            disbanded.push(id);
        }
    }
    disbanded
}

/// Own combat units not assigned to any squad, ascending id
pub fn idle_combat_units<'a>(
    view: &PlayerView<'a>,
    registry: &SquadRegistry,
) -> Vec<&'a EntitySnapshot> {
    let mut idle: Vec<&EntitySnapshot> = view
        .own_combat_units()
        .filter(|u| !registry.is_assigned(u.id))
        .collect();
    idle.sort_by_key(|u| u.id);
    idle
}

/// Create a squad, classify its members and register it
pub fn form_squad(
    registry: &mut SquadRegistry,
    view: &PlayerView,
    squad_type: SquadType,
    members: Vec<EntityId>,
    target: Option<SquadTarget>,
    config: &AiConfig,
) -> SquadId {
    let id = registry.allocate_id();
    let formation = config.squads.for_type(squad_type).formation;
    let mut squad = Squad::new(id, squad_type, members, formation, target, view.tick());

    for &member in &squad.members {
        if let Some(kind) = view.own(member).and_then(|e| e.unit_kind()) {
            let role = UnitRole::classify(view.rules.unit(kind), config.defense.fast_unit_speed);
            squad.roles.insert(member, role);
        }
    }

    debug!(
        squad = %id,
        ?squad_type,
        size = squad.size(),
        ?target,
        tick = view.tick(),
        "squad formed"
    );
    registry.insert(squad);
    id
}

/// Form new squads from idle units and position the base reserve
///
/// Against a known threat direction the reserve holds the best chokepoint
/// on that side of the base, else a line in front of the base.
pub fn coordinate_squads(
    registry: &mut SquadRegistry,
    view: &PlayerView,
    analysis: Option<&DefenseAnalysis>,
    chokepoints: &[Chokepoint],
    policy: &DifficultyPolicy,
    config: &AiConfig,
    commands: &mut Vec<Command>,
) -> CoordinatorOutcome {
    let mut outcome = CoordinatorOutcome::default();
    let Some(analysis) = analysis else {
        return outcome;
    };
    let base = analysis.base;

    if !analysis.has_threats() {
        let stale: Vec<SquadId> = registry
            .of_type(SquadType::Defense)
            .filter(|s| !target_alive(view, s.target))
            .map(|s| s.id)
            .collect();
        for id in stale {
            debug!(squad = %id, tick = view.tick(), "defense squad stood down");
            registry.remove(id);
            outcome.disbanded.push(id);
        }
    }

    let idle = idle_combat_units(view, registry);
    let squadded: usize = registry.iter().map(|s| s.size()).sum();
    let reserve_count = reserve_size(idle.len() + squadded, analysis.level, policy.risk_tolerance)
        .min(idle.len());

    let mut by_base = idle.clone();
    sort_by_distance(&mut by_base, base);
    let reserve: Vec<&EntitySnapshot> = by_base.into_iter().take(reserve_count).collect();
    let mut available: Vec<&EntitySnapshot> = idle
        .into_iter()
        .filter(|u| !reserve.iter().any(|r| r.id == u.id))
        .collect();

    if let Some(top) = analysis.top_threat() {
        let defense = &config.squads.defense;
        let mut nearest_units = available.clone();
        sort_by_distance(&mut nearest_units, top.position);
        if nearest_units.len() >= defense.min_size {
            let members = take_ids(&nearest_units, defense.max_size);
            outcome.formed.push(form_squad(
                registry,
                view,
                SquadType::Defense,
                members.clone(),
                Some(SquadTarget::Entity(top.id)),
                config,
            ));
            available.retain(|u| !members.contains(&u.id));
        }
    }

    let fast_speed = config.defense.fast_unit_speed;

    if policy.harass {
        let harass = &config.squads.harass;
        let fast: Vec<&EntitySnapshot> = available
            .iter()
            .copied()
            .filter(|u| u.speed(view.rules) >= fast_speed)
            .collect();
        let prey = nearest(view.enemies().filter(|e| e.is_harvester()), base, None)
            .filter(|_| fast.len() >= harass.min_size);
        if let Some(prey) = prey {
            let members = take_ids(&fast, harass.max_size);
            outcome.formed.push(form_squad(
                registry,
                view,
                SquadType::Harass,
                members.clone(),
                Some(SquadTarget::Entity(prey.id)),
                config,
            ));
            available.retain(|u| !members.contains(&u.id));
        }
    }

    let attack = &config.squads.attack;
    if available.len() >= attack.min_size {
        if let Some(target) = attack_target(view, base) {
            let members = take_ids(&available, attack.max_size);
            outcome.formed.push(form_squad(
                registry,
                view,
                SquadType::Attack,
                members.clone(),
                Some(target),
                config,
            ));
            available.retain(|u| !members.contains(&u.id));
        }
    }

    if view.enemies().next().is_none() && registry.of_type(SquadType::Scout).next().is_none() {
        let fast: Vec<&EntitySnapshot> = available
            .iter()
            .copied()
            .filter(|u| u.speed(view.rules) >= fast_speed)
            .collect();
        if !fast.is_empty() {
            let members = take_ids(&fast, config.squads.scout.max_size);
            outcome.formed.push(form_squad(
                registry,
                view,
                SquadType::Scout,
                members,
                Some(SquadTarget::Position(view.snapshot.map_center())),
                config,
            ));
        }
    }

    place_reserve(&reserve, analysis, chokepoints, config, commands);
    outcome.reserve = reserve.iter().map(|u| u.id).collect();
    outcome
}

fn target_alive(view: &PlayerView, target: Option<SquadTarget>) -> bool {
    match target {
        Some(SquadTarget::Entity(id)) => view
            .snapshot
            .get_alive(id)
            .map_or(false, |e| e.is_hostile_to(view.player)),
        Some(SquadTarget::Position(_)) => true,
        None => false,
    }
}

/// Nearest enemy building to the base, else the centroid of enemy units
fn attack_target(view: &PlayerView, base: Vec2) -> Option<SquadTarget> {
    if let Some(building) = nearest(
        view.enemies().filter(|e| e.building_kind().is_some()),
        base,
        None,
    ) {
        return Some(SquadTarget::Entity(building.id));
    }
    Vec2::centroid(
        view.enemies()
            .filter(|e| e.unit_kind().is_some())
            .map(|e| e.position),
    )
    .map(SquadTarget::Position)
}

fn sort_by_distance(units: &mut [&EntitySnapshot], point: Vec2) {
    units.sort_by_key(|u| (OrderedFloat(u.position.distance(&point)), u.id));
}

fn take_ids(units: &[&EntitySnapshot], max: usize) -> Vec<EntityId> {
    units.iter().take(max).map(|u| u.id).collect()
}

fn place_reserve(
    reserve: &[&EntitySnapshot],
    analysis: &DefenseAnalysis,
    chokepoints: &[Chokepoint],
    config: &AiConfig,
    commands: &mut Vec<Command>,
) {
    if reserve.is_empty() {
        return;
    }

    let slots: Vec<Vec2> = match analysis.direction {
        Some(direction) => {
            let positions =
                match guarding_chokepoint(analysis.base, direction, chokepoints, &config.defense) {
                    Some(chokepoint) => {
                        debug!(position = ?chokepoint.position, "reserve holding chokepoint");
                        chokepoint_defense_positions(
                            chokepoint,
                            direction,
                            reserve.len(),
                            &config.defense,
                        )
                    }
                    None => base_defense_positions(
                        analysis.base,
                        Some(direction),
                        reserve.len(),
                        &config.defense,
                    ),
                };
            positions.into_iter().map(|p| p.position).collect()
        }
        None => reserve_positions(analysis.base, reserve.len(), config.defense.reserve_spacing),
    };

    let units: Vec<(EntityId, Vec2)> = reserve.iter().map(|u| (u.id, u.position)).collect();
    let assigned = assign_units_to_positions(&units, &slots, 1);

    for (id, position) in units {
        let Some(&slot) = assigned.get(&id).and_then(|&i| slots.get(i)) else {
            continue;
        };
        if position.distance(&slot) > config.squads.slot_tolerance {
            commands.push(Command::move_unit(id, slot));
        }
    }
}
