//! Squad lifecycle: forming, moving, engaging, retreating, disbanding
//!
//! One call advances one squad by one decision step and appends whatever
//! move/attack commands that step produces.

use crate::command::Command;
use crate::core::config::SquadsConfig;
use crate::core::types::{EntityId, Tick, Vec2};
use crate::squad::formation::{compute_formation, FormationMember};
use crate::squad::{Squad, SquadStatus, SquadTarget};
use crate::world::{EntitySnapshot, PlayerView};
use tracing::{debug, trace};

/// Heading used when a retreating squad has no rally point
const DEFAULT_RETREAT_HEADING: Vec2 = Vec2 { x: -1.0, y: 0.0 };

/// Advance `squad` one step; returns its status afterwards
///
/// A squad left in `Disbanding` has no members and must be removed from
/// its registry by the caller.
pub fn update_squad(
    squad: &mut Squad,
    view: &PlayerView,
    config: &SquadsConfig,
    commands: &mut Vec<Command>,
) -> SquadStatus {
    let tick = view.tick();

    squad.members.retain(|&id| view.own(id).is_some());
    let members = &squad.members;
    squad.roles.retain(|id, _| members.contains(id));

    if squad.is_empty() {
        set_status(squad, SquadStatus::Disbanding, tick);
        return squad.status;
    }

    let units: Vec<&EntitySnapshot> = squad.members.iter().filter_map(|&id| view.own(id)).collect();
    let centroid = Vec2::centroid(units.iter().map(|u| u.position)).unwrap_or_default();
    let health = health_ratio(&units);
    let retreat_threshold = config.for_type(squad.squad_type).retreat_threshold;

    if squad.status != SquadStatus::Retreating && health < retreat_threshold {
        set_status(squad, SquadStatus::Retreating, tick);
        issue_retreat(squad, centroid, config, tick, commands);
        return squad.status;
    }

    match squad.status {
        SquadStatus::Forming => update_forming(squad, &units, centroid, config, tick, commands),
        SquadStatus::Moving => update_moving(squad, &units, centroid, view, config, commands),
        SquadStatus::Engaging => update_engaging(squad, &units, centroid, view, config, commands),
        SquadStatus::Retreating => {
            if health > config.recovery_ratio {
                set_status(squad, SquadStatus::Forming, tick);
            } else {
                issue_retreat(squad, centroid, config, tick, commands);
            }
        }
        SquadStatus::Disbanding => {}
    }

    squad.status
}

/// Σhp / Σmax-hp over the given members
pub fn health_ratio(units: &[&EntitySnapshot]) -> f32 {
    let max: f32 = units.iter().map(|u| u.max_health).sum();
    if max <= 0.0 {
        return 0.0;
    }
    let current: f32 = units.iter().map(|u| u.health.max(0.0)).sum();
    (current / max).clamp(0.0, 1.0)
}

fn set_status(squad: &mut Squad, status: SquadStatus, tick: Tick) {
    let from = squad.transition(status, tick);
    if from != status {
        debug!(squad = %squad.id, ?from, to = ?status, tick, "squad transition");
    }
}

fn emit(squad: &mut Squad, command: Command, tick: Tick, commands: &mut Vec<Command>) {
    squad.last_order_tick = tick;
    commands.push(command);
}

fn update_forming(
    squad: &mut Squad,
    units: &[&EntitySnapshot],
    centroid: Vec2,
    config: &SquadsConfig,
    tick: Tick,
    commands: &mut Vec<Command>,
) {
    let rally = *squad.rally_point.get_or_insert(centroid);
    let gathered = units
        .iter()
        .filter(|u| u.position.distance(&rally) <= config.rally_radius)
        .count();
    let quorum = gathered as f32 >= config.forming_quorum * units.len() as f32;
    let timed_out =
        tick.saturating_sub(squad.status_since) >= config.for_type(squad.squad_type).forming_timeout;

    if quorum || timed_out {
        let next = if squad.target.is_some() {
            SquadStatus::Moving
        } else {
            SquadStatus::Engaging
        };
        set_status(squad, next, tick);
        return;
    }

    let stragglers: Vec<EntityId> = units
        .iter()
        .filter(|u| u.position.distance(&rally) > config.rally_radius)
        .map(|u| u.id)
        .collect();
    if !stragglers.is_empty() {
        trace!(squad = %squad.id, count = stragglers.len(), "regrouping stragglers");
        emit(squad, Command::move_to(stragglers, rally), tick, commands);
    }
}

fn update_moving(
    squad: &mut Squad,
    units: &[&EntitySnapshot],
    centroid: Vec2,
    view: &PlayerView,
    config: &SquadsConfig,
    commands: &mut Vec<Command>,
) {
    let tick = view.tick();

    let destination = match squad.target {
        Some(SquadTarget::Position(pos)) => Some(pos),
        Some(SquadTarget::Entity(id)) => view.snapshot.get_alive(id).map(|e| e.position),
        None => None,
    };
    let Some(destination) = destination else {
        set_status(squad, SquadStatus::Engaging, tick);
        return;
    };

    if centroid.distance(&destination) <= config.engage_target_radius
        || view.any_enemy_within(centroid, config.engage_enemy_radius)
    {
        set_status(squad, SquadStatus::Engaging, tick);
        return;
    }

    let facing = (destination - centroid).normalize_or(Vec2::new(1.0, 0.0));
    let anchor = centroid + facing * config.advance_step;
    let squad_config = config.for_type(squad.squad_type);
    let members: Vec<FormationMember> = units
        .iter()
        .map(|u| FormationMember::from_entity(u, view.rules))
        .collect();
    let slots = compute_formation(
        &members,
        anchor,
        facing,
        squad.formation,
        squad_config.spacing,
    );

    for unit in units {
        if let Some(slot) = slots.get(&unit.id) {
            if unit.position.distance(slot) > config.slot_tolerance {
                emit(squad, Command::move_unit(unit.id, *slot), tick, commands);
            }
        }
    }
}

fn update_engaging(
    squad: &mut Squad,
    units: &[&EntitySnapshot],
    centroid: Vec2,
    view: &PlayerView,
    config: &SquadsConfig,
    commands: &mut Vec<Command>,
) {
    let tick = view.tick();

    let target = match squad.target {
        Some(SquadTarget::Position(pos)) => {
            view.nearest_enemy(pos, Some(config.target_search_radius))
        }
        Some(SquadTarget::Entity(id)) => view
            .snapshot
            .get_alive(id)
            .filter(|e| e.is_hostile_to(view.player)),
        None => None,
    }
    .or_else(|| view.nearest_enemy(centroid, None));

    let Some(target) = target else {
        set_status(squad, SquadStatus::Forming, tick);
        return;
    };

    let idle: Vec<EntityId> = units
        .iter()
        .filter(|u| {
            u.combat_target()
                .and_then(|t| view.snapshot.get_alive(t))
                .is_none()
        })
        .map(|u| u.id)
        .collect();

    if !idle.is_empty() {
        trace!(squad = %squad.id, target = %target.id, count = idle.len(), "attack order");
        emit(squad, Command::attack(idle, target.id), tick, commands);
    }
}

fn issue_retreat(
    squad: &mut Squad,
    centroid: Vec2,
    config: &SquadsConfig,
    tick: Tick,
    commands: &mut Vec<Command>,
) {
    let heading = squad
        .rally_point
        .map(|rally| (rally - centroid).normalize_or(DEFAULT_RETREAT_HEADING))
        .unwrap_or(DEFAULT_RETREAT_HEADING);
    let destination = centroid + heading * config.retreat_step;
    let members = squad.members.clone();
    emit(squad, Command::move_to(members, destination), tick, commands);
}
