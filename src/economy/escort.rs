//! Escort squads for harvesters working in dangerous zones

use crate::core::config::AiConfig;
use crate::core::types::{EntityId, SquadId};
use crate::economy::danger_map::DangerMap;
use crate::squad::coordinator::{form_squad, idle_combat_units};
use crate::squad::{SquadRegistry, SquadTarget, SquadType};
use crate::world::{EntitySnapshot, PlayerView};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Harvester id → escorting squad
pub type EscortAssignments = BTreeMap<EntityId, SquadId>;

/// Refresh escort squads: release the ones no longer needed, retarget the
/// rest and escort newly endangered harvesters
///
/// Units in `reserve` stay at the base and are never recruited.
pub fn update_escorts(
    view: &PlayerView,
    danger: &DangerMap,
    squads: &mut SquadRegistry,
    escorts: &mut EscortAssignments,
    reserve: &BTreeSet<EntityId>,
    config: &AiConfig,
) {
    let threshold = config.escort.danger_threshold;

    let current: Vec<(EntityId, SquadId)> = escorts.iter().map(|(h, s)| (*h, *s)).collect();
    for (harvester_id, squad_id) in current {
        let endangered = view
            .own(harvester_id)
            .filter(|h| danger.danger_at(h.position) >= threshold);

        if let (Some(harvester), Some(squad)) = (endangered, squads.get_mut(squad_id)) {
            squad.target = Some(SquadTarget::Position(harvester.position));
            continue;
        }

        if squads.remove(squad_id).is_some() {
            debug!(harvester = %harvester_id, squad = %squad_id, "escort released");
        }
        escorts.remove(&harvester_id);
    }

    if escorts.len() >= config.escort.max_escorted {
        return;
    }

    let mut endangered: Vec<(&EntitySnapshot, f32)> = view
        .own_harvesters()
        .filter(|h| !escorts.contains_key(&h.id))
        .map(|h| (h, danger.danger_at(h.position)))
        .filter(|(_, d)| *d >= threshold)
        .collect();
    endangered.sort_by_key(|(h, d)| (Reverse(OrderedFloat(*d)), h.id));

    let sizes = &config.squads.escort;
    for (harvester, zone_danger) in endangered {
        if escorts.len() >= config.escort.max_escorted {
            break;
        }

        let mut idle = idle_combat_units(view, squads);
        idle.retain(|u| !reserve.contains(&u.id));
        if idle.len() < sizes.min_size {
            break;
        }
        idle.sort_by_key(|u| (OrderedFloat(u.position.distance(&harvester.position)), u.id));
        let members: Vec<EntityId> = idle.iter().take(sizes.max_size).map(|u| u.id).collect();

        let squad_id = form_squad(
            squads,
            view,
            SquadType::Escort,
            members,
            Some(SquadTarget::Position(harvester.position)),
            config,
        );
        debug!(harvester = %harvester.id, squad = %squad_id, zone_danger, "escort assigned");
        escorts.insert(harvester.id, squad_id);
    }
}
