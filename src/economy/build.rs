//! Harvester and refinery build requests driven by economic ratios

use crate::command::Command;
use crate::core::config::DesperationConfig;
use crate::rules::{BuildingKind, UnitKind};
use crate::world::PlayerView;

/// At most one start-build request per planning cycle
pub fn plan_build(view: &PlayerView, config: &DesperationConfig) -> Option<Command> {
    let economy = view.economy()?;
    let refinery_cost = view.rules.building(BuildingKind::Refinery).cost as f32;
    let harvester_cost = view.rules.unit(UnitKind::Harvester).cost as f32;
    let refinery_queued = economy.queued_refineries > 0;
    let harvester_queued = economy.queued_harvesters > 0;

    if economy.refineries == 0 {
        if !refinery_queued && economy.credits >= refinery_cost {
            return Some(Command::build_structure(BuildingKind::Refinery));
        }
        return None;
    }

    let ratio = economy.harvesters as f32 / economy.refineries as f32;

    if ratio < config.desperate_ratio && !harvester_queued && economy.credits >= harvester_cost {
        return Some(Command::build_unit(UnitKind::Harvester));
    }

    if ratio >= 2.0 * config.desperate_ratio
        && !refinery_queued
        && economy.credits >= refinery_cost
    {
        return Some(Command::build_structure(BuildingKind::Refinery));
    }

    None
}
