//! Per-player AI state and the tick cadence that drives it

use crate::ai::policy::{DangerMode, Difficulty, DifficultyPolicy};
use crate::command::Command;
use crate::core::config::AiConfig;
use crate::core::types::{EntityId, PlayerId, Tick};
use crate::defense::{analyze, map_chokepoints, Chokepoint};
use crate::economy::{
    assign_roles, desperation_score, plan_build, route_harvesters, update_escorts, DangerMap,
    EscortAssignments, HarvesterRole, RiskBand, StuckTracker,
};
use crate::rules::RulesTable;
use crate::squad::{coordinate_squads, update_squads, SquadRegistry};
use crate::world::{PlayerView, WorldSnapshot};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// Everything one AI player remembers between updates
///
/// Created, reset and dropped by the caller; only ever mutated by its own
/// `update` call.
#[derive(Debug, Clone, Serialize)]
pub struct AiContext {
    player: PlayerId,
    policy: DifficultyPolicy,
    config: AiConfig,
    danger: DangerMap,
    squads: SquadRegistry,
    desperation: f32,
    harvester_roles: BTreeMap<EntityId, HarvesterRole>,
    escorts: EscortAssignments,
    stuck: StuckTracker,
    chokepoints: Option<Vec<Chokepoint>>,
    /// Units the coordinator holds at the base
    reserve: BTreeSet<EntityId>,
}

impl AiContext {
    pub fn new(player: PlayerId, difficulty: Difficulty, config: AiConfig) -> Self {
        Self {
            player,
            policy: difficulty.policy(),
            danger: DangerMap::new(config.danger.clone()),
            squads: SquadRegistry::new(),
            desperation: config.desperation.fixed_score,
            harvester_roles: BTreeMap::new(),
            escorts: EscortAssignments::new(),
            stuck: StuckTracker::new(),
            chokepoints: None,
            reserve: BTreeSet::new(),
            config,
        }
    }

    pub fn with_defaults(player: PlayerId, difficulty: Difficulty) -> Self {
        Self::new(player, difficulty, AiConfig::default())
    }

    /// Forget all accumulated state, keeping player, difficulty and config
    pub fn reset(&mut self) {
        self.danger.clear();
        self.squads.clear();
        self.desperation = self.config.desperation.fixed_score;
        self.harvester_roles.clear();
        self.escorts.clear();
        self.stuck.clear();
        self.chokepoints = None;
        self.reserve.clear();
    }

    /// Run every subsystem due on the snapshot's tick
    pub fn update(&mut self, snapshot: &WorldSnapshot, rules: &RulesTable) -> Vec<Command> {
        let view = PlayerView::new(snapshot, rules, self.player);
        let tick = view.tick();
        let cadence = self.config.cadence.clone();
        let mut commands = Vec::new();

        // Buildings are obstacles too, so the passages change over a game
        if self.chokepoints.is_none() || due(tick, cadence.coordination) {
            self.chokepoints = Some(map_chokepoints(&view, &self.config.defense));
        }

        if self.policy.danger == DangerMode::Memory {
            self.danger.ingest_events(&view);
        }

        if due(tick, cadence.danger_map) {
            self.danger.update(&view, self.policy.danger);
        }

        if due(tick, cadence.desperation) {
            self.desperation =
                desperation_score(&view, self.policy.desperation, &self.config.desperation);
            trace!(player = %self.player, tick, desperation = self.desperation, "desperation updated");
        }

        if due(tick, cadence.coordination) {
            self.harvester_roles = assign_roles(&view, self.desperation, &self.config.harvest);

            if self.policy.squads {
                update_squads(&mut self.squads, &view, &self.config.squads, &mut commands);
                let analysis = analyze(&view, &self.config.defense);
                let outcome = coordinate_squads(
                    &mut self.squads,
                    &view,
                    analysis.as_ref(),
                    self.chokepoints.as_deref().unwrap_or(&[]),
                    &self.policy,
                    &self.config,
                    &mut commands,
                );
                self.reserve = outcome.reserve.into_iter().collect();
            }
        }

        if self.policy.escorts && due(tick, cadence.escort) {
            update_escorts(
                &view,
                &self.danger,
                &mut self.squads,
                &mut self.escorts,
                &self.reserve,
                &self.config,
            );
        }

        if due(tick, cadence.harvester_routing) {
            route_harvesters(
                &view,
                &self.danger,
                &self.harvester_roles,
                self.desperation,
                &self.config.harvest,
                &mut commands,
            );
        }

        if due(tick, cadence.stuck_resolution) {
            self.stuck.update(
                &view,
                &self.danger,
                self.desperation,
                cadence.stuck_resolution,
                &self.config.harvest,
                &mut commands,
            );
        }

        if self.policy.builds && due(tick, cadence.build_planning) {
            if let Some(command) = plan_build(&view, &self.config.desperation) {
                debug!(player = %self.player, tick, ?command, "build requested");
                commands.push(command);
            }
        }

        commands
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn difficulty(&self) -> Difficulty {
        self.policy.difficulty
    }

    pub fn policy(&self) -> &DifficultyPolicy {
        &self.policy
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn danger_map(&self) -> &DangerMap {
        &self.danger
    }

    pub fn squads(&self) -> &SquadRegistry {
        &self.squads
    }

    pub fn desperation(&self) -> f32 {
        self.desperation
    }

    pub fn risk_band(&self) -> RiskBand {
        RiskBand::from_score(self.desperation)
    }

    pub fn harvester_roles(&self) -> &BTreeMap<EntityId, HarvesterRole> {
        &self.harvester_roles
    }

    pub fn escorts(&self) -> &EscortAssignments {
        &self.escorts
    }

    pub fn stuck_tracker(&self) -> &StuckTracker {
        &self.stuck
    }

    /// Chokepoints from the latest coordination pass; empty before the
    /// first update
    pub fn chokepoints(&self) -> &[Chokepoint] {
        self.chokepoints.as_deref().unwrap_or(&[])
    }

    pub fn reserve(&self) -> &BTreeSet<EntityId> {
        &self.reserve
    }
}

fn due(tick: Tick, interval: Tick) -> bool {
    interval > 0 && tick % interval == 0
}
