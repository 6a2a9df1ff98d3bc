//! AI controller entry points
//!
//! Each computer player owns one `AiContext`. Contexts never share state,
//! so many players can be evaluated in parallel against one read-only
//! snapshot.

pub mod context;
pub mod policy;

use crate::command::Command;
use crate::core::types::PlayerId;
use crate::rules::RulesTable;
use crate::world::WorldSnapshot;
use rayon::prelude::*;
use serde::Serialize;

pub use context::AiContext;
pub use policy::{DangerMode, DesperationMode, Difficulty, DifficultyPolicy};

/// Commands issued by one player on one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCommands {
    pub player: PlayerId,
    pub commands: Vec<Command>,
}

/// Update every context against the same snapshot
///
/// Results come back in context order regardless of scheduling.
pub fn update_players(
    contexts: &mut [AiContext],
    snapshot: &WorldSnapshot,
    rules: &RulesTable,
) -> Vec<PlayerCommands> {
    contexts
        .par_iter_mut()
        .map(|context| PlayerCommands {
            player: context.player(),
            commands: context.update(snapshot, rules),
        })
        .collect()
}

/// Sequential equivalent of [`update_players`]
pub fn update_players_sequential(
    contexts: &mut [AiContext],
    snapshot: &WorldSnapshot,
    rules: &RulesTable,
) -> Vec<PlayerCommands> {
    contexts
        .iter_mut()
        .map(|context| PlayerCommands {
            player: context.player(),
            commands: context.update(snapshot, rules),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{EntityId, Vec2};
    use crate::rules::UnitKind;
    use crate::world::{EntitySnapshot, PlayerEconomy};

    #[test]
    fn test_results_in_context_order() {
        let rules = RulesTable::standard();
        let snapshot = WorldSnapshot::new(0, 2000.0, 2000.0)
            .with_economy(PlayerEconomy::new(PlayerId(1), 5000.0))
            .with_economy(PlayerEconomy::new(PlayerId(2), 5000.0))
            .with_entity(EntitySnapshot::unit(
                EntityId(1),
                PlayerId(1),
                UnitKind::Harvester,
                Vec2::new(100.0, 100.0),
            ))
            .with_entity(EntitySnapshot::resource(EntityId(9), Vec2::new(300.0, 300.0), 1000.0));

        let mut parallel: Vec<AiContext> = [3, 1, 2]
            .into_iter()
            .map(|p| AiContext::with_defaults(PlayerId(p), Difficulty::Hard))
            .collect();
        let mut sequential = parallel.clone();

        let a = update_players(&mut parallel, &snapshot, &rules);
        let b = update_players_sequential(&mut sequential, &snapshot, &rules);

        let players: Vec<PlayerId> = a.iter().map(|r| r.player).collect();
        assert_eq!(players, vec![PlayerId(3), PlayerId(1), PlayerId(2)]);
        assert_eq!(a, b);
    }
}
