//! Read-only world state consumed from the simulation core

pub mod entity;
pub mod snapshot;
pub mod view;

pub use entity::{EntityKind, EntitySnapshot, EntityState, HarvestActivity, HarvesterState};
pub use snapshot::{CombatEvent, CombatEventKind, PlayerEconomy, WorldSnapshot};
pub use view::PlayerView;
