//! Economic decisions: danger tracking, desperation, harvester routing,
//! escorts and build requests

pub mod build;
pub mod danger_map;
pub mod desperation;
pub mod escort;
pub mod harvester;

pub use build::plan_build;
pub use danger_map::{AttackRecord, DangerMap, DangerZone, HarvesterDeathRecord, ZoneKey};
pub use desperation::{desperation_score, DesperationFactors, RiskBand};
pub use escort::{update_escorts, EscortAssignments};
pub use harvester::{assign_roles, route_harvesters, HarvesterRole, StuckState, StuckTracker};
