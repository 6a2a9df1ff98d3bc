//! Static rules tables: unit and building kinds

pub mod building_kind;
pub mod table;
pub mod unit_kind;

pub use building_kind::{BuildingInfo, BuildingKind};
pub use table::RulesTable;
pub use unit_kind::{ArmorClass, UnitKind, UnitStats};
