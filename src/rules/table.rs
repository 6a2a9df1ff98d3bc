//! Rules table handed in by the simulation core
//!
//! Starts from the per-kind defaults; the simulation may override any entry.
//! Lookups never fail: unknown kinds resolve to the `Unknown` entry.

use crate::rules::building_kind::{BuildingInfo, BuildingKind};
use crate::rules::unit_kind::{UnitKind, UnitStats};
use ahash::AHashMap;

#[derive(Debug, Clone)]
pub struct RulesTable {
    units: AHashMap<UnitKind, UnitStats>,
    buildings: AHashMap<BuildingKind, BuildingInfo>,
    default_unit: UnitStats,
    default_building: BuildingInfo,
}

impl RulesTable {
    /// Table populated with every kind's default stats
    pub fn standard() -> Self {
        let units = UnitKind::ALL
            .iter()
            .map(|k| (*k, k.default_stats()))
            .collect();
        let buildings = BuildingKind::ALL
            .iter()
            .map(|k| (*k, k.default_info()))
            .collect();

        Self {
            units,
            buildings,
            default_unit: UnitKind::Unknown.default_stats(),
            default_building: BuildingKind::Unknown.default_info(),
        }
    }

    /// Table with no per-kind entries; every lookup yields the default entry
    pub fn defaults_only() -> Self {
        Self {
            units: AHashMap::new(),
            buildings: AHashMap::new(),
            default_unit: UnitKind::Unknown.default_stats(),
            default_building: BuildingKind::Unknown.default_info(),
        }
    }

    pub fn with_unit(mut self, kind: UnitKind, stats: UnitStats) -> Self {
        self.units.insert(kind, stats);
        self
    }

    pub fn with_building(mut self, kind: BuildingKind, info: BuildingInfo) -> Self {
        self.buildings.insert(kind, info);
        self
    }

    pub fn unit(&self, kind: UnitKind) -> &UnitStats {
        self.units.get(&kind).unwrap_or(&self.default_unit)
    }

    pub fn building(&self, kind: BuildingKind) -> &BuildingInfo {
        self.buildings.get(&kind).unwrap_or(&self.default_building)
    }
}

impl Default for RulesTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_matches_defaults() {
        let rules = RulesTable::standard();
        assert_eq!(
            rules.unit(UnitKind::HeavyTank),
            &UnitKind::HeavyTank.default_stats()
        );
        assert_eq!(
            rules.building(BuildingKind::Refinery).cost,
            BuildingKind::Refinery.default_info().cost
        );
    }

    #[test]
    fn test_missing_entry_uses_default() {
        let rules = RulesTable::defaults_only();
        assert_eq!(rules.unit(UnitKind::Artillery).danger_level, 40.0);
        assert!(!rules.building(BuildingKind::Turret).capturable);
    }

    #[test]
    fn test_override() {
        let mut stats = UnitKind::Infantry.default_stats();
        stats.speed = 3.0;
        let rules = RulesTable::standard().with_unit(UnitKind::Infantry, stats);
        assert_eq!(rules.unit(UnitKind::Infantry).speed, 3.0);
    }
}
