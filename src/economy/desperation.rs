//! Economic desperation scoring
//!
//! Produces a 0..100 score: 0 is a comfortable economy, 100 a collapsing
//! one. Harvester routing reads it to decide how much danger to accept.

use crate::ai::policy::DesperationMode;
use crate::core::config::DesperationConfig;
use crate::world::{PlayerEconomy, PlayerView};
use serde::{Deserialize, Serialize};

/// Risk appetite derived from the desperation score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    VeryCautious,
    Balanced,
    Aggressive,
    Desperate,
}

impl RiskBand {
    pub fn from_score(score: f32) -> RiskBand {
        if score <= 20.0 {
            RiskBand::VeryCautious
        } else if score <= 50.0 {
            RiskBand::Balanced
        } else if score <= 75.0 {
            RiskBand::Aggressive
        } else {
            RiskBand::Desperate
        }
    }

    /// Highest zone danger a standard harvester accepts
    pub fn max_danger(&self) -> f32 {
        match self {
            RiskBand::VeryCautious => 20.0,
            RiskBand::Balanced => 50.0,
            RiskBand::Aggressive => 75.0,
            RiskBand::Desperate => 100.0,
        }
    }

    pub fn flee_multiplier(&self) -> f32 {
        match self {
            RiskBand::VeryCautious => 1.5,
            RiskBand::Balanced => 1.0,
            RiskBand::Aggressive => 0.7,
            RiskBand::Desperate => 0.5,
        }
    }
}

/// Per-factor breakdown, each 0..100
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DesperationFactors {
    pub credits: f32,
    pub income_deficit: f32,
    pub harvester_ratio: f32,
    pub game_phase: f32,
    pub relative_economy: f32,
}

impl DesperationFactors {
    pub fn compute(view: &PlayerView, config: &DesperationConfig) -> Self {
        let own = view
            .economy()
            .cloned()
            .unwrap_or_else(|| PlayerEconomy::new(view.player, 0.0));
        let richest = view
            .opponent_economies()
            .map(|e| e.credits)
            .fold(None, |best: Option<f32>, c| Some(best.map_or(c, |b| b.max(c))));

        Self {
            credits: credits_factor(own.credits, config.credit_threshold),
            income_deficit: income_deficit_factor(own.income, own.expense),
            harvester_ratio: harvester_ratio_factor(
                own.harvesters,
                own.refineries,
                config.desperate_ratio,
            ),
            game_phase: if view.tick() < config.early_game_ticks {
                config.early_game_bonus
            } else {
                0.0
            },
            relative_economy: richest.map_or(0.0, |r| relative_factor(own.credits, r)),
        }
    }
}

/// Score for the given mode, clamped to 0..100
pub fn desperation_score(
    view: &PlayerView,
    mode: DesperationMode,
    config: &DesperationConfig,
) -> f32 {
    let score = match mode {
        DesperationMode::Fixed => config.fixed_score,
        DesperationMode::Basic => {
            let f = DesperationFactors::compute(view, config);
            0.55 * f.credits + 0.45 * f.harvester_ratio
        }
        DesperationMode::Full => {
            let f = DesperationFactors::compute(view, config);
            0.35 * f.credits
                + 0.25 * f.income_deficit
                + 0.20 * f.harvester_ratio
                + 0.10 * f.game_phase
                + 0.10 * f.relative_economy
        }
    };
    score.clamp(0.0, 100.0)
}

fn credits_factor(credits: f32, threshold: f32) -> f32 {
    (100.0 * (1.0 - credits / threshold)).clamp(0.0, 100.0)
}

fn income_deficit_factor(income: f32, expense: f32) -> f32 {
    if expense <= 0.0 {
        return 0.0;
    }
    (100.0 * (expense - income) / expense).clamp(0.0, 100.0)
}

fn harvester_ratio_factor(harvesters: u32, refineries: u32, desperate_ratio: f32) -> f32 {
    if refineries == 0 {
        return 100.0;
    }
    let ratio = harvesters as f32 / refineries as f32;
    (100.0 * (1.0 - ratio / desperate_ratio)).clamp(0.0, 100.0)
}

fn relative_factor(own: f32, richest: f32) -> f32 {
    if richest <= 0.0 {
        return 0.0;
    }
    (100.0 * (richest - own) / richest).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PlayerId;
    use crate::rules::RulesTable;
    use crate::world::WorldSnapshot;

    fn economy(credits: f32, harvesters: u32, refineries: u32) -> PlayerEconomy {
        PlayerEconomy {
            harvesters,
            refineries,
            ..PlayerEconomy::new(PlayerId(1), credits)
        }
    }

    #[test]
    fn test_broke_late_game_hard() {
        let snapshot = WorldSnapshot::new(4000, 1000.0, 1000.0).with_economy(economy(0.0, 4, 2));
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        let config = DesperationConfig::default();

        let score = desperation_score(&view, DesperationMode::Full, &config);
        assert!((score - 35.0).abs() < 1e-3);
    }

    #[test]
    fn test_fixed_mode() {
        let snapshot = WorldSnapshot::new(0, 1000.0, 1000.0);
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        let config = DesperationConfig::default();
        assert_eq!(desperation_score(&view, DesperationMode::Fixed, &config), 30.0);
    }

    #[test]
    fn test_basic_mode_weights() {
        // credits factor 50, one harvester per refinery: ratio factor 50
        let snapshot = WorldSnapshot::new(100, 1000.0, 1000.0).with_economy(economy(1500.0, 1, 1));
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        let config = DesperationConfig::default();
        let score = desperation_score(&view, DesperationMode::Basic, &config);
        assert!((score - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_no_refinery_is_most_desperate_ratio() {
        let snapshot = WorldSnapshot::new(5000, 1000.0, 1000.0).with_economy(economy(5000.0, 4, 0));
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        let config = DesperationConfig::default();

        let factors = DesperationFactors::compute(&view, &config);
        assert_eq!(factors.harvester_ratio, 100.0);
        assert_eq!(factors.credits, 0.0);

        let basic = desperation_score(&view, DesperationMode::Basic, &config);
        assert!((basic - 45.0).abs() < 1e-3);
        let full = desperation_score(&view, DesperationMode::Full, &config);
        assert!((full - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_richest_opponent_drives_relative_factor() {
        let snapshot = WorldSnapshot::new(5000, 1000.0, 1000.0)
            .with_economy(economy(3000.0, 4, 2))
            .with_economy(PlayerEconomy::new(PlayerId(2), 1000.0))
            .with_economy(PlayerEconomy::new(PlayerId(3), 6000.0));
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        let factors = DesperationFactors::compute(&view, &DesperationConfig::default());
        assert!((factors.relative_economy - 50.0).abs() < 1e-3);
        assert_eq!(factors.credits, 0.0);
    }

    #[test]
    fn test_early_game_phase() {
        let snapshot = WorldSnapshot::new(10, 1000.0, 1000.0).with_economy(economy(5000.0, 4, 2));
        let rules = RulesTable::standard();
        let view = PlayerView::new(&snapshot, &rules, PlayerId(1));
        let score = desperation_score(&view, DesperationMode::Full, &DesperationConfig::default());
        assert!((score - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_bands() {
        assert_eq!(RiskBand::from_score(20.0), RiskBand::VeryCautious);
        assert_eq!(RiskBand::from_score(20.1), RiskBand::Balanced);
        assert_eq!(RiskBand::from_score(75.0), RiskBand::Aggressive);
        assert_eq!(RiskBand::from_score(80.0).max_danger(), 100.0);
        assert_eq!(RiskBand::Desperate.flee_multiplier(), 0.5);
    }
}
