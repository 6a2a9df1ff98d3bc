//! Zone-level danger tracking
//!
//! The map is divided into square zones. Each refresh recounts live armed
//! enemies per zone and, when memory is enabled, adds step contributions
//! from recent attacks on our entities and from harvester deaths.

use crate::ai::policy::DangerMode;
use crate::core::config::DangerConfig;
use crate::core::types::{Tick, Vec2};
use crate::rules::UnitKind;
use crate::world::{CombatEventKind, EntityKind, EntitySnapshot, PlayerView};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Integer grid coordinate of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneKey {
    pub x: i32,
    pub y: i32,
}

impl ZoneKey {
    pub fn of(position: Vec2, zone_size: f32) -> Self {
        Self {
            x: (position.x / zone_size).floor() as i32,
            y: (position.y / zone_size).floor() as i32,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DangerZone {
    /// 0..100
    pub danger: f32,
    pub enemy_count: u32,
    pub recent_attacks: u32,
    pub harvester_deaths: u32,
    pub last_update: Tick,
}

/// Attack on one of our entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackRecord {
    pub position: Vec2,
    pub tick: Tick,
    pub zone: ZoneKey,
}

/// Loss of one of our harvesters; never removed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarvesterDeathRecord {
    pub position: Vec2,
    pub tick: Tick,
    pub zone: ZoneKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DangerMap {
    config: DangerConfig,
    zones: BTreeMap<ZoneKey, DangerZone>,
    attacks: Vec<AttackRecord>,
    deaths: Vec<HarvesterDeathRecord>,
}

impl DangerMap {
    pub fn new(config: DangerConfig) -> Self {
        Self {
            config,
            zones: BTreeMap::new(),
            attacks: Vec::new(),
            deaths: Vec::new(),
        }
    }

    pub fn zone_key(&self, position: Vec2) -> ZoneKey {
        ZoneKey::of(position, self.config.zone_size)
    }

    pub fn zone(&self, key: ZoneKey) -> Option<&DangerZone> {
        self.zones.get(&key)
    }

    pub fn zones(&self) -> impl Iterator<Item = (&ZoneKey, &DangerZone)> {
        self.zones.iter()
    }

    /// Number of tracked zones
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn attack_records(&self) -> &[AttackRecord] {
        &self.attacks
    }

    pub fn death_records(&self) -> &[HarvesterDeathRecord] {
        &self.deaths
    }

    pub fn record_attack(&mut self, position: Vec2, tick: Tick) {
        let zone = self.zone_key(position);
        self.attacks.push(AttackRecord {
            position,
            tick,
            zone,
        });
    }

    pub fn record_harvester_death(&mut self, position: Vec2, tick: Tick) {
        let zone = self.zone_key(position);
        self.deaths.push(HarvesterDeathRecord {
            position,
            tick,
            zone,
        });
    }

    /// Pull attacks on our entities and our harvester deaths out of the
    /// snapshot's event list
    pub fn ingest_events(&mut self, view: &PlayerView) {
        for event in view.snapshot.events() {
            if event.victim_owner != Some(view.player) {
                continue;
            }
            match event.kind {
                CombatEventKind::Attacked => self.record_attack(event.position, event.tick),
                CombatEventKind::Destroyed => {
                    if event.victim_kind == EntityKind::Unit(UnitKind::Harvester) {
                        self.record_harvester_death(event.position, event.tick);
                    }
                }
            }
        }
    }

    /// Rebuild zone scores from the current view
    pub fn update(&mut self, view: &PlayerView, mode: DangerMode) {
        if mode == DangerMode::Disabled {
            return;
        }

        let tick = view.tick();
        let zone_size = self.config.zone_size;

        let mut zones: BTreeMap<ZoneKey, DangerZone> = BTreeMap::new();
        for enemy in view.armed_enemies() {
            zones
                .entry(ZoneKey::of(enemy.position, zone_size))
                .or_default()
                .enemy_count += 1;
        }

        if mode == DangerMode::Memory {
            let attack_window = self.config.attack_memory_ticks;
            self.attacks
                .retain(|a| tick.saturating_sub(a.tick) <= attack_window);
            for attack in &self.attacks {
                zones.entry(attack.zone).or_default().recent_attacks += 1;
            }

            let death_window = self.config.death_memory_ticks;
            for death in &self.deaths {
                if tick.saturating_sub(death.tick) <= death_window {
                    zones.entry(death.zone).or_default().harvester_deaths += 1;
                }
            }
        }

        for zone in zones.values_mut() {
            let raw = zone.enemy_count as f32 * self.config.enemy_weight
                + zone.recent_attacks as f32 * self.config.attack_weight
                + zone.harvester_deaths as f32 * self.config.death_weight;
            zone.danger = raw.clamp(0.0, 100.0);
            zone.last_update = tick;
        }

        trace!(player = %view.player, tick, zones = zones.len(), "danger map refreshed");
        self.zones = zones;
    }

    /// Danger of the zone containing `position`; 0 for untracked zones
    pub fn danger_at(&self, position: Vec2) -> f32 {
        self.zones
            .get(&self.zone_key(position))
            .map_or(0.0, |z| z.danger)
    }

    /// Mean danger over the distinct zones a straight path crosses
    pub fn path_danger(&self, from: Vec2, to: Vec2) -> f32 {
        let step = self.config.zone_size / 2.0;
        let distance = from.distance(&to);
        let samples = ((distance / step).floor() as usize + 1).max(2);

        let mut visited: Vec<ZoneKey> = Vec::new();
        for i in 0..samples {
            let t = i as f32 / (samples - 1) as f32;
            let key = self.zone_key(from.lerp(&to, t));
            if !visited.contains(&key) {
                visited.push(key);
            }
        }

        let total: f32 = visited
            .iter()
            .map(|k| self.zones.get(k).map_or(0.0, |z| z.danger))
            .sum();
        total / visited.len() as f32
    }

    /// Cheapest candidate by distance plus desperation-discounted path danger
    ///
    /// Ties keep the earlier candidate.
    pub fn select_safest_target<'a>(
        &self,
        from: Vec2,
        candidates: &[&'a EntitySnapshot],
        desperation: f32,
    ) -> Option<&'a EntitySnapshot> {
        match candidates {
            [] => None,
            [only] => Some(*only),
            _ => {
                let caution = 1.0 - desperation.clamp(0.0, 100.0) / 100.0;
                candidates
                    .iter()
                    .min_by_key(|c| {
                        let distance = from.distance(&c.position) / 100.0;
                        let danger = self.path_danger(from, c.position)
                            * self.config.route_danger_weight
                            * caution;
                        OrderedFloat(distance + danger)
                    })
                    .copied()
            }
        }
    }

    /// Forget everything, including records
    pub fn clear(&mut self) {
        self.zones.clear();
        self.attacks.clear();
        self.deaths.clear();
    }
}
