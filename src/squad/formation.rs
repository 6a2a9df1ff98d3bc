//! Formation layout computation
//!
//! Converts a set of squad members plus an anchor point and facing into one
//! target position per member. Pure and deterministic: ties in every sort
//! break on ascending unit id.

use crate::core::types::{EntityId, Vec2};
use crate::rules::RulesTable;
use crate::world::EntitySnapshot;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::f32::consts::PI;

/// Arc covered by a concave formation (108 degrees)
const CONCAVE_ARC: f32 = PI * 0.6;

/// Rows of a wedge recede by this fraction of the spacing
const WEDGE_ROW_DEPTH: f32 = 0.7;

/// Minimum neighbour separation of a spread formation, in spacings
const SPREAD_SEPARATION: f32 = 1.5;

/// Named geometric arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationKind {
    Line,
    Wedge,
    Box,
    Concave,
    Spread,
}

impl FormationKind {
    pub fn key(&self) -> &'static str {
        match self {
            FormationKind::Line => "line",
            FormationKind::Wedge => "wedge",
            FormationKind::Box => "box",
            FormationKind::Concave => "concave",
            FormationKind::Spread => "spread",
        }
    }

    /// Parse a formation name; anything unrecognised is a line
    pub fn from_key(key: &str) -> FormationKind {
        match key {
            "wedge" => FormationKind::Wedge,
            "box" => FormationKind::Box,
            "concave" => FormationKind::Concave,
            "spread" => FormationKind::Spread,
            _ => FormationKind::Line,
        }
    }
}

impl Default for FormationKind {
    fn default() -> Self {
        FormationKind::Line
    }
}

/// What the layout needs to know about a member
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationMember {
    pub id: EntityId,
    /// Max health scaled by armor class
    pub durability: f32,
    pub attack_range: f32,
}

impl FormationMember {
    pub fn from_entity(entity: &EntitySnapshot, rules: &RulesTable) -> Self {
        Self {
            id: entity.id,
            durability: entity.durability(rules),
            attack_range: entity.attack_range(rules),
        }
    }
}

/// Compute target positions for every member
///
/// `facing` need not be normalized; a zero vector faces +x. Member ids are
/// expected to be unique, in which case the result has one entry per member.
pub fn compute_formation(
    members: &[FormationMember],
    center: Vec2,
    facing: Vec2,
    kind: FormationKind,
    spacing: f32,
) -> BTreeMap<EntityId, Vec2> {
    if members.is_empty() {
        return BTreeMap::new();
    }

    let facing = facing.normalize_or(Vec2::new(1.0, 0.0));

    match kind {
        FormationKind::Line => line_positions(by_durability(members), center, facing, spacing),
        FormationKind::Wedge => wedge_positions(by_durability(members), center, facing, spacing),
        FormationKind::Box => box_positions(by_durability(members), center, facing, spacing),
        FormationKind::Concave => {
            concave_positions(by_attack_range(members), center, facing, spacing)
        }
        FormationKind::Spread => spread_positions(by_id(members), center, facing, spacing),
    }
}

fn by_durability(members: &[FormationMember]) -> Vec<EntityId> {
    let mut sorted = members.to_vec();
    sorted.sort_by_key(|m| (Reverse(OrderedFloat(m.durability)), m.id));
    sorted.into_iter().map(|m| m.id).collect()
}

fn by_attack_range(members: &[FormationMember]) -> Vec<EntityId> {
    let mut sorted = members.to_vec();
    sorted.sort_by_key(|m| (Reverse(OrderedFloat(m.attack_range)), m.id));
    sorted.into_iter().map(|m| m.id).collect()
}

fn by_id(members: &[FormationMember]) -> Vec<EntityId> {
    let mut ids: Vec<EntityId> = members.iter().map(|m| m.id).collect();
    ids.sort();
    ids
}

fn line_positions(
    order: Vec<EntityId>,
    center: Vec2,
    facing: Vec2,
    spacing: f32,
) -> BTreeMap<EntityId, Vec2> {
    let lateral = facing.perpendicular();
    let half = (order.len() as f32 - 1.0) / 2.0;

    order
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, center + lateral * ((i as f32 - half) * spacing)))
        .collect()
}

fn wedge_positions(
    order: Vec<EntityId>,
    center: Vec2,
    facing: Vec2,
    spacing: f32,
) -> BTreeMap<EntityId, Vec2> {
    let lateral = facing.perpendicular();

    order
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            if i == 0 {
                // Tip
                return (id, center);
            }
            let row = ((i + 1) / 2) as f32;
            let side = if i % 2 == 1 { -1.0 } else { 1.0 };
            let back = facing * (-row * WEDGE_ROW_DEPTH * spacing);
            let out = lateral * (side * row * spacing);
            (id, center + back + out)
        })
        .collect()
}

fn box_positions(
    order: Vec<EntityId>,
    center: Vec2,
    facing: Vec2,
    spacing: f32,
) -> BTreeMap<EntityId, Vec2> {
    let side = (order.len() as f32).sqrt().ceil() as usize;
    let lateral = facing.perpendicular();
    let half = (side as f32 - 1.0) / 2.0;

    order
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            let row = (i / side) as f32;
            let col = (i % side) as f32;
            // Row 0 is the front rank
            let forward = facing * ((half - row) * spacing);
            let across = lateral * ((col - half) * spacing);
            (id, center + forward + across)
        })
        .collect()
}

fn concave_positions(
    order: Vec<EntityId>,
    center: Vec2,
    facing: Vec2,
    spacing: f32,
) -> BTreeMap<EntityId, Vec2> {
    let n = order.len();
    let radius = (n as f32 * spacing / CONCAVE_ARC).max(spacing);
    let arc_center = center - facing * radius;

    order
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            let t = if n == 1 { 0.5 } else { i as f32 / (n - 1) as f32 };
            let angle = -CONCAVE_ARC / 2.0 + t * CONCAVE_ARC;
            (id, arc_center + rotate(facing, angle) * radius)
        })
        .collect()
}

fn spread_positions(
    order: Vec<EntityId>,
    center: Vec2,
    facing: Vec2,
    spacing: f32,
) -> BTreeMap<EntityId, Vec2> {
    let n = order.len();
    if n == 1 {
        return order.into_iter().map(|id| (id, center)).collect();
    }

    let separation = spacing * SPREAD_SEPARATION;
    let circumference_radius = n as f32 * separation / (2.0 * PI);
    let chord_radius = separation / (2.0 * (PI / n as f32).sin());
    let radius = circumference_radius.max(chord_radius);

    order
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            let angle = 2.0 * PI * i as f32 / n as f32;
            (id, center + rotate(facing, angle) * radius)
        })
        .collect()
}

fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}
