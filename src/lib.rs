//! Skirmish AI - deterministic decision layer for computer-controlled RTS players

pub mod ai;
pub mod command;
pub mod core;
pub mod defense;
pub mod economy;
pub mod rules;
pub mod scenario;
pub mod squad;
pub mod world;
