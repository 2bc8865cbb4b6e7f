//! # Arena Core
//!
//! Deterministic tick-based combat simulation on a tile grid.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math in the simulation (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch runs
//! - Replays from a seed and an order log
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`simulation`] - Tick scheduler and external entry points
//! - [`pathfinding`] - Breadth-first search with a backup tile
//! - [`collision`] - Footprint overlap and adjacency
//! - [`line_of_sight`] - Tile raycasting
//! - [`combat`] - Accuracy, damage, experience and set effects
//! - [`projectile`] - Delayed hit delivery
//! - [`grid`] - Walkable tiles and sight walls
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod clock;
pub mod collision;
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod grid;
pub mod items;
pub mod line_of_sight;
pub mod math;
pub mod pathfinding;
pub mod projectile;
pub mod rng;
pub mod simulation;
pub mod unit;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::TickClock;
    pub use crate::combat::set_effects::{SetEffect, SetEffectKind, SetEffectRegistry};
    pub use crate::combat::weapons::{SpecialAttack, SpecialSpec, Spell, Weapon, WeaponKind};
    pub use crate::components::*;
    pub use crate::config::SimulationConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{GridMap, LosMask, Tile};
    pub use crate::items::{Equipment, EquipmentSlot, ItemDef, ItemId, ItemTable};
    pub use crate::math::{Fixed, TilePos};
    pub use crate::pathfinding::Pathfinder;
    pub use crate::projectile::{HitDelivery, HitEffect, HitStyle};
    pub use crate::rng::{CombatRng, SimRng};
    pub use crate::simulation::{
        AttackEvent, BlockerSpawnParams, HitEvent, MoveEvent, Simulation, TickEvents,
        UnitSnapshot, UnitSpawnParams,
    };
    pub use crate::unit::Unit;
    pub use crate::world::{Entity, EntityId, World};
}
