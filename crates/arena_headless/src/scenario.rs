//! Scenario loading and configuration.
//!
//! Scenarios define the initial arena for headless runs: the tile map,
//! item and set-effect content, unit placements, static blockers, a
//! schedule of orders and the simulation config.

use std::path::Path;

use arena_core::combat::set_effects::SetEffect;
use arena_core::combat::weapons::Weapon;
use arena_core::components::{Bonuses, Prayer, Stance, Stats, UnitRole};
use arena_core::config::SimulationConfig;
use arena_core::error::GameError;
use arena_core::grid::GridMap;
use arena_core::items::{Equipment, ItemDef, ItemId, ItemTable};
use arena_core::math::TilePos;
use arena_core::simulation::{BlockerSpawnParams, Simulation, UnitSpawnParams};
use arena_core::world::EntityId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A placement or order refers to a unit index that doesn't exist.
    #[error("Unit index {0} is out of range")]
    UnknownUnit(usize),
    /// A placement wears an item missing from the item table.
    #[error("Item {0} is not in the item table")]
    UnknownItem(ItemId),
    /// The simulation rejected a setup step.
    #[error("Simulation rejected scenario: {0}")]
    Game(#[from] GameError),
}

/// Tile map given as text rows, top row first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSpec {
    /// World position of the bottom-left character.
    #[serde(default)]
    pub origin: (i32, i32),
    /// `.` floor, `#` wall, `~` gap, `N`/`E`/`S`/`W` edge walls.
    pub rows: Vec<String>,
}

impl MapSpec {
    /// Build the grid.
    #[must_use]
    pub fn to_grid(&self) -> GridMap {
        GridMap::from_rows(TilePos::new(self.origin.0, self.origin.1), &self.rows)
    }
}

/// A unit placed at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Display name.
    pub name: String,
    /// Player or NPC.
    pub role: UnitRole,
    /// South-west tile.
    pub position: (i32, i32),
    /// Footprint side length.
    #[serde(default = "default_size")]
    pub size: i32,
    /// Levels.
    pub stats: Stats,
    /// Intrinsic bonuses on top of worn items.
    #[serde(default)]
    pub bonuses: Bonuses,
    /// Worn item ids; each goes in its item's slot.
    #[serde(default)]
    pub equipment: Vec<ItemId>,
    /// Weapon override for units without a weapon item.
    #[serde(default)]
    pub weapon: Option<Weapon>,
    /// Initial stance.
    #[serde(default)]
    pub stance: Option<Stance>,
    /// Initially active prayers.
    #[serde(default)]
    pub prayers: Vec<Prayer>,
    /// Index of the unit to attack from the start.
    #[serde(default)]
    pub target: Option<usize>,
    /// Whether being hit makes the unit fight back.
    #[serde(default = "default_true")]
    pub auto_retaliate: bool,
    /// Ticks before the unit acts.
    #[serde(default)]
    pub spawn_delay: u32,
}

/// A static blocker placed at scenario start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlockerPlacement {
    /// South-west tile.
    pub position: (i32, i32),
    /// Footprint side length.
    #[serde(default = "default_size")]
    pub size: i32,
    /// Whether it blocks sight as well as movement.
    #[serde(default = "default_true")]
    pub blocks_line_of_sight: bool,
    /// Ticks until it is removed.
    #[serde(default)]
    pub lifetime: Option<u32>,
}

/// An order issued to a unit, by placement index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    /// Walk to a tile.
    Move {
        /// Unit index.
        unit: usize,
        /// Destination.
        to: (i32, i32),
    },
    /// Attack another unit.
    Attack {
        /// Unit index.
        unit: usize,
        /// Target index.
        target: usize,
    },
    /// Stop attacking.
    Stop {
        /// Unit index.
        unit: usize,
    },
    /// Switch stance.
    Stance {
        /// Unit index.
        unit: usize,
        /// New stance.
        stance: Stance,
    },
    /// Arm or disarm the special attack.
    Special {
        /// Unit index.
        unit: usize,
    },
    /// Toggle a prayer.
    Prayer {
        /// Unit index.
        unit: usize,
        /// Prayer to toggle.
        prayer: Prayer,
    },
    /// Walk or run.
    Run {
        /// Unit index.
        unit: usize,
        /// Whether to run.
        running: bool,
    },
    /// Send a heal.
    Heal {
        /// Healer index.
        source: usize,
        /// Recipient index.
        target: usize,
        /// Hitpoints restored.
        amount: i32,
    },
}

/// An order applied just before a given tick runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledOrder {
    /// Tick the order applies before.
    pub tick: u64,
    /// The order.
    pub order: Order,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Tile map.
    pub map: MapSpec,
    /// Simulation tuning.
    #[serde(default)]
    pub config: SimulationConfig,
    /// Item definitions.
    #[serde(default)]
    pub items: Vec<ItemDef>,
    /// Set effects.
    #[serde(default)]
    pub set_effects: Vec<SetEffect>,
    /// Units, referred to by index elsewhere.
    pub units: Vec<UnitPlacement>,
    /// Static blockers.
    #[serde(default)]
    pub blockers: Vec<BlockerPlacement>,
    /// Orders by tick.
    #[serde(default)]
    pub orders: Vec<ScheduledOrder>,
    /// Tick limit.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

/// A built simulation with the entity id of each placement.
#[derive(Debug, Clone)]
pub struct Arena {
    /// The simulation.
    pub sim: Simulation,
    /// Entity id per unit placement.
    pub units: Vec<EntityId>,
}

impl Arena {
    /// Entity id of a placement index.
    pub fn entity(&self, index: usize) -> Result<EntityId, ScenarioError> {
        self.units
            .get(index)
            .copied()
            .ok_or(ScenarioError::UnknownUnit(index))
    }

    /// Apply an order.
    pub fn apply(&mut self, order: Order) -> Result<(), ScenarioError> {
        match order {
            Order::Move { unit, to } => {
                let id = self.entity(unit)?;
                self.sim.request_move(id, TilePos::new(to.0, to.1))?;
            }
            Order::Attack { unit, target } => {
                let (id, target) = (self.entity(unit)?, self.entity(target)?);
                self.sim.set_aggro(id, Some(target))?;
            }
            Order::Stop { unit } => {
                let id = self.entity(unit)?;
                self.sim.set_aggro(id, None)?;
            }
            Order::Stance { unit, stance } => {
                let id = self.entity(unit)?;
                self.sim.toggle_stance(id, stance)?;
            }
            Order::Special { unit } => {
                let id = self.entity(unit)?;
                self.sim.toggle_special_attack(id)?;
            }
            Order::Prayer { unit, prayer } => {
                let id = self.entity(unit)?;
                self.sim.toggle_prayer(id, prayer)?;
            }
            Order::Run { unit, running } => {
                let id = self.entity(unit)?;
                self.sim.set_running(id, running)?;
            }
            Order::Heal {
                source,
                target,
                amount,
            } => {
                let (source, target) = (self.entity(source)?, self.entity(target)?);
                self.sim.queue_heal(source, target, amount, true)?;
            }
        }
        Ok(())
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Copy of this scenario with a different seed.
    #[must_use]
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut scenario = self.clone();
        scenario.config.seed = seed;
        scenario
    }

    /// Build the simulation and spawn every placement.
    pub fn build(&self) -> Result<Arena, ScenarioError> {
        let items: ItemTable = self.items.iter().cloned().collect();
        let set_effects = self.set_effects.iter().cloned().collect();
        let mut sim = Simulation::new(self.map.to_grid(), self.config.clone())
            .with_content(items, set_effects);

        let mut units = Vec::with_capacity(self.units.len());
        for placement in &self.units {
            let mut equipment = Equipment::new();
            for &item in &placement.equipment {
                let def = sim.items().get(item).ok_or(ScenarioError::UnknownItem(item))?;
                equipment.equip(def.slot, item);
            }
            units.push(sim.spawn_unit(UnitSpawnParams {
                name: placement.name.clone(),
                role: placement.role,
                position: TilePos::new(placement.position.0, placement.position.1),
                size: placement.size,
                stats: placement.stats,
                bonuses: placement.bonuses,
                equipment,
                weapon: placement.weapon.clone(),
                stance: placement.stance,
                prayers: placement.prayers.clone(),
                aggro: None,
                auto_retaliate: placement.auto_retaliate,
                spawn_delay: placement.spawn_delay,
                death_ticks: None,
            }));
        }

        for blocker in &self.blockers {
            sim.spawn_blocker(BlockerSpawnParams {
                position: TilePos::new(blocker.position.0, blocker.position.1),
                size: blocker.size,
                blocks_movement: true,
                blocks_line_of_sight: blocker.blocks_line_of_sight,
                lifetime: blocker.lifetime,
            });
        }

        let mut arena = Arena { sim, units };
        for (index, placement) in self.units.iter().enumerate() {
            if let Some(target) = placement.target {
                arena.apply(Order::Attack {
                    unit: index,
                    target,
                })?;
            }
        }

        tracing::debug!(
            scenario = %self.name,
            units = arena.units.len(),
            blockers = self.blockers.len(),
            "scenario built"
        );
        Ok(arena)
    }

    /// Orders scheduled before `tick`, in file order.
    pub fn orders_at(&self, tick: u64) -> impl Iterator<Item = Order> + '_ {
        self.orders
            .iter()
            .filter(move |o| o.tick == tick)
            .map(|o| o.order)
    }
}

fn default_size() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_max_ticks() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"(
        name: "Small",
        map: (rows: [
            ".....",
            ".....",
            ".....",
        ]),
        items: [
            (id: 1, name: "Sword", slot: Weapon, bonuses: (attack: (slash: 10)),
             weapon: Some((name: "Sword", kind: Melee(melee_type: Slash), attack_speed: 4, range: 1))),
        ],
        units: [
            (name: "Hero", role: Player, position: (0, 1),
             stats: (attack: 70, strength: 70, defence: 70, ranged: 1, magic: 1, hitpoint: 70, prayer: 43),
             equipment: [1], target: Some(1)),
            (name: "Goblin", role: Npc, position: (4, 1),
             stats: (attack: 5, strength: 5, defence: 5, ranged: 1, magic: 1, hitpoint: 12, prayer: 1)),
        ],
        orders: [
            (tick: 3, order: Stance(unit: 0, stance: Aggressive)),
        ],
    )"#;

    #[test]
    fn test_parse_and_build() {
        let scenario = Scenario::from_ron_str(SMALL).unwrap();
        assert_eq!(scenario.max_ticks, 1000);
        assert_eq!(scenario.map.to_grid().len(), 15);

        let arena = scenario.build().unwrap();
        let hero = arena.sim.unit(arena.units[0]).unwrap();
        assert_eq!(hero.weapon().name, "Sword");
        assert_eq!(hero.bonuses.attack.slash, 10);
        assert_eq!(hero.aggro, Some(arena.units[1]));
    }

    #[test]
    fn test_orders_by_tick() {
        let scenario = Scenario::from_ron_str(SMALL).unwrap();
        assert_eq!(scenario.orders_at(2).count(), 0);
        assert_eq!(
            scenario.orders_at(3).collect::<Vec<_>>(),
            vec![Order::Stance {
                unit: 0,
                stance: Stance::Aggressive
            }]
        );
    }

    #[test]
    fn test_unknown_references() {
        let mut scenario = Scenario::from_ron_str(SMALL).unwrap();
        scenario.units[1].target = Some(7);
        assert!(matches!(scenario.build(), Err(ScenarioError::UnknownUnit(7))));

        let mut scenario = Scenario::from_ron_str(SMALL).unwrap();
        scenario.units[0].equipment.push(99);
        assert!(matches!(scenario.build(), Err(ScenarioError::UnknownItem(99))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("does/not/exist.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
