//! Core simulation loop.
//!
//! The simulation advances in fixed ticks. Each tick runs every
//! non-primary entity (NPCs and static blockers) through three phases,
//! then every primary entity (players) through the same three phases:
//!
//! 1. **Timer** - spawn delay, special energy, death countdown
//! 2. **Movement** - pathing toward a destination or target
//! 3. **Attack** - arriving hits, death detection, attacking
//!
//! Within a group every entity finishes a phase before any entity starts
//! the next one. Entities are visited in ascending id order.
//!
//! # Determinism
//!
//! - Integer and fixed-point math only
//! - One seeded RNG for every combat roll
//! - Sorted entity iteration
//! - Same inputs always produce same outputs
//!
//! # Example
//!
//! ```
//! use arena_core::prelude::*;
//!
//! let grid = GridMap::filled(TilePos::new(0, 0), 10, 10);
//! let mut sim = Simulation::new(grid, SimulationConfig::default());
//! let player = sim.spawn_unit(UnitSpawnParams {
//!     role: UnitRole::Player,
//!     position: TilePos::new(0, 0),
//!     stats: Stats::uniform(99),
//!     ..Default::default()
//! });
//! sim.request_move(player, TilePos::new(4, 0)).unwrap();
//! sim.tick().unwrap();
//! assert_eq!(sim.entity(player).unwrap().position, TilePos::new(2, 0));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::collision::{closest_tile, edge_neighbours, footprint_gap};
use crate::combat::set_effects::SetEffectRegistry;
use crate::combat::weapons::Weapon;
use crate::combat::{resolve_attack, CombatContext};
use crate::components::{Bonuses, Prayer, Skill, Stance, Stats, UnitRole};
use crate::config::SimulationConfig;
use crate::error::{GameError, Result};
use crate::grid::GridMap;
use crate::items::{Equipment, ItemTable};
use crate::line_of_sight::has_line_of_sight;
use crate::math::TilePos;
use crate::pathfinding::Pathfinder;
use crate::projectile::{delivery_delay, take_due, HitDelivery, HitStyle};
use crate::rng::SimRng;
use crate::unit::{Unit, MAX_SPECIAL_ENERGY};
use crate::world::{Entity, EntityId, World};

/// Parameters for spawning a unit.
#[derive(Debug, Clone)]
pub struct UnitSpawnParams {
    /// Display name.
    pub name: String,
    /// Player or NPC.
    pub role: UnitRole,
    /// South-west tile of the footprint.
    pub position: TilePos,
    /// Footprint side length.
    pub size: i32,
    /// Base stats; the unit starts at these levels.
    pub stats: Stats,
    /// Intrinsic bonuses, added to equipment bonuses.
    pub bonuses: Bonuses,
    /// Worn items, resolved through the item table.
    pub equipment: Equipment,
    /// Weapon override. Defaults to the weapon-slot item.
    pub weapon: Option<Weapon>,
    /// Initial stance, if the weapon offers it.
    pub stance: Option<Stance>,
    /// Initially active prayers.
    pub prayers: Vec<Prayer>,
    /// Initial target.
    pub aggro: Option<EntityId>,
    /// Whether being hit makes the unit fight back.
    pub auto_retaliate: bool,
    /// Ticks before the unit acts.
    pub spawn_delay: u32,
    /// Death animation length. Defaults to the configured value.
    pub death_ticks: Option<u32>,
}

impl Default for UnitSpawnParams {
    fn default() -> Self {
        Self {
            name: "Unit".to_string(),
            role: UnitRole::Npc,
            position: TilePos::default(),
            size: 1,
            stats: Stats::uniform(1),
            bonuses: Bonuses::default(),
            equipment: Equipment::new(),
            weapon: None,
            stance: None,
            prayers: Vec::new(),
            aggro: None,
            auto_retaliate: true,
            spawn_delay: 0,
            death_ticks: None,
        }
    }
}

/// Parameters for spawning a static blocker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockerSpawnParams {
    /// South-west tile of the footprint.
    pub position: TilePos,
    /// Footprint side length.
    pub size: i32,
    /// Whether units may not enter its footprint.
    pub blocks_movement: bool,
    /// Whether it blocks sight.
    pub blocks_line_of_sight: bool,
    /// Ticks until it is removed.
    pub lifetime: Option<u32>,
}

impl Default for BlockerSpawnParams {
    fn default() -> Self {
        Self {
            position: TilePos::default(),
            size: 1,
            blocks_movement: true,
            blocks_line_of_sight: true,
            lifetime: None,
        }
    }
}

/// An entity changed tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveEvent {
    /// Entity that moved.
    pub entity: EntityId,
    /// Start of the tick.
    pub from: TilePos,
    /// End of the tick.
    pub to: TilePos,
    /// Tiles crossed, ending with `to`.
    pub crossed: Vec<TilePos>,
}

/// An attack was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackEvent {
    /// Attacker.
    pub attacker: EntityId,
    /// Defender.
    pub target: EntityId,
    /// Travel style.
    pub style: HitStyle,
    /// Damage per swing.
    pub damage: Vec<i32>,
    /// Max hit used.
    pub max_hit: i32,
    /// Ticks until the damage lands.
    pub delay: u32,
    /// Whether this was a special attack.
    pub special: bool,
}

/// A hit or heal landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HitEvent {
    /// Attacker or healer.
    pub source: EntityId,
    /// Recipient.
    pub target: EntityId,
    /// Travel style.
    pub style: HitStyle,
    /// Hitpoints removed; negative for heals.
    pub amount: i32,
    /// Recipient's hitpoints afterwards.
    pub hitpoints: i32,
}

/// Events generated during a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickEvents {
    /// Tick these events belong to.
    pub tick: u64,
    /// Movement, in processing order.
    pub moves: Vec<MoveEvent>,
    /// Attacks, in processing order.
    pub attacks: Vec<AttackEvent>,
    /// Hits that landed, in processing order.
    pub hits: Vec<HitEvent>,
    /// Units that started dying.
    pub deaths: Vec<EntityId>,
    /// Entities removed at the end of the tick.
    pub removed: Vec<EntityId>,
}

/// A hit in flight, as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingHit {
    /// Attacker.
    pub source: EntityId,
    /// Damage to apply; negative heals.
    pub damage: i32,
    /// Travel style.
    pub style: HitStyle,
    /// Ticks in flight.
    pub age: u32,
    /// Ticks until arrival.
    pub remaining_delay: u32,
}

/// Read-only view of a unit for hosts and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Player or NPC.
    pub role: UnitRole,
    /// Current tile.
    pub position: TilePos,
    /// Tile at the start of the last tick.
    pub last_position: TilePos,
    /// Footprint side length.
    pub size: i32,
    /// Current levels.
    pub current_stats: Stats,
    /// Maximum levels.
    pub base_stats: Stats,
    /// Active stance.
    pub stance: Stance,
    /// Active prayers.
    pub prayers: Vec<Prayer>,
    /// Current target.
    pub aggro: Option<EntityId>,
    /// Ticks until the next attack.
    pub attack_delay: u32,
    /// Ticks of freeze left.
    pub frozen_ticks: u32,
    /// Special attack energy.
    pub special_energy: u32,
    /// Whether the death animation is playing.
    pub dying: bool,
    /// Hits in flight toward this unit.
    pub incoming: Vec<PendingHit>,
    /// Experience per skill.
    pub experience: Vec<(Skill, f64)>,
}

/// The combat simulation.
///
/// Owns the world, the pathfinder and its cache, the combat RNG and the
/// content tables. Nothing outside the simulation mutates world state
/// while a tick runs.
#[derive(Debug, Clone)]
pub struct Simulation {
    tick: u64,
    world: World,
    pathfinder: Pathfinder,
    rng: SimRng,
    config: SimulationConfig,
    items: ItemTable,
    set_effects: SetEffectRegistry,
}

/// Where a mover ends up this tick.
struct MovePlan {
    position: TilePos,
    crossed: Vec<TilePos>,
    clear_destination: bool,
}

impl Simulation {
    /// Create a simulation over a map with no entities or content.
    #[must_use]
    pub fn new(grid: GridMap, config: SimulationConfig) -> Self {
        Self {
            tick: 0,
            world: World::new(grid),
            pathfinder: Pathfinder::from_config(&config),
            rng: SimRng::from_seed(config.seed),
            config,
            items: ItemTable::new(),
            set_effects: SetEffectRegistry::new(),
        }
    }

    /// Attach item and set-effect tables.
    #[must_use]
    pub fn with_content(mut self, items: ItemTable, set_effects: SetEffectRegistry) -> Self {
        self.items = items;
        self.set_effects = set_effects;
        self
    }

    /// Current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// World state.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world state, for map edits between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Simulation config.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Item table.
    #[must_use]
    pub const fn items(&self) -> &ItemTable {
        &self.items
    }

    /// Entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.world.entities.get(id)
    }

    /// Unit data by id.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.world.entities.unit(id)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the simulation by one tick.
    ///
    /// # Errors
    ///
    /// With the `debug-validation` feature, returns
    /// [`GameError::InvariantViolation`] if the world is inconsistent after
    /// the tick. The simulation must not be ticked again after an error.
    pub fn tick(&mut self) -> Result<TickEvents> {
        let mut events = TickEvents {
            tick: self.tick,
            ..Default::default()
        };

        self.pathfinder.clear_cache();
        for entity in self.world.entities.iter_mut() {
            entity.last_position = entity.position;
        }

        let (primary, others): (Vec<_>, Vec<_>) =
            self.world.entities.sorted_ids().into_iter().partition(|&id| {
                self.world
                    .entities
                    .unit(id)
                    .is_some_and(Unit::is_primary)
            });

        self.run_group(&others, &mut events);
        self.run_group(&primary, &mut events);
        self.remove_finished(&mut events);
        self.tick += 1;

        #[cfg(debug_assertions)]
        tracing::trace!(tick = events.tick, hash = self.state_hash(), "tick complete");

        #[cfg(feature = "debug-validation")]
        self.validate(events.tick)?;

        Ok(events)
    }

    fn run_group(&mut self, ids: &[EntityId], events: &mut TickEvents) {
        for &id in ids {
            self.timer_phase(id);
        }
        for &id in ids {
            self.movement_phase(id, events);
        }
        for &id in ids {
            self.attack_phase(id, events);
        }
    }

    fn timer_phase(&mut self, id: EntityId) {
        let regen_ticks = self.config.special_regen_ticks.max(1);
        let regen_amount = self.config.special_regen_amount;
        let Some(entity) = self.world.entities.get_mut(id) else {
            return;
        };
        if let Some(countdown) = entity.death_countdown.as_mut() {
            *countdown = countdown.saturating_sub(1);
            return;
        }
        let Some(unit) = entity.unit.as_mut() else {
            return;
        };

        unit.spawn_delay = unit.spawn_delay.saturating_sub(1);
        if unit.special_energy < MAX_SPECIAL_ENERGY {
            unit.special_regen_counter += 1;
            if unit.special_regen_counter >= regen_ticks {
                unit.special_regen_counter = 0;
                unit.special_energy = (unit.special_energy + regen_amount).min(MAX_SPECIAL_ENERGY);
            }
        } else {
            unit.special_regen_counter = 0;
        }
    }

    fn movement_phase(&mut self, id: EntityId, events: &mut TickEvents) {
        let Some(entity) = self.world.entities.get(id) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }
        let Some(unit) = entity.unit.as_ref() else {
            self.static_entity_tick(id);
            return;
        };
        if unit.spawn_delay > 0 || unit.frozen_ticks > 0 || unit.stunned_ticks > 0 {
            return;
        }

        let start = entity.position;
        let Some(plan) = plan_move(&self.world, &mut self.pathfinder, entity, unit) else {
            return;
        };

        let Some(entity) = self.world.entities.get_mut(id) else {
            return;
        };
        if plan.clear_destination {
            if let Some(unit) = entity.unit.as_mut() {
                unit.destination = None;
            }
        }
        if plan.position != start {
            entity.position = plan.position;
            events.moves.push(MoveEvent {
                entity: id,
                from: start,
                to: plan.position,
                crossed: plan.crossed,
            });
        }
    }

    /// Per-tick hook for entities without unit data.
    fn static_entity_tick(&mut self, id: EntityId) {
        let Some(entity) = self.world.entities.get_mut(id) else {
            return;
        };
        if let Some(lifetime) = entity.lifetime.as_mut() {
            *lifetime = lifetime.saturating_sub(1);
            if *lifetime == 0 {
                entity.lifetime = None;
                entity.death_countdown = Some(0);
            }
        }
    }

    fn attack_phase(&mut self, id: EntityId, events: &mut TickEvents) {
        let tick = self.tick;
        let due = {
            let Some(entity) = self.world.entities.get_mut(id) else {
                return;
            };
            if !entity.is_alive() {
                return;
            }
            let Some(unit) = entity.unit.as_mut() else {
                return;
            };
            unit.attack_delay = unit.attack_delay.saturating_sub(1);
            unit.frozen_ticks = unit.frozen_ticks.saturating_sub(1);
            unit.stunned_ticks = unit.stunned_ticks.saturating_sub(1);
            take_due(&mut unit.incoming_hits, tick)
        };

        for delivery in due {
            self.deliver(delivery, events);
        }

        let out_of_hitpoints = self
            .world
            .entities
            .get(id)
            .is_some_and(|e| e.is_alive() && e.unit.as_ref().is_some_and(Unit::is_out_of_hitpoints));
        if out_of_hitpoints {
            self.begin_dying(id, events);
            return;
        }

        self.try_attack(id, events);
    }

    /// Apply a delivery to its target.
    fn deliver(&mut self, delivery: HitDelivery, events: &mut TickEvents) {
        let source_alive = self
            .world
            .entities
            .get(delivery.source)
            .is_some_and(Entity::is_alive);
        if delivery.cancel_on_source_death && !source_alive {
            tracing::debug!(
                source = delivery.source,
                target = delivery.target,
                "delivery cancelled, source gone"
            );
            return;
        }

        let Some(entity) = self.world.entities.get_mut(delivery.target) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }
        let Some(unit) = entity.unit.as_mut() else {
            return;
        };

        let applied = unit.apply_hit(&delivery);
        if unit.enforce_stat_bounds() {
            tracing::warn!(entity = delivery.target, "stats out of range after hit, clamped");
        }
        events.hits.push(HitEvent {
            source: delivery.source,
            target: delivery.target,
            style: delivery.style,
            amount: applied.amount,
            hitpoints: unit.current_stats.hitpoint,
        });

        let died = unit.is_out_of_hitpoints();
        let recoil = if delivery.style.provokes() && source_alive {
            self.set_effects.recoil(&unit.equipment, applied.amount)
        } else {
            None
        };

        if died {
            self.begin_dying(delivery.target, events);
        }
        if let Some(damage) = recoil {
            let reflected = HitDelivery::new(
                delivery.target,
                delivery.source,
                damage,
                HitStyle::Recoil,
                0,
                self.tick,
            );
            self.deliver(reflected, events);
        }
    }

    fn begin_dying(&mut self, id: EntityId, events: &mut TickEvents) {
        let Some(entity) = self.world.entities.get_mut(id) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }
        let ticks = entity.unit.as_ref().map_or(0, |u| u.death_ticks);
        entity.death_countdown = Some(ticks);
        if let Some(unit) = entity.unit.as_mut() {
            unit.aggro = None;
            unit.destination = None;
            unit.special_active = false;
            unit.incoming_hits.clear();
        }
        tracing::debug!(entity = id, tick = self.tick, death_ticks = ticks, "unit died");
        events.deaths.push(id);
    }

    fn try_attack(&mut self, id: EntityId, events: &mut TickEvents) {
        let tick = self.tick;
        let world = &self.world;
        let Some(entity) = world.entities.get(id) else {
            return;
        };
        let Some(unit) = entity.unit.as_ref() else {
            return;
        };
        let Some(target_id) = unit.aggro else {
            return;
        };
        let target = world.entities.get(target_id).filter(|t| t.is_alive());
        let Some((target, defender)) = target.and_then(|t| t.unit.as_ref().map(|u| (t, u))) else {
            if let Some(unit) = self.world.entities.unit_mut(id) {
                unit.aggro = None;
            }
            return;
        };
        if unit.spawn_delay > 0 || unit.stunned_ticks > 0 || unit.attack_delay > 0 {
            return;
        }
        if !can_attack(world, entity, unit, target) {
            return;
        }

        let special_cost = unit.weapon().special.map(|spec| spec.energy_cost);
        let use_special =
            unit.special_active && special_cost.is_some_and(|cost| unit.special_energy >= cost);
        let ctx = CombatContext {
            config: &self.config,
            set_effects: &self.set_effects,
        };
        let outcome = resolve_attack(&ctx, unit, defender, use_special, &mut self.rng);
        let distance = footprint_gap(entity.position, entity.size, target.position, target.size);
        let delay = delivery_delay(
            outcome.style,
            distance,
            unit.is_primary(),
            outcome.delay_reduction,
        );
        let speed = unit.attack_speed();

        if let Some(attacker) = self.world.entities.unit_mut(id) {
            attacker.attack_delay = speed;
            if use_special {
                attacker.special_energy -= special_cost.unwrap_or(0);
            }
            attacker.special_active = false;
            for grant in &outcome.experience {
                attacker.experience.add(grant.skill, grant.amount);
            }
        }

        tracing::debug!(
            attacker = id,
            target = target_id,
            damage = outcome.total_damage(),
            delay,
            "attack"
        );
        events.attacks.push(AttackEvent {
            attacker: id,
            target: target_id,
            style: outcome.style,
            damage: outcome.swings.iter().map(|s| s.damage).collect(),
            max_hit: outcome.swings.first().map_or(0, |s| s.max_hit),
            delay,
            special: outcome.special.is_some(),
        });

        let mut instant = Vec::new();
        for (index, swing) in outcome.swings.iter().enumerate() {
            let effect = if index == 0 { outcome.effect } else { None };
            let hit = HitDelivery::new(id, target_id, swing.damage, outcome.style, delay, tick)
                .with_effect(effect);
            if hit.is_instant() {
                instant.push(hit);
            } else if let Some(defender) = self.world.entities.unit_mut(target_id) {
                defender.incoming_hits.push(hit);
            }
        }
        for hit in instant {
            self.deliver(hit, events);
        }
    }

    fn remove_finished(&mut self, events: &mut TickEvents) {
        for id in self.world.entities.sorted_ids() {
            let finished = self
                .world
                .entities
                .get(id)
                .is_some_and(|e| e.death_countdown == Some(0));
            if finished {
                self.world.entities.remove(id);
                tracing::debug!(entity = id, tick = self.tick, "entity removed");
                events.removed.push(id);
            }
        }
    }

    #[cfg(feature = "debug-validation")]
    fn validate(&self, tick: u64) -> Result<()> {
        let violation = |message: String| GameError::InvariantViolation { tick, message };
        for id in self.world.entities.sorted_ids() {
            let Some(entity) = self.world.entities.get(id) else {
                continue;
            };
            if entity.size < 1 {
                return Err(violation(format!("entity {id} has size {}", entity.size)));
            }
            let Some(unit) = entity.unit.as_ref() else {
                continue;
            };
            let hp = unit.current_stats.hitpoint;
            if hp < 0 || hp > unit.base_stats.hitpoint {
                return Err(violation(format!("entity {id} has {hp} hitpoints")));
            }
            if !entity.is_alive() && !unit.incoming_hits.is_empty() {
                return Err(violation(format!("dying entity {id} has hits queued")));
            }
            if let Some(hit) = unit.incoming_hits.iter().find(|h| h.target != id) {
                return Err(violation(format!(
                    "entity {id} holds a hit addressed to {}",
                    hit.target
                )));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    /// Spawn a unit and return its id.
    pub fn spawn_unit(&mut self, params: UnitSpawnParams) -> EntityId {
        let mut unit = Unit::new(params.name, params.role, params.stats);
        unit.bonuses = params.bonuses + self.items.total_bonuses(&params.equipment);
        let weapon = params
            .weapon
            .or_else(|| self.items.weapon(&params.equipment));
        unit.equipment = params.equipment;
        unit.set_weapon(weapon);
        if let Some(stance) = params.stance.filter(|&s| unit.weapon().offers(s)) {
            unit.stance = stance;
        }
        for prayer in params.prayers {
            unit.prayers.retain(|p| !p.conflicts_with(prayer));
            unit.prayers.insert(prayer);
        }
        unit.aggro = params.aggro;
        unit.auto_retaliate = params.auto_retaliate;
        unit.spawn_delay = params.spawn_delay;
        unit.death_ticks = params
            .death_ticks
            .unwrap_or(self.config.default_death_ticks);

        let id = self
            .world
            .entities
            .insert(Entity::actor(params.position, params.size, unit));
        tracing::debug!(entity = id, position = ?params.position, "spawned unit");
        id
    }

    /// Spawn a static blocker and return its id.
    pub fn spawn_blocker(&mut self, params: BlockerSpawnParams) -> EntityId {
        let mut entity = Entity::blocker(params.position, params.size);
        entity.blocks_movement = params.blocks_movement;
        entity.blocks_line_of_sight = params.blocks_line_of_sight;
        entity.lifetime = params.lifetime.filter(|&t| t > 0);
        self.world.entities.insert(entity)
    }

    /// Remove an entity immediately.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if the entity doesn't exist.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        self.world
            .entities
            .remove(id)
            .map(|_| ())
            .ok_or(GameError::EntityNotFound(id))
    }

    // ========================================================================
    // Orders
    // ========================================================================

    fn live_unit_mut(&mut self, id: EntityId) -> Result<&mut Unit> {
        let Some(entity) = self.world.entities.get_mut(id) else {
            return Err(rejected(GameError::EntityNotFound(id)));
        };
        if !entity.is_alive() {
            return Err(rejected(GameError::UnitDying(id)));
        }
        entity
            .unit
            .as_mut()
            .ok_or_else(|| rejected(GameError::NotAUnit(id)))
    }

    /// Walk to a tile. Clears the current target.
    ///
    /// # Errors
    ///
    /// Fails if the entity is missing, dying or not a unit.
    pub fn request_move(&mut self, id: EntityId, destination: TilePos) -> Result<()> {
        let unit = self.live_unit_mut(id)?;
        unit.destination = Some(destination);
        unit.aggro = None;
        Ok(())
    }

    /// Toggle running for a primary unit.
    ///
    /// # Errors
    ///
    /// Fails if the entity is missing, dying or not a unit.
    pub fn set_running(&mut self, id: EntityId, running: bool) -> Result<()> {
        self.live_unit_mut(id)?.running = running;
        Ok(())
    }

    /// Set whether hits make the unit fight back.
    ///
    /// # Errors
    ///
    /// Fails if the entity is missing, dying or not a unit.
    pub fn set_auto_retaliate(&mut self, id: EntityId, enabled: bool) -> Result<()> {
        self.live_unit_mut(id)?.auto_retaliate = enabled;
        Ok(())
    }

    /// Target another unit, or clear the target with `None`.
    ///
    /// Setting a target cancels any walk destination.
    ///
    /// # Errors
    ///
    /// Fails if either side is missing, dying or not a unit, or if a unit
    /// targets itself.
    pub fn set_aggro(&mut self, id: EntityId, target: Option<EntityId>) -> Result<()> {
        if let Some(target) = target {
            if target == id {
                return Err(rejected(GameError::SelfTarget(id)));
            }
            self.live_unit_mut(target)?;
        }
        let unit = self.live_unit_mut(id)?;
        unit.aggro = target;
        if target.is_some() {
            unit.destination = None;
        }
        Ok(())
    }

    /// Switch stance.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::StanceUnavailable`] if the weapon lacks the stance.
    pub fn toggle_stance(&mut self, id: EntityId, stance: Stance) -> Result<()> {
        let unit = self.live_unit_mut(id)?;
        if !unit.weapon().offers(stance) {
            return Err(rejected(GameError::StanceUnavailable {
                stance,
                weapon: unit.weapon().name.clone(),
            }));
        }
        unit.stance = stance;
        Ok(())
    }

    /// Arm or disarm the special attack. Returns the new state.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SpecialUnavailable`] when arming a weapon
    /// without a special attack or without enough energy.
    pub fn toggle_special_attack(&mut self, id: EntityId) -> Result<bool> {
        let unit = self.live_unit_mut(id)?;
        if unit.special_active {
            unit.special_active = false;
            return Ok(false);
        }
        match unit.weapon().special {
            Some(spec) if unit.special_energy >= spec.energy_cost => {
                unit.special_active = true;
                Ok(true)
            }
            _ => Err(rejected(GameError::SpecialUnavailable(id))),
        }
    }

    /// Turn a prayer on or off. Returns whether it is now active.
    ///
    /// Activating a prayer deactivates any conflicting one.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PrayerUnavailable`] when activating with no
    /// prayer points.
    pub fn toggle_prayer(&mut self, id: EntityId, prayer: Prayer) -> Result<bool> {
        let unit = self.live_unit_mut(id)?;
        if unit.prayers.remove(&prayer) {
            return Ok(false);
        }
        if unit.current_stats.prayer <= 0 {
            return Err(rejected(GameError::PrayerUnavailable { entity: id, prayer }));
        }
        unit.prayers.retain(|p| !p.conflicts_with(prayer));
        unit.prayers.insert(prayer);
        Ok(true)
    }

    /// Replace worn items and recompute bonuses and weapon from the item table.
    ///
    /// # Errors
    ///
    /// Fails if the entity is missing, dying or not a unit.
    pub fn equipment_changed(&mut self, id: EntityId, equipment: Equipment) -> Result<()> {
        let bonuses = self.items.total_bonuses(&equipment);
        let weapon = self.items.weapon(&equipment);
        let unit = self.live_unit_mut(id)?;
        unit.bonuses = bonuses;
        unit.equipment = equipment;
        unit.set_weapon(weapon);
        Ok(())
    }

    /// Send a heal from `source` to `target`.
    ///
    /// The heal travels like a spell. With `cancel_on_source_death` it is
    /// dropped if the source dies before it lands.
    ///
    /// # Errors
    ///
    /// Fails if either side is missing, dying or not a unit.
    pub fn queue_heal(
        &mut self,
        source: EntityId,
        target: EntityId,
        amount: i32,
        cancel_on_source_death: bool,
    ) -> Result<()> {
        let tick = self.tick;
        let from = self
            .world
            .entities
            .get(source)
            .ok_or(GameError::EntityNotFound(source))?;
        let (from_pos, from_size) = (from.position, from.size);
        let from_primary = self.live_unit_mut(source)?.is_primary();
        let to = self
            .world
            .entities
            .get(target)
            .ok_or(GameError::EntityNotFound(target))?;
        let distance = footprint_gap(from_pos, from_size, to.position, to.size);
        let delay = delivery_delay(HitStyle::Heal, distance, from_primary, 0);

        let mut heal = HitDelivery::new(source, target, -amount.abs(), HitStyle::Heal, delay, tick);
        if cancel_on_source_death {
            heal = heal.cancel_on_source_death();
        }
        self.live_unit_mut(target)?.incoming_hits.push(heal);
        Ok(())
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Snapshot of one unit.
    #[must_use]
    pub fn snapshot(&self, id: EntityId) -> Option<UnitSnapshot> {
        let entity = self.world.entities.get(id)?;
        let unit = entity.unit.as_ref()?;
        Some(UnitSnapshot {
            id,
            name: unit.name.clone(),
            role: unit.role,
            position: entity.position,
            last_position: entity.last_position,
            size: entity.size,
            current_stats: unit.current_stats,
            base_stats: unit.base_stats,
            stance: unit.stance,
            prayers: unit.prayers.iter().copied().collect(),
            aggro: unit.aggro,
            attack_delay: unit.attack_delay,
            frozen_ticks: unit.frozen_ticks,
            special_energy: unit.special_energy,
            dying: !entity.is_alive(),
            incoming: unit
                .incoming_hits
                .iter()
                .map(|h| PendingHit {
                    source: h.source,
                    damage: h.damage,
                    style: h.style,
                    age: h.age,
                    remaining_delay: h.remaining_delay,
                })
                .collect(),
            experience: unit
                .experience
                .iter()
                .map(|(skill, xp)| (skill, xp.to_num::<f64>()))
                .collect(),
        })
    }

    /// Snapshots of every unit in id order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<UnitSnapshot> {
        self.world
            .entities
            .sorted_ids()
            .into_iter()
            .filter_map(|id| self.snapshot(id))
            .collect()
    }

    /// Hash of the simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);

        let ids = self.world.entities.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            let Some(entity) = self.world.entities.get(id) else {
                continue;
            };
            id.hash(&mut hasher);
            entity.position.hash(&mut hasher);
            entity.size.hash(&mut hasher);
            entity.death_countdown.hash(&mut hasher);
            entity.lifetime.hash(&mut hasher);

            if let Some(unit) = entity.unit.as_ref() {
                unit.current_stats.hash(&mut hasher);
                unit.aggro.hash(&mut hasher);
                unit.attack_delay.hash(&mut hasher);
                unit.frozen_ticks.hash(&mut hasher);
                unit.stunned_ticks.hash(&mut hasher);
                unit.destination.hash(&mut hasher);
                unit.special_energy.hash(&mut hasher);
                unit.special_active.hash(&mut hasher);
                unit.stance.hash(&mut hasher);
                unit.prayers.hash(&mut hasher);
                unit.incoming_hits.hash(&mut hasher);
                for (skill, xp) in unit.experience.iter() {
                    skill.hash(&mut hasher);
                    xp.to_bits().hash(&mut hasher);
                }
            }
        }

        hasher.finish()
    }
}

fn rejected(err: GameError) -> GameError {
    tracing::warn!(%err, "order rejected");
    err
}

/// Whether `attacker` can hit `target` from where it stands.
///
/// Non-primary attackers look from their own footprint. Primary attackers
/// look from their tile, except against large targets where the target's
/// footprint decides.
#[must_use]
pub fn can_attack(world: &World, attacker: &Entity, unit: &Unit, target: &Entity) -> bool {
    let range = unit.attack_range();
    if !unit.is_primary() {
        let aim = closest_tile(target.position, target.size, attacker.position);
        has_line_of_sight(world, attacker.position, aim, attacker.size, range, true)
    } else if target.size > 1 {
        has_line_of_sight(
            world,
            target.position,
            attacker.position,
            target.size,
            range,
            true,
        )
    } else {
        has_line_of_sight(
            world,
            attacker.position,
            target.position,
            attacker.size,
            range,
            false,
        )
    }
}

/// Decide where a unit moves this tick.
fn plan_move(
    world: &World,
    pathfinder: &mut Pathfinder,
    entity: &Entity,
    unit: &Unit,
) -> Option<MovePlan> {
    let avoid = unit.consumes_space.then_some(entity.id);

    if let Some(destination) = unit.destination {
        let step = pathfinder.step_toward(
            world,
            entity.position,
            &[destination],
            entity.size,
            avoid,
            unit.movement_speed(),
        );
        return Some(match step {
            Some(step) => MovePlan {
                clear_destination: step.arrived(),
                position: step.position,
                crossed: step.crossed,
            },
            None => MovePlan {
                position: entity.position,
                crossed: Vec::new(),
                clear_destination: true,
            },
        });
    }

    let target = world
        .entities
        .get(unit.aggro?)
        .filter(|t| t.is_alive())?;
    if can_attack(world, entity, unit, target) {
        return None;
    }

    if unit.is_primary() {
        let goals = edge_neighbours(target.position, target.size);
        let step = pathfinder.step_toward(
            world,
            entity.position,
            &goals,
            entity.size,
            avoid,
            unit.movement_speed(),
        )?;
        Some(MovePlan {
            position: step.position,
            crossed: step.crossed,
            clear_destination: false,
        })
    } else {
        let next = pathfinder.greedy_step(
            world,
            entity.position,
            entity.size,
            avoid,
            target.position,
            target.size,
        )?;
        Some(MovePlan {
            position: next,
            crossed: vec![next],
            clear_destination: false,
        })
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(GridMap::new(), SimulationConfig::default())
    }
}
