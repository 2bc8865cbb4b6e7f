//! Entity registry and world state.
//!
//! Every actor and static blocker is an [`Entity`] keyed by [`EntityId`].
//! Entities refer to each other only by id; a lookup that misses means
//! the other side is gone.

use std::collections::HashMap;

use crate::grid::{GridMap, LosMask};
use crate::math::TilePos;
use crate::unit::Unit;

/// Unique identifier for entities.
pub type EntityId = u64;

/// Something that occupies tiles.
///
/// Entities with a [`Unit`] fight and move. Entities without one are
/// static blockers such as pillars, which may block movement, sight or
/// both, and may expire after a lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// South-west tile of the footprint.
    pub position: TilePos,
    /// Position at the start of the current tick.
    pub last_position: TilePos,
    /// Footprint side length in tiles.
    pub size: i32,
    /// `None` while alive; counts down once dying and is removed at zero.
    pub death_countdown: Option<u32>,
    /// Static entities only: blocks pathing onto its footprint.
    pub blocks_movement: bool,
    /// Static entities only: blocks sight through its footprint.
    pub blocks_line_of_sight: bool,
    /// Static entities only: ticks until the entity starts dying.
    pub lifetime: Option<u32>,
    /// Combat state for actors.
    pub unit: Option<Unit>,
}

impl Entity {
    /// Create a static blocker.
    #[must_use]
    pub fn blocker(position: TilePos, size: i32) -> Self {
        Self {
            id: 0,
            position,
            last_position: position,
            size: size.max(1),
            death_countdown: None,
            blocks_movement: true,
            blocks_line_of_sight: true,
            lifetime: None,
            unit: None,
        }
    }

    /// Create an actor entity.
    #[must_use]
    pub fn actor(position: TilePos, size: i32, unit: Unit) -> Self {
        Self {
            id: 0,
            position,
            last_position: position,
            size: size.max(1),
            death_countdown: None,
            blocks_movement: false,
            blocks_line_of_sight: false,
            lifetime: None,
            unit: Some(unit),
        }
    }

    /// Whether the entity has not started dying.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.death_countdown.is_none()
    }

    /// Whether the entity is a static blocker rather than an actor.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.unit.is_none()
    }

    /// Whether the entity is an actor that blocks other actors.
    #[must_use]
    pub fn consumes_space(&self) -> bool {
        self.is_alive() && self.unit.as_ref().is_some_and(|u| u.consumes_space)
    }

    /// Whether the footprint covers a tile.
    #[must_use]
    pub const fn covers(&self, pos: TilePos) -> bool {
        pos.x >= self.position.x
            && pos.x < self.position.x + self.size
            && pos.y >= self.position.y
            && pos.y < self.position.y + self.size
    }
}

/// Storage for all entities in the simulation.
///
/// Uses a `HashMap` for O(1) lookup, with deterministic iteration via
/// sorted ids when processing a tick.
#[derive(Debug, Clone, Default)]
pub struct EntityStorage {
    entities: HashMap<EntityId, Entity>,
    next_id: EntityId,
}

impl EntityStorage {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new entity and return its assigned id.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity by id.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Unit data of an entity, if it is an actor.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.get(id).and_then(|e| e.unit.as_ref())
    }

    /// Mutable unit data of an entity, if it is an actor.
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.get_mut(id).and_then(|e| e.unit.as_mut())
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Sorted entity ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all entities (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterate mutably over all entities (not in deterministic order).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }
}

/// The map plus everything standing on it.
#[derive(Debug, Clone, Default)]
pub struct World {
    /// Tile map.
    pub grid: GridMap,
    /// Registered entities.
    pub entities: EntityStorage,
}

impl World {
    /// Create a world over a map with no entities.
    #[must_use]
    pub fn new(grid: GridMap) -> Self {
        Self {
            grid,
            entities: EntityStorage::new(),
        }
    }

    /// Line-of-sight mask at a tile, including static sight blockers.
    #[must_use]
    pub fn los_mask(&self, pos: TilePos) -> LosMask {
        let mask = self.grid.los_mask(pos);
        if mask.contains(LosMask::FULL) || self.sight_blocker_at(pos) {
            LosMask::FULL
        } else {
            mask
        }
    }

    /// Whether a live static entity blocks sight through a tile.
    #[must_use]
    pub fn sight_blocker_at(&self, pos: TilePos) -> bool {
        self.entities
            .iter()
            .any(|e| e.is_static() && e.is_alive() && e.blocks_line_of_sight && e.covers(pos))
    }
}
