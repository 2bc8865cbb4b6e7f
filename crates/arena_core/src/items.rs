//! Equipment and the item table.
//!
//! Items are looked up by id. A unit's bonuses are always the sum of its
//! equipped items' bonuses, and its weapon is whatever sits in the weapon
//! slot.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::combat::weapons::Weapon;
use crate::components::Bonuses;

/// Item identifier.
pub type ItemId = u32;

/// Where an item is worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentSlot {
    /// Helmets.
    Head,
    /// Capes.
    Cape,
    /// Amulets.
    Neck,
    /// Ammunition.
    Ammo,
    /// Main hand.
    Weapon,
    /// Body armour.
    Body,
    /// Shields and off-hands.
    Shield,
    /// Leg armour.
    Legs,
    /// Gloves.
    Hands,
    /// Boots.
    Feet,
    /// Rings.
    Ring,
}

/// Static definition of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Unique identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Slot the item occupies.
    pub slot: EquipmentSlot,
    /// Bonuses granted while worn.
    #[serde(default)]
    pub bonuses: Bonuses,
    /// Weapon data for items in the weapon slot.
    #[serde(default)]
    pub weapon: Option<Weapon>,
}

/// Items worn by a unit, one per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equipment {
    slots: BTreeMap<EquipmentSlot, ItemId>,
}

impl Equipment {
    /// Create empty equipment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an item in a slot, returning what was there before.
    pub fn equip(&mut self, slot: EquipmentSlot, item: ItemId) -> Option<ItemId> {
        self.slots.insert(slot, item)
    }

    /// Empty a slot.
    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<ItemId> {
        self.slots.remove(&slot)
    }

    /// Item in a slot.
    #[must_use]
    pub fn get(&self, slot: EquipmentSlot) -> Option<ItemId> {
        self.slots.get(&slot).copied()
    }

    /// Whether the item is worn in any slot.
    #[must_use]
    pub fn is_wearing(&self, item: ItemId) -> bool {
        self.slots.values().any(|&worn| worn == item)
    }

    /// Worn items in slot order.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.slots.values().copied()
    }

    /// Whether nothing is worn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Registry of item definitions.
#[derive(Debug, Clone, Default)]
pub struct ItemTable {
    items: HashMap<ItemId, ItemDef>,
}

impl ItemTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item, replacing any definition with the same id.
    pub fn insert(&mut self, item: ItemDef) {
        self.items.insert(item.id, item);
    }

    /// Look up an item.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&ItemDef> {
        self.items.get(&id)
    }

    /// Number of registered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of bonuses over worn items. Unknown ids contribute nothing.
    #[must_use]
    pub fn total_bonuses(&self, equipment: &Equipment) -> Bonuses {
        equipment
            .items()
            .filter_map(|id| self.get(id))
            .fold(Bonuses::default(), |acc, item| acc + item.bonuses)
    }

    /// Weapon in the weapon slot, if it has weapon data.
    #[must_use]
    pub fn weapon(&self, equipment: &Equipment) -> Option<Weapon> {
        equipment
            .get(EquipmentSlot::Weapon)
            .and_then(|id| self.get(id))
            .and_then(|item| item.weapon.clone())
    }
}

impl FromIterator<ItemDef> for ItemTable {
    fn from_iter<T: IntoIterator<Item = ItemDef>>(iter: T) -> Self {
        let mut table = Self::new();
        for item in iter {
            table.insert(item);
        }
        table
    }
}
