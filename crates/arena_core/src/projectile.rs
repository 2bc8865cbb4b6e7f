//! Delayed hit delivery.
//!
//! An attack resolves immediately but its damage lands later, after a
//! delay that depends on style and distance. Pending deliveries sit in
//! the target's queue and are drained during the target's attack phase.

use serde::{Deserialize, Serialize};

use crate::components::{CombatClass, MeleeType, Skill};
use crate::world::EntityId;

/// How a hit travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitStyle {
    /// Instant melee hit.
    Melee(MeleeType),
    /// Arrow, bolt or thrown weapon.
    Ranged,
    /// Spell.
    Magic,
    /// Healing spell. Damage is negative.
    Heal,
    /// Reflected damage. Instant.
    Recoil,
}

impl HitStyle {
    /// Style used by attacks of a combat class.
    #[must_use]
    pub const fn for_attack(class: CombatClass, melee_type: MeleeType) -> Self {
        match class {
            CombatClass::Melee => Self::Melee(melee_type),
            CombatClass::Ranged => Self::Ranged,
            CombatClass::Magic => Self::Magic,
        }
    }

    /// Whether hits of this style should provoke the target.
    #[must_use]
    pub const fn provokes(self) -> bool {
        !matches!(self, Self::Heal | Self::Recoil)
    }
}

/// A side effect carried by a hit and applied on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitEffect {
    /// Prevent movement for a number of ticks.
    Freeze(u32),
    /// Lower a current stat.
    Drain {
        /// Stat lowered.
        skill: Skill,
        /// Levels removed.
        amount: i32,
    },
}

/// A hit in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HitDelivery {
    /// Attacker or healer.
    pub source: EntityId,
    /// Recipient.
    pub target: EntityId,
    /// Damage to apply; negative heals.
    pub damage: i32,
    /// Travel style.
    pub style: HitStyle,
    /// Ticks until arrival.
    pub remaining_delay: u32,
    /// Ticks spent in flight.
    pub age: u32,
    /// Tick the delivery was created on. Not advanced on that tick.
    pub created_tick: u64,
    /// Drop the delivery if the source dies or disappears first.
    pub cancel_on_source_death: bool,
    /// Effect applied on arrival.
    pub effect: Option<HitEffect>,
}

impl HitDelivery {
    /// Create a delivery.
    #[must_use]
    pub fn new(
        source: EntityId,
        target: EntityId,
        damage: i32,
        style: HitStyle,
        delay: u32,
        created_tick: u64,
    ) -> Self {
        Self {
            source,
            target,
            damage,
            style,
            remaining_delay: delay,
            age: 0,
            created_tick,
            cancel_on_source_death: false,
            effect: None,
        }
    }

    /// Attach an on-arrival effect.
    #[must_use]
    pub fn with_effect(mut self, effect: Option<HitEffect>) -> Self {
        self.effect = effect;
        self
    }

    /// Mark the delivery as cancelled by the source's death.
    #[must_use]
    pub fn cancel_on_source_death(mut self) -> Self {
        self.cancel_on_source_death = true;
        self
    }

    /// Whether the delivery lands immediately without queueing.
    #[must_use]
    pub const fn is_instant(&self) -> bool {
        self.remaining_delay == 0
    }
}

/// Delivery delay in ticks.
///
/// `distance` is the Chebyshev gap between the closest tiles of the two
/// footprints. Melee and recoil are instant. Primary actors' hits take
/// one extra tick. Reductions never bring a delayed hit below one tick.
#[must_use]
pub fn delivery_delay(style: HitStyle, distance: i32, from_primary: bool, reduction: u32) -> u32 {
    let distance = distance.max(0) as u32;
    let base = match style {
        HitStyle::Melee(_) | HitStyle::Recoil => return 0,
        HitStyle::Ranged => 1 + (3 + distance) / 6,
        HitStyle::Magic | HitStyle::Heal => 1 + (1 + distance) / 3,
    };
    (base + u32::from(from_primary)).saturating_sub(reduction).max(1)
}

/// Advance queued deliveries and remove the ones that arrive this tick.
///
/// Deliveries created on `tick` are left untouched. Arrivals are
/// returned in queue order.
pub fn take_due(queue: &mut Vec<HitDelivery>, tick: u64) -> Vec<HitDelivery> {
    let mut due = Vec::new();
    let mut index = 0;
    while index < queue.len() {
        let delivery = &mut queue[index];
        if delivery.created_tick == tick {
            index += 1;
            continue;
        }
        delivery.age += 1;
        delivery.remaining_delay = delivery.remaining_delay.saturating_sub(1);
        if delivery.remaining_delay == 0 {
            due.push(queue.remove(index));
        } else {
            index += 1;
        }
    }
    due
}
