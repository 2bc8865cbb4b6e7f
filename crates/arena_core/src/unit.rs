//! Combat-capable actors.
//!
//! A [`Unit`] is the combat half of an entity: stats, gear, targeting and
//! timers. Position and footprint stay on the owning entity.

use std::collections::BTreeSet;

use crate::combat::weapons::Weapon;
use crate::components::{
    Bonuses, CombatClass, Experience, Prayer, Stance, Stats, UnitRole,
};
use crate::items::Equipment;
use crate::math::TilePos;
use crate::projectile::{HitDelivery, HitEffect, HitStyle};
use crate::world::EntityId;

/// Highest special attack energy.
pub const MAX_SPECIAL_ENERGY: u32 = 100;

/// Combat state of an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Display name.
    pub name: String,
    /// Primary (player) or non-primary (NPC).
    pub role: UnitRole,
    /// Maximum levels.
    pub base_stats: Stats,
    /// Current levels, after damage, drains and boosts.
    pub current_stats: Stats,
    /// Summed equipment bonuses.
    pub bonuses: Bonuses,
    /// Worn items.
    pub equipment: Equipment,
    /// Equipped weapon; `None` fights unarmed.
    pub weapon: Option<Weapon>,
    /// Active combat stance.
    pub stance: Stance,
    /// Active prayers.
    pub prayers: BTreeSet<Prayer>,
    /// Current attack target.
    pub aggro: Option<EntityId>,
    /// Ticks until the next attack is allowed.
    pub attack_delay: u32,
    /// Ticks of remaining freeze. Frozen units cannot move.
    pub frozen_ticks: u32,
    /// Ticks of remaining stun. Stunned units neither move nor attack.
    pub stunned_ticks: u32,
    /// Whether this unit blocks other space-consuming units.
    pub consumes_space: bool,
    /// Whether being hit sets aggro on the attacker.
    pub auto_retaliate: bool,
    /// Hits in flight toward this unit.
    pub incoming_hits: Vec<HitDelivery>,
    /// Tile the unit is walking to.
    pub destination: Option<TilePos>,
    /// Primary actors only: move two tiles per tick.
    pub running: bool,
    /// Special attack energy, 0 to 100.
    pub special_energy: u32,
    /// Whether the next attack is a special attack.
    pub special_active: bool,
    /// Ticks since the last energy regeneration step.
    pub special_regen_counter: u32,
    /// Ticks before the unit may act after spawning.
    pub spawn_delay: u32,
    /// Length of the death animation in ticks.
    pub death_ticks: u32,
    /// Experience earned.
    pub experience: Experience,
}

impl Unit {
    /// Create a unit at full health with no gear.
    #[must_use]
    pub fn new(name: impl Into<String>, role: UnitRole, stats: Stats) -> Self {
        Self {
            name: name.into(),
            role,
            base_stats: stats,
            current_stats: stats,
            bonuses: Bonuses::default(),
            equipment: Equipment::new(),
            weapon: None,
            stance: Stance::Accurate,
            prayers: BTreeSet::new(),
            aggro: None,
            attack_delay: 0,
            frozen_ticks: 0,
            stunned_ticks: 0,
            consumes_space: !role.is_primary(),
            auto_retaliate: true,
            incoming_hits: Vec::new(),
            destination: None,
            running: role.is_primary(),
            special_energy: MAX_SPECIAL_ENERGY,
            special_active: false,
            special_regen_counter: 0,
            spawn_delay: 0,
            death_ticks: 0,
            experience: Experience::default(),
        }
    }

    /// Equipped weapon, or bare hands.
    #[must_use]
    pub fn weapon(&self) -> &Weapon {
        self.weapon.as_ref().unwrap_or_else(|| Weapon::unarmed())
    }

    /// Combat class of the current weapon.
    #[must_use]
    pub fn class(&self) -> CombatClass {
        self.weapon().class()
    }

    /// Ticks between attacks with the current weapon and stance.
    #[must_use]
    pub fn attack_speed(&self) -> u32 {
        self.weapon().speed_with(self.stance)
    }

    /// Attack range with the current weapon and stance.
    #[must_use]
    pub fn attack_range(&self) -> i32 {
        self.weapon().range_with(self.stance)
    }

    /// Whether this is the primary actor.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.role.is_primary()
    }

    /// Whether the unit is already fighting something.
    #[must_use]
    pub const fn in_combat(&self) -> bool {
        self.aggro.is_some()
    }

    /// Tiles moved per tick.
    #[must_use]
    pub const fn movement_speed(&self) -> usize {
        if self.is_primary() && self.running {
            2
        } else {
            1
        }
    }

    /// Whether the unit has run out of hitpoints.
    #[must_use]
    pub const fn is_out_of_hitpoints(&self) -> bool {
        self.current_stats.hitpoint <= 0
    }

    /// Active prayer whose multiplier is largest under `pick`.
    #[must_use]
    pub fn prayer_percent(&self, pick: impl Fn(Prayer) -> i64) -> i64 {
        self.prayers.iter().map(|&p| pick(p)).max().unwrap_or(100).max(100)
    }

    /// Whether an active prayer protects against `class`.
    #[must_use]
    pub fn is_protected_from(&self, class: CombatClass) -> bool {
        self.prayers.iter().any(|p| p.protects_against(class))
    }

    /// Replace the weapon, resetting the stance if the new weapon lacks it.
    pub fn set_weapon(&mut self, weapon: Option<Weapon>) {
        self.weapon = weapon;
        if !self.weapon().offers(self.stance) {
            self.stance = Stance::default_for(self.class());
        }
        if self.weapon().special.is_none() {
            self.special_active = false;
        }
    }

    /// Clamp current stats into their legal ranges.
    ///
    /// Returns `true` if anything had to change.
    pub fn enforce_stat_bounds(&mut self) -> bool {
        let before = self.current_stats;
        let stats = &mut self.current_stats;
        stats.attack = stats.attack.max(0);
        stats.strength = stats.strength.max(0);
        stats.defence = stats.defence.max(0);
        stats.ranged = stats.ranged.max(0);
        stats.magic = stats.magic.max(0);
        stats.prayer = stats.prayer.max(0);
        stats.hitpoint = stats.hitpoint.clamp(0, self.base_stats.hitpoint.max(0));
        self.special_energy = self.special_energy.min(MAX_SPECIAL_ENERGY);
        before != self.current_stats
    }

    /// Apply an arriving hit to this unit.
    ///
    /// Damage is clamped at zero hitpoints and healing at the base level.
    /// An idle unit with auto-retaliate turns on the source and flinches.
    pub fn apply_hit(&mut self, delivery: &HitDelivery) -> AppliedHit {
        let before = self.current_stats.hitpoint;
        if delivery.style == HitStyle::Heal || delivery.damage < 0 {
            let healed = (before + delivery.damage.saturating_abs()).min(self.base_stats.hitpoint);
            self.current_stats.hitpoint = healed.max(before);
            return AppliedHit {
                amount: before - self.current_stats.hitpoint,
                retaliated: false,
            };
        }

        let damage = delivery.damage.clamp(0, before.max(0));
        self.current_stats.hitpoint = before - damage;

        match delivery.effect {
            Some(HitEffect::Freeze(ticks)) if self.frozen_ticks == 0 => {
                self.frozen_ticks = ticks;
            }
            Some(HitEffect::Drain { skill, amount }) => {
                let level = self.current_stats.get_mut(skill);
                *level = (*level - amount.max(0)).max(0);
            }
            _ => {}
        }

        let mut retaliated = false;
        if delivery.style.provokes() && !self.in_combat() && delivery.source != delivery.target {
            if self.auto_retaliate {
                self.aggro = Some(delivery.source);
                self.destination = None;
                retaliated = true;
            }
            self.attack_delay = self.attack_speed().div_ceil(2);
        }

        AppliedHit {
            amount: damage,
            retaliated,
        }
    }
}

/// Result of applying a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedHit {
    /// Hitpoints removed; negative when healed.
    pub amount: i32,
    /// Whether the hit made the unit target its source.
    pub retaliated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{MeleeType, Skill};

    fn npc() -> Unit {
        Unit::new("Guard", UnitRole::Npc, Stats::uniform(20))
    }

    #[test]
    fn test_new_unit_defaults() {
        let unit = npc();
        assert!(unit.consumes_space);
        assert!(!unit.running);
        assert_eq!(unit.weapon().name, "Unarmed");
        assert_eq!(unit.attack_speed(), 4);
        assert_eq!(unit.movement_speed(), 1);

        let player = Unit::new("Player", UnitRole::Player, Stats::uniform(99));
        assert!(!player.consumes_space);
        assert_eq!(player.movement_speed(), 2);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut unit = npc();
        let hit = HitDelivery::new(2, 1, 50, HitStyle::Ranged, 1, 0);
        let applied = unit.apply_hit(&hit);
        assert_eq!(applied.amount, 20);
        assert_eq!(unit.current_stats.hitpoint, 0);
        assert!(unit.is_out_of_hitpoints());
    }

    #[test]
    fn test_heal_clamps_at_base() {
        let mut unit = npc();
        unit.current_stats.hitpoint = 15;
        let heal = HitDelivery::new(2, 1, -10, HitStyle::Heal, 1, 0);
        let applied = unit.apply_hit(&heal);
        assert_eq!(unit.current_stats.hitpoint, 20);
        assert_eq!(applied.amount, -5);
        assert!(unit.aggro.is_none());
    }

    #[test]
    fn test_idle_unit_retaliates_and_flinches() {
        let mut unit = npc();
        let hit = HitDelivery::new(7, 1, 3, HitStyle::Melee(MeleeType::Slash), 0, 0);
        let applied = unit.apply_hit(&hit);
        assert!(applied.retaliated);
        assert_eq!(unit.aggro, Some(7));
        // Unarmed speed 4 halves to 2.
        assert_eq!(unit.attack_delay, 2);
    }

    #[test]
    fn test_busy_unit_keeps_target() {
        let mut unit = npc();
        unit.aggro = Some(3);
        unit.attack_delay = 1;
        let hit = HitDelivery::new(7, 1, 3, HitStyle::Ranged, 1, 0);
        assert!(!unit.apply_hit(&hit).retaliated);
        assert_eq!(unit.aggro, Some(3));
        assert_eq!(unit.attack_delay, 1);
    }

    #[test]
    fn test_effects_apply_on_arrival() {
        let mut unit = npc();
        let freeze = HitDelivery::new(7, 1, 0, HitStyle::Magic, 1, 0)
            .with_effect(Some(HitEffect::Freeze(16)));
        unit.apply_hit(&freeze);
        assert_eq!(unit.frozen_ticks, 16);

        let drain = HitDelivery::new(7, 1, 25, HitStyle::Melee(MeleeType::Slash), 0, 0)
            .with_effect(Some(HitEffect::Drain {
                skill: Skill::Defence,
                amount: 25,
            }));
        unit.apply_hit(&drain);
        assert_eq!(unit.current_stats.defence, 0);
    }

    #[test]
    fn test_enforce_stat_bounds() {
        let mut unit = npc();
        unit.current_stats.hitpoint = 40;
        unit.current_stats.magic = -2;
        assert!(unit.enforce_stat_bounds());
        assert_eq!(unit.current_stats.hitpoint, 20);
        assert_eq!(unit.current_stats.magic, 0);
        assert!(!unit.enforce_stat_bounds());
    }
}
