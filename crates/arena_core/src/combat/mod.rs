//! Combat resolution.
//!
//! [`resolve_attack`] turns one attack into an [`AttackOutcome`]: accuracy
//! and damage rolls, set effects, protection prayers, damage clamping and
//! experience. It is pure apart from the rolls it draws; the simulation
//! decides what to do with the outcome.
//!
//! Resolution order:
//! 1. Attack roll from the attacker's level, stance, prayer and gear
//! 2. Defence roll from the defender's level, stance, prayer and gear
//! 3. Hit chance, accuracy roll, damage roll per swing
//! 4. Defender set effects, then protection prayers
//! 5. Clamp to the ceiling and the defender's remaining hitpoints
//! 6. Experience for the total damage

pub mod experience;
pub mod formulas;
pub mod set_effects;
pub mod weapons;

use crate::components::{AttackType, CombatClass, MeleeType, Skill, UnitRole};
use crate::config::SimulationConfig;
use crate::math::scale_percent;
use crate::projectile::{HitEffect, HitStyle};
use crate::rng::CombatRng;
use crate::unit::Unit;

use self::experience::XpGrant;
use self::formulas::{
    effective_level, hit_chance, magic_max_hit, npc_effective_level, player_magic_defence_level,
    roll, strength_max_hit,
};
use self::set_effects::{AttackModifiers, SetEffectRegistry};
use self::weapons::{SpecialAttack, WeaponKind};

/// Shared read-only inputs for resolving attacks.
#[derive(Debug, Clone, Copy)]
pub struct CombatContext<'a> {
    /// Tuning.
    pub config: &'a SimulationConfig,
    /// Registered set effects.
    pub set_effects: &'a SetEffectRegistry,
}

/// One accuracy and damage roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swing {
    /// Whether the accuracy roll succeeded.
    pub hit: bool,
    /// Damage after reductions and clamping.
    pub damage: i32,
    /// Max hit the damage roll used.
    pub max_hit: i32,
}

/// Everything an attack produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    /// Weapon class used.
    pub class: CombatClass,
    /// How the hits travel.
    pub style: HitStyle,
    /// One swing, or two for double-hit specials.
    pub swings: Vec<Swing>,
    /// Experience for the attacker.
    pub experience: Vec<XpGrant>,
    /// Effect carried by the first swing.
    pub effect: Option<HitEffect>,
    /// Ticks removed from the delivery delay.
    pub delay_reduction: u32,
    /// Special attack used, if any.
    pub special: Option<SpecialAttack>,
}

impl AttackOutcome {
    /// Total damage over all swings.
    #[must_use]
    pub fn total_damage(&self) -> i32 {
        self.swings.iter().map(|s| s.damage).sum()
    }

    /// Whether any swing landed.
    #[must_use]
    pub fn landed(&self) -> bool {
        self.swings.iter().any(|s| s.hit)
    }
}

/// Resolve one attack from `attacker` against `defender`.
///
/// With `use_special` set the weapon's special attack (if any) replaces
/// the normal swing. Energy is not checked or spent here.
pub fn resolve_attack(
    ctx: &CombatContext<'_>,
    attacker: &Unit,
    defender: &Unit,
    use_special: bool,
    rng: &mut impl CombatRng,
) -> AttackOutcome {
    let weapon = attacker.weapon();
    let class = weapon.class();
    let (attack_type, melee_type) = match &weapon.kind {
        WeaponKind::Melee { melee_type } => (AttackType::from(*melee_type), *melee_type),
        WeaponKind::Ranged => (AttackType::Ranged, MeleeType::default()),
        WeaponKind::Magic { .. } => (AttackType::Magic, MeleeType::default()),
    };
    let special = if use_special {
        weapon.special.map(|spec| spec.attack)
    } else {
        None
    };

    let mods = if attacker.is_primary() {
        ctx.set_effects.attack_modifiers(
            &attacker.equipment,
            class,
            attacker.current_stats.hitpoint,
            attacker.base_stats.hitpoint,
        )
    } else {
        AttackModifiers::default()
    };

    let mut attack = attack_roll(attacker, class, attack_type, mods);
    let defence = defence_roll(defender, class, attack_type);
    let mut max_hit = max_hit(attacker, class, mods);
    if let Some(special) = special {
        attack = scale_percent(attack, special.accuracy_percent());
        max_hit = scale_percent(i64::from(max_hit), special.damage_percent()) as i32;
    }
    let chance = hit_chance(attack, defence);

    let protected = defender.is_protected_from(class);
    let block = ctx.config.block_percent(&weapon.name);
    let defence_bonus = defender.bonuses.defence.get(attack_type);
    let mut remaining = defender.current_stats.hitpoint.max(0);

    let swing_count = special.map_or(1, SpecialAttack::swings);
    let mut swings = Vec::with_capacity(swing_count);
    for _ in 0..swing_count {
        let hit = rng.accuracy_roll() < chance;
        let mut damage = if hit { rng.damage_roll(max_hit) } else { 0 };
        damage = ctx
            .set_effects
            .reduce_incoming(&defender.equipment, damage, defence_bonus);
        if protected {
            damage -= scale_percent(i64::from(damage), block) as i32;
        }
        damage = damage.clamp(0, ctx.config.max_hit_ceiling.min(remaining).max(0));
        remaining -= damage;
        swings.push(Swing {
            hit,
            damage,
            max_hit,
        });
    }

    let total: i32 = swings.iter().map(|s| s.damage).sum();
    let first_hit = swings.first().is_some_and(|s| s.hit);
    let effect = match (special, &weapon.kind) {
        (Some(SpecialAttack::Drain { skill, .. }), _) if total > 0 => Some(HitEffect::Drain {
            skill,
            amount: total,
        }),
        (_, WeaponKind::Magic { spell }) if first_hit && spell.freeze_ticks > 0 => {
            Some(HitEffect::Freeze(spell.freeze_ticks))
        }
        _ => None,
    };
    let delay_reduction = match special {
        Some(SpecialAttack::QuickShot {
            delay_reduction, ..
        }) => delay_reduction,
        _ => 0,
    };
    let experience = if attacker.is_primary() {
        experience::grants(class, attacker.stance, total)
    } else {
        Vec::new()
    };

    AttackOutcome {
        class,
        style: HitStyle::for_attack(class, melee_type),
        swings,
        experience,
        effect,
        delay_reduction,
        special,
    }
}

const fn accuracy_skill(class: CombatClass) -> Skill {
    match class {
        CombatClass::Melee => Skill::Attack,
        CombatClass::Ranged => Skill::Ranged,
        CombatClass::Magic => Skill::Magic,
    }
}

/// Attack roll for `attacker` using an attack of `attack_type`.
#[must_use]
pub fn attack_roll(
    attacker: &Unit,
    class: CombatClass,
    attack_type: AttackType,
    mods: AttackModifiers,
) -> i64 {
    let level = attacker.current_stats.get(accuracy_skill(class));
    let bonus = attacker.bonuses.attack.get(attack_type);
    match attacker.role {
        UnitRole::Npc => roll(npc_effective_level(level), bonus),
        UnitRole::Player => {
            let prayer = attacker.prayer_percent(|p| p.accuracy_percent(class));
            let mut stance = attacker.stance.bonus(class).attack;
            if class == CombatClass::Magic {
                stance += 1;
            }
            roll(effective_level(level, prayer, stance, mods.accuracy), bonus)
        }
    }
}

/// Defence roll for `defender` against an attack of `attack_type`.
#[must_use]
pub fn defence_roll(defender: &Unit, class: CombatClass, attack_type: AttackType) -> i64 {
    let stats = &defender.current_stats;
    let bonus = defender.bonuses.defence.get(attack_type);
    match (defender.role, class) {
        (UnitRole::Npc, CombatClass::Magic) => roll(npc_effective_level(stats.magic), bonus),
        (UnitRole::Npc, _) => roll(npc_effective_level(stats.defence), bonus),
        (UnitRole::Player, _) => {
            let stance = defender.stance.bonus(defender.class()).defence;
            let defence_prayer = defender.prayer_percent(|p| p.defence_percent());
            let level = if class == CombatClass::Magic {
                let magic_prayer = defender.prayer_percent(|p| p.magic_defence_percent());
                player_magic_defence_level(
                    stats.magic,
                    magic_prayer,
                    stats.defence,
                    defence_prayer,
                    stance,
                )
            } else {
                effective_level(stats.defence, defence_prayer, stance, 100)
            };
            roll(level, bonus)
        }
    }
}

/// Max hit of `attacker`'s current weapon.
#[must_use]
pub fn max_hit(attacker: &Unit, class: CombatClass, mods: AttackModifiers) -> i32 {
    let weapon = attacker.weapon();
    let stats = &attacker.current_stats;
    let other = &attacker.bonuses.other;
    let base = if let Some(fixed) = weapon.fixed_max_hit {
        fixed
    } else {
        match (&weapon.kind, attacker.role) {
            (WeaponKind::Magic { spell }, _) => magic_max_hit(spell.max_hit, other.magic_damage),
            (_, UnitRole::Npc) => {
                let (level, bonus) = if class == CombatClass::Ranged {
                    (stats.ranged, other.ranged_strength)
                } else {
                    (stats.strength, other.melee_strength)
                };
                strength_max_hit(npc_effective_level(level), bonus)
            }
            (_, UnitRole::Player) => {
                let (level, bonus) = if class == CombatClass::Ranged {
                    (stats.ranged, other.ranged_strength)
                } else {
                    (stats.strength, other.melee_strength)
                };
                let prayer = attacker.prayer_percent(|p| p.strength_percent(class));
                let stance = attacker.stance.bonus(class).strength;
                strength_max_hit(effective_level(level, prayer, stance, mods.strength), bonus)
            }
        }
    };
    scale_percent(i64::from(base), mods.max_hit) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::set_effects::{SetEffect, SetEffectKind};
    use crate::combat::weapons::{SpecialSpec, Spell, Weapon};
    use crate::components::{Bonuses, OtherBonuses, Prayer, Stance, Stats};
    use crate::items::EquipmentSlot;
    use crate::math::Fixed;

    /// Fixed rolls: constant accuracy, damage capped at the max hit.
    struct Rolls {
        accuracy: Fixed,
        damage: i32,
    }

    impl Rolls {
        fn always_max() -> Self {
            Self {
                accuracy: Fixed::ZERO,
                damage: i32::MAX,
            }
        }

        fn always_miss() -> Self {
            Self {
                accuracy: Fixed::ONE,
                damage: 0,
            }
        }
    }

    impl CombatRng for Rolls {
        fn accuracy_roll(&mut self) -> Fixed {
            self.accuracy
        }

        fn damage_roll(&mut self, max_hit: i32) -> i32 {
            self.damage.min(max_hit.max(0))
        }
    }

    fn whip() -> Weapon {
        Weapon {
            name: "Whip".to_string(),
            kind: WeaponKind::Melee {
                melee_type: MeleeType::Slash,
            },
            attack_speed: 4,
            range: 1,
            special: None,
            fixed_max_hit: None,
        }
    }

    fn player() -> Unit {
        let mut unit = Unit::new("Player", UnitRole::Player, Stats::uniform(99));
        unit.set_weapon(Some(whip()));
        unit
    }

    fn dummy(hitpoints: i32) -> Unit {
        let mut stats = Stats::uniform(1);
        stats.hitpoint = hitpoints;
        Unit::new("Dummy", UnitRole::Npc, stats)
    }

    fn resolve(attacker: &Unit, defender: &Unit, special: bool, rng: &mut Rolls) -> AttackOutcome {
        let config = SimulationConfig::default();
        let effects = SetEffectRegistry::new();
        let ctx = CombatContext {
            config: &config,
            set_effects: &effects,
        };
        resolve_attack(&ctx, attacker, defender, special, rng)
    }

    #[test]
    fn test_boosted_aggressive_max_hit_is_24() {
        let mut attacker = player();
        attacker.current_stats.strength = 107;
        attacker.stance = Stance::Aggressive;
        attacker.bonuses.other.melee_strength = 64;

        let outcome = resolve(&attacker, &dummy(100), false, &mut Rolls::always_max());
        assert_eq!(outcome.swings.len(), 1);
        assert_eq!(outcome.swings[0].max_hit, 24);
        assert_eq!(outcome.total_damage(), 24);
        assert_eq!(outcome.style, HitStyle::Melee(MeleeType::Slash));
    }

    #[test]
    fn test_damage_clamped_to_remaining_hitpoints() {
        let outcome = resolve(&player(), &dummy(5), false, &mut Rolls::always_max());
        assert_eq!(outcome.total_damage(), 5);
    }

    #[test]
    fn test_miss_deals_nothing_and_grants_nothing() {
        let outcome = resolve(&player(), &dummy(50), false, &mut Rolls::always_miss());
        assert!(!outcome.landed());
        assert_eq!(outcome.total_damage(), 0);
        assert!(outcome.experience.is_empty());
    }

    #[test]
    fn test_experience_for_damage() {
        let mut attacker = player();
        attacker.stance = Stance::Aggressive;
        let outcome = resolve(&attacker, &dummy(100), false, &mut Rolls::always_max());
        let damage = outcome.total_damage();
        assert!(damage > 0);
        let strength = outcome
            .experience
            .iter()
            .find(|g| g.skill == Skill::Strength)
            .map(|g| g.amount);
        assert_eq!(strength, Some(Fixed::from_num(damage * 4)));
    }

    #[test]
    fn test_protection_prayer_blocks_matching_style() {
        let mut defender = dummy(100);
        defender.prayers.insert(Prayer::ProtectFromMelee);
        let outcome = resolve(&player(), &defender, false, &mut Rolls::always_max());
        assert!(outcome.landed());
        assert_eq!(outcome.total_damage(), 0);
    }

    #[test]
    fn test_protection_override_blocks_partially() {
        let mut config = SimulationConfig::default();
        config.protection_overrides.insert("Whip".to_string(), 50);
        let effects = SetEffectRegistry::new();
        let ctx = CombatContext {
            config: &config,
            set_effects: &effects,
        };
        let mut attacker = player();
        attacker.bonuses.other.melee_strength = 64;
        let mut defender = dummy(100);
        defender.prayers.insert(Prayer::ProtectFromMelee);
        let outcome = resolve_attack(&ctx, &attacker, &defender, false, &mut Rolls::always_max());
        // Accurate stance: (99 + 8) * 128 + 320 / 640 = 21, half blocked.
        assert_eq!(outcome.swings[0].max_hit, 21);
        assert_eq!(outcome.total_damage(), 11);
    }

    #[test]
    fn test_double_hit_special_clamps_total() {
        let mut attacker = player();
        let mut dagger = whip();
        dagger.special = Some(SpecialSpec {
            energy_cost: 25,
            attack: SpecialAttack::DoubleHit {
                accuracy: 115,
                damage: 115,
            },
        });
        attacker.set_weapon(Some(dagger));
        // Max hit floor(11 * 1.15) = 12; the second swing is cut to 8.
        let outcome = resolve(&attacker, &dummy(20), true, &mut Rolls::always_max());
        assert_eq!(outcome.swings.len(), 2);
        assert_eq!(outcome.swings[0].damage, 12);
        assert_eq!(outcome.swings[1].damage, 8);
        assert_eq!(outcome.total_damage(), 20);
        assert!(outcome.special.is_some());
    }

    #[test]
    fn test_drain_special_carries_effect() {
        let mut attacker = player();
        let mut godsword = whip();
        godsword.special = Some(SpecialSpec {
            energy_cost: 50,
            attack: SpecialAttack::Drain {
                skill: Skill::Defence,
                accuracy: 200,
                damage: 121,
            },
        });
        attacker.set_weapon(Some(godsword));
        let outcome = resolve(&attacker, &dummy(100), true, &mut Rolls::always_max());
        assert_eq!(
            outcome.effect,
            Some(HitEffect::Drain {
                skill: Skill::Defence,
                amount: outcome.total_damage(),
            })
        );
    }

    #[test]
    fn test_freeze_only_on_hit() {
        let mut attacker = player();
        attacker.set_weapon(Some(Weapon {
            name: "Ancient staff".to_string(),
            kind: WeaponKind::Magic {
                spell: Spell {
                    name: "Ice Barrage".to_string(),
                    max_hit: 30,
                    freeze_ticks: 32,
                },
            },
            attack_speed: 5,
            range: 10,
            special: None,
            fixed_max_hit: None,
        }));
        assert_eq!(attacker.stance, Stance::Autocast);

        let hit = resolve(&attacker, &dummy(100), false, &mut Rolls::always_max());
        assert_eq!(hit.effect, Some(HitEffect::Freeze(32)));
        assert_eq!(hit.swings[0].max_hit, 30);
        assert_eq!(hit.style, HitStyle::Magic);

        let splash = resolve(&attacker, &dummy(100), false, &mut Rolls::always_miss());
        assert_eq!(splash.effect, None);
    }

    #[test]
    fn test_npc_fixed_max_hit() {
        let mut npc = dummy(50);
        let mut claws = whip();
        claws.fixed_max_hit = Some(13);
        npc.set_weapon(Some(claws));
        let outcome = resolve(&npc, &player(), false, &mut Rolls::always_max());
        assert_eq!(outcome.swings[0].max_hit, 13);
        assert!(outcome.experience.is_empty());
    }

    #[test]
    fn test_void_raises_max_hit() {
        let mut attacker = player();
        attacker.bonuses = Bonuses {
            other: OtherBonuses {
                melee_strength: 64,
                ..Default::default()
            },
            ..Default::default()
        };
        for (slot, id) in [
            (EquipmentSlot::Head, 1),
            (EquipmentSlot::Body, 2),
            (EquipmentSlot::Legs, 3),
        ] {
            attacker.equipment.equip(slot, id);
        }
        let config = SimulationConfig::default();
        let effects: SetEffectRegistry = [SetEffect {
            name: "Void".to_string(),
            items: vec![1, 2, 3],
            kind: SetEffectKind::VoidMelee,
        }]
        .into_iter()
        .collect();
        let ctx = CombatContext {
            config: &config,
            set_effects: &effects,
        };
        let outcome = resolve_attack(&ctx, &attacker, &dummy(100), false, &mut Rolls::always_max());
        // floor(107 * 1.1) = 117; (117 * 128 + 320) / 640 = 23
        assert_eq!(outcome.swings[0].max_hit, 23);
    }
}
