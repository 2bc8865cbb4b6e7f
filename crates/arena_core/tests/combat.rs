//! Property tests for combat resolution.

use arena_core::combat::formulas::{hit_chance, strength_max_hit};
use arena_core::combat::set_effects::SetEffectRegistry;
use arena_core::combat::{resolve_attack, CombatContext};
use arena_core::components::{CombatClass, Prayer, Stats, UnitRole};
use arena_core::config::SimulationConfig;
use arena_core::math::Fixed;
use arena_core::rng::SimRng;
use arena_core::unit::Unit;
use arena_test_utils::determinism::strategies::{arb_bonus, arb_seed, arb_stats};
use arena_test_utils::fixtures::{dagger, ice_staff, shortbow, whip};
use arena_test_utils::scripted_rng::ScriptedRng;
use proptest::prelude::*;

fn armed(stats: Stats, bonus: i32, index: usize) -> Unit {
    let mut unit = Unit::new("Attacker", UnitRole::Player, stats);
    unit.bonuses.attack.stab = bonus;
    unit.bonuses.attack.slash = bonus;
    unit.bonuses.attack.ranged = bonus;
    unit.bonuses.attack.magic = bonus;
    unit.bonuses.other.melee_strength = bonus;
    unit.bonuses.other.ranged_strength = bonus;
    let weapon = match index % 4 {
        0 => whip(),
        1 => dagger(),
        2 => shortbow(),
        _ => ice_staff(),
    };
    unit.set_weapon(Some(weapon));
    unit
}

proptest! {
    #[test]
    fn test_hit_chance_is_a_probability(att in 0i64..10_000_000, def in 0i64..10_000_000) {
        let chance = hit_chance(att, def);
        prop_assert!(chance >= Fixed::ZERO);
        prop_assert!(chance <= Fixed::ONE);
    }

    #[test]
    fn test_hit_chance_grows_with_attack(
        att in 0i64..1_000_000,
        extra in 0i64..1_000_000,
        def in 0i64..1_000_000,
    ) {
        prop_assert!(hit_chance(att, def) <= hit_chance(att + extra, def));
        prop_assert!(hit_chance(att, def + extra) <= hit_chance(att, def));
    }

    #[test]
    fn test_max_hit_grows_with_bonus(level in 0i64..200, bonus in arb_bonus(), extra in 0i32..100) {
        prop_assert!(strength_max_hit(level, bonus) <= strength_max_hit(level, bonus + extra));
        prop_assert!(strength_max_hit(level, bonus) >= 0);
    }

    #[test]
    fn test_damage_never_exceeds_hitpoints(
        attacker_stats in arb_stats(),
        defender_stats in arb_stats(),
        bonus in arb_bonus(),
        weapon in 0usize..4,
        special in any::<bool>(),
        seed in arb_seed(),
    ) {
        let attacker = armed(attacker_stats, bonus, weapon);
        let defender = Unit::new("Defender", UnitRole::Npc, defender_stats);
        let config = SimulationConfig::default();
        let set_effects = SetEffectRegistry::new();
        let ctx = CombatContext { config: &config, set_effects: &set_effects };
        let mut rng = SimRng::from_seed(seed);

        let outcome = resolve_attack(&ctx, &attacker, &defender, special, &mut rng);
        prop_assert!(outcome.total_damage() <= defender_stats.hitpoint);
        for swing in &outcome.swings {
            prop_assert!(swing.damage >= 0);
            prop_assert!(swing.damage <= swing.max_hit.max(0));
            prop_assert!(swing.hit || swing.damage == 0);
        }
    }

    #[test]
    fn test_full_protection_blocks_everything(
        attacker_stats in arb_stats(),
        weapon in 0usize..4,
    ) {
        let attacker = armed(attacker_stats, 50, weapon);
        let mut defender = Unit::new("Defender", UnitRole::Player, Stats::uniform(99));
        let protection = match attacker.class() {
            CombatClass::Melee => Prayer::ProtectFromMelee,
            CombatClass::Ranged => Prayer::ProtectFromMissiles,
            CombatClass::Magic => Prayer::ProtectFromMagic,
        };
        defender.prayers.insert(protection);

        let config = SimulationConfig::default();
        let set_effects = SetEffectRegistry::new();
        let ctx = CombatContext { config: &config, set_effects: &set_effects };
        let outcome = resolve_attack(&ctx, &attacker, &defender, false, &mut ScriptedRng::always_max());
        prop_assert_eq!(outcome.total_damage(), 0);
    }
}

#[test]
fn test_scripted_double_hit() {
    let attacker = armed(Stats::uniform(99), 0, 1);
    let defender = Unit::new("Dummy", UnitRole::Npc, Stats::uniform(99));
    let config = SimulationConfig::default();
    let set_effects = SetEffectRegistry::new();
    let ctx = CombatContext {
        config: &config,
        set_effects: &set_effects,
    };
    let mut rng = ScriptedRng::always_max()
        .with_accuracy([Fixed::ZERO, Fixed::ONE])
        .with_damage([4]);

    let outcome = resolve_attack(&ctx, &attacker, &defender, true, &mut rng);
    assert_eq!(outcome.swings.len(), 2);
    assert!(outcome.swings[0].hit);
    assert_eq!(outcome.swings[0].damage, 4);
    assert!(!outcome.swings[1].hit);
    assert_eq!(outcome.total_damage(), 4);
    assert_eq!(rng.remaining(), (0, 0));
}
