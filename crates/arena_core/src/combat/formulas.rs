//! Accuracy and max-hit formulas.
//!
//! All arithmetic is integer with floor division; only the final hit
//! chance becomes a [`Fixed`] fraction.

use crate::math::{scale_percent, Fixed};

/// Added to every player effective level.
pub const PLAYER_LEVEL_OFFSET: i64 = 8;

/// Added to NPC levels in place of stance and prayer.
pub const NPC_LEVEL_OFFSET: i64 = 9;

/// Added to every equipment bonus before it multiplies a level.
pub const BONUS_OFFSET: i64 = 64;

/// Player effective level.
///
/// `floor(level * prayer%) + stance + offset`, then scaled by a gear
/// multiplier such as void.
#[must_use]
pub fn effective_level(level: i32, prayer_percent: i64, stance: i64, gear_percent: i64) -> i64 {
    let prayed = scale_percent(i64::from(level), prayer_percent);
    scale_percent(prayed + stance + PLAYER_LEVEL_OFFSET, gear_percent)
}

/// NPC effective level.
#[must_use]
pub fn npc_effective_level(level: i32) -> i64 {
    i64::from(level) + NPC_LEVEL_OFFSET
}

/// Attack or defence roll from an effective level and an equipment bonus.
#[must_use]
pub fn roll(effective_level: i64, bonus: i32) -> i64 {
    effective_level.max(0) * (i64::from(bonus) + BONUS_OFFSET).max(0)
}

/// Effective magic defence level for a player.
///
/// Seventy percent magic, thirty percent defence.
#[must_use]
pub fn player_magic_defence_level(
    magic: i32,
    magic_prayer_percent: i64,
    defence: i32,
    defence_prayer_percent: i64,
    stance: i64,
) -> i64 {
    let magic = scale_percent(i64::from(magic), magic_prayer_percent);
    let defence = scale_percent(i64::from(defence), defence_prayer_percent);
    magic * 7 / 10 + defence * 3 / 10 + stance + PLAYER_LEVEL_OFFSET
}

/// Chance that an attack roll beats a defence roll.
#[must_use]
pub fn hit_chance(attack_roll: i64, defence_roll: i64) -> Fixed {
    let attack = attack_roll.max(0);
    let defence = defence_roll.max(0);
    if attack > defence {
        let num = Fixed::saturating_from_num(defence + 2);
        let den = Fixed::saturating_from_num(2 * attack + 1);
        Fixed::ONE - num / den
    } else {
        let num = Fixed::saturating_from_num(attack);
        let den = Fixed::saturating_from_num(2 * defence + 1);
        num / den
    }
}

/// Max hit from an effective strength level and a strength bonus.
#[must_use]
pub fn strength_max_hit(effective_strength: i64, strength_bonus: i32) -> i32 {
    let raw = (effective_strength.max(0) * (i64::from(strength_bonus) + BONUS_OFFSET).max(0) + 320)
        / 640;
    i32::try_from(raw).unwrap_or(i32::MAX)
}

/// Spell max hit with a percentage magic damage bonus.
#[must_use]
pub fn magic_max_hit(spell_max_hit: i32, magic_damage_percent: i32) -> i32 {
    let raw = scale_percent(
        i64::from(spell_max_hit),
        100 + i64::from(magic_damage_percent),
    );
    i32::try_from(raw).unwrap_or(i32::MAX)
}
