//! Experience awarded for damage dealt.
//!
//! The attacker's stance and weapon class select a row of
//! (skill, multiplier) pairs. Each multiplier is an exact fraction so
//! awards never drift.

use crate::components::{CombatClass, Skill, Stance};
use crate::math::Fixed;

/// Experience per point of damage, as `num / den`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpRate {
    /// Numerator.
    pub num: i64,
    /// Denominator.
    pub den: i64,
}

impl XpRate {
    const fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// Experience for `damage` at this rate.
    #[must_use]
    pub fn award(self, damage: i32) -> Fixed {
        Fixed::saturating_from_num(i64::from(damage) * self.num) / Fixed::from_num(self.den)
    }
}

const FOUR: XpRate = XpRate::new(4, 1);
const TWO: XpRate = XpRate::new(2, 1);
const ONE: XpRate = XpRate::new(1, 1);
const HITPOINTS: XpRate = XpRate::new(133, 100);

/// Experience awarded to one skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpGrant {
    /// Skill receiving experience.
    pub skill: Skill,
    /// Amount awarded.
    pub amount: Fixed,
}

/// Skill multipliers for a stance and weapon class.
///
/// A stance the class does not offer falls back to the class default.
#[must_use]
pub fn rates(class: CombatClass, stance: Stance) -> &'static [(Skill, XpRate)] {
    let stance = if Stance::offered_by(class).contains(&stance) {
        stance
    } else {
        Stance::default_for(class)
    };
    match (class, stance) {
        (CombatClass::Melee, Stance::Aggressive) => {
            &[(Skill::Strength, FOUR), (Skill::Hitpoint, HITPOINTS)]
        }
        (CombatClass::Melee, Stance::Defensive) => {
            &[(Skill::Defence, FOUR), (Skill::Hitpoint, HITPOINTS)]
        }
        (CombatClass::Melee, Stance::Controlled) => &[
            (Skill::Attack, HITPOINTS),
            (Skill::Strength, HITPOINTS),
            (Skill::Defence, HITPOINTS),
            (Skill::Hitpoint, HITPOINTS),
        ],
        (CombatClass::Melee, _) => &[(Skill::Attack, FOUR), (Skill::Hitpoint, HITPOINTS)],
        (CombatClass::Ranged, Stance::Longrange) => &[
            (Skill::Ranged, TWO),
            (Skill::Defence, TWO),
            (Skill::Hitpoint, HITPOINTS),
        ],
        (CombatClass::Ranged, _) => &[(Skill::Ranged, FOUR), (Skill::Hitpoint, HITPOINTS)],
        (CombatClass::Magic, Stance::DefensiveAutocast) => &[
            (Skill::Magic, HITPOINTS),
            (Skill::Defence, ONE),
            (Skill::Hitpoint, HITPOINTS),
        ],
        (CombatClass::Magic, _) => &[(Skill::Magic, TWO), (Skill::Hitpoint, HITPOINTS)],
    }
}

/// Experience grants for dealing `damage`. Nothing is granted for zero damage.
#[must_use]
pub fn grants(class: CombatClass, stance: Stance, damage: i32) -> Vec<XpGrant> {
    if damage <= 0 {
        return Vec::new();
    }
    rates(class, stance)
        .iter()
        .map(|&(skill, rate)| XpGrant {
            skill,
            amount: rate.award(damage),
        })
        .collect()
}
