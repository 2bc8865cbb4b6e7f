//! Combat rolls that follow a script.
//!
//! Lets tests pin down exact hit and damage outcomes without searching
//! for a lucky seed.

use std::collections::VecDeque;

use arena_core::math::Fixed;
use arena_core::rng::CombatRng;

/// A [`CombatRng`] that replays queued rolls.
///
/// When a queue runs dry the fallback is used: accuracy rolls return
/// `fallback_accuracy`, damage rolls return the max hit.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    accuracy: VecDeque<Fixed>,
    damage: VecDeque<i32>,
    fallback_accuracy: Fixed,
}

impl ScriptedRng {
    /// Every attack hits for its max hit.
    #[must_use]
    pub fn always_max() -> Self {
        Self {
            accuracy: VecDeque::new(),
            damage: VecDeque::new(),
            fallback_accuracy: Fixed::ZERO,
        }
    }

    /// Every attack misses.
    #[must_use]
    pub fn always_miss() -> Self {
        Self {
            fallback_accuracy: Fixed::ONE,
            ..Self::always_max()
        }
    }

    /// Queue accuracy rolls in `[0, 1)`.
    #[must_use]
    pub fn with_accuracy(mut self, rolls: impl IntoIterator<Item = Fixed>) -> Self {
        self.accuracy.extend(rolls);
        self
    }

    /// Queue damage rolls. Each is clamped to the max hit when used.
    #[must_use]
    pub fn with_damage(mut self, rolls: impl IntoIterator<Item = i32>) -> Self {
        self.damage.extend(rolls);
        self
    }

    /// Rolls still queued, as (accuracy, damage).
    #[must_use]
    pub fn remaining(&self) -> (usize, usize) {
        (self.accuracy.len(), self.damage.len())
    }
}

impl CombatRng for ScriptedRng {
    fn accuracy_roll(&mut self) -> Fixed {
        self.accuracy.pop_front().unwrap_or(self.fallback_accuracy)
    }

    fn damage_roll(&mut self, max_hit: i32) -> i32 {
        let max_hit = max_hit.max(0);
        self.damage
            .pop_front()
            .map_or(max_hit, |roll| roll.clamp(0, max_hit))
    }
}
