//! Simulation tuning.
//!
//! Every constant that shapes a run lives here so scenarios can override
//! it. Defaults reproduce standard game behaviour.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default tick length in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 600;

/// Default cap on nodes explored by one path search.
pub const DEFAULT_MAX_EXPLORED: usize = 1000;

/// Default half-width of the window searched for a backup tile.
pub const DEFAULT_BACKUP_RADIUS: i32 = 10;

/// Tunable simulation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock length of one tick.
    pub tick_ms: u64,
    /// Seed for the combat RNG.
    pub seed: u64,
    /// Nodes a path search may explore before giving up.
    pub max_explored_nodes: usize,
    /// Backup tiles are searched within this many tiles of the destination.
    pub backup_radius: i32,
    /// Upper bound on damage from a single swing.
    pub max_hit_ceiling: i32,
    /// Ticks between special attack energy regeneration steps.
    pub special_regen_ticks: u32,
    /// Energy restored per regeneration step.
    pub special_regen_amount: u32,
    /// Death animation length for units that do not set their own.
    pub default_death_ticks: u32,
    /// Percent of damage blocked by a matching protection prayer.
    pub protection_block_percent: i64,
    /// Per-weapon overrides of the block percent, keyed by weapon name.
    pub protection_overrides: BTreeMap<String, i64>,
}

impl SimulationConfig {
    /// Percent of damage a matching protection prayer blocks against `weapon`.
    #[must_use]
    pub fn block_percent(&self, weapon: &str) -> i64 {
        self.protection_overrides
            .get(weapon)
            .copied()
            .unwrap_or(self.protection_block_percent)
            .clamp(0, 100)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            seed: 0,
            max_explored_nodes: DEFAULT_MAX_EXPLORED,
            backup_radius: DEFAULT_BACKUP_RADIUS,
            max_hit_ceiling: 200,
            special_regen_ticks: 50,
            special_regen_amount: 10,
            default_death_ticks: 4,
            protection_block_percent: 100,
            protection_overrides: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_percent_overrides() {
        let mut config = SimulationConfig::default();
        config
            .protection_overrides
            .insert("Zuk slam".to_string(), 50);
        assert_eq!(config.block_percent("Zuk slam"), 50);
        assert_eq!(config.block_percent("Whip"), 100);
    }

    #[test]
    fn test_block_percent_is_clamped() {
        let mut config = SimulationConfig::default();
        config.protection_overrides.insert("Odd".to_string(), 250);
        assert_eq!(config.block_percent("Odd"), 100);
    }
}
