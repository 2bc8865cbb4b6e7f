//! Test fixtures and helpers.
//!
//! Pre-built maps, weapons, units and content tables for consistent
//! testing.

use arena_core::combat::set_effects::{SetEffect, SetEffectKind, SetEffectRegistry};
use arena_core::combat::weapons::{SpecialAttack, SpecialSpec, Spell, Weapon, WeaponKind};
use arena_core::components::{
    Bonuses, MeleeType, OtherBonuses, Skill, Stats, StyleBonuses, UnitRole,
};
use arena_core::config::SimulationConfig;
use arena_core::grid::GridMap;
use arena_core::items::{EquipmentSlot, ItemDef, ItemId, ItemTable};
use arena_core::math::TilePos;
use arena_core::simulation::{Simulation, UnitSpawnParams};
use arena_core::world::EntityId;

/// Item id of the fixture whip.
pub const WHIP: ItemId = 4151;
/// Item id of the fixture recoil ring.
pub const RECOIL_RING: ItemId = 2550;
/// Item id of the fixture dagger.
pub const DAGGER: ItemId = 5698;

/// Open square map with its south-west corner at the origin.
#[must_use]
pub fn open_arena(side: i32) -> GridMap {
    GridMap::filled(TilePos::new(0, 0), side, side)
}

/// Simulation over an open square map with a seed.
#[must_use]
pub fn arena_sim(side: i32, seed: u64) -> Simulation {
    let config = SimulationConfig {
        seed,
        ..SimulationConfig::default()
    };
    Simulation::new(open_arena(side), config).with_content(item_table(), set_effects())
}

/// Slash weapon with a stab special.
#[must_use]
pub fn whip() -> Weapon {
    Weapon {
        name: "Abyssal whip".to_string(),
        kind: WeaponKind::Melee {
            melee_type: MeleeType::Slash,
        },
        attack_speed: 4,
        range: 1,
        special: Some(SpecialSpec {
            energy_cost: 50,
            attack: SpecialAttack::Boosted {
                accuracy: 125,
                damage: 100,
            },
        }),
        fixed_max_hit: None,
    }
}

/// Fast stab weapon with a double-hit special.
#[must_use]
pub fn dagger() -> Weapon {
    Weapon {
        name: "Dragon dagger".to_string(),
        kind: WeaponKind::Melee {
            melee_type: MeleeType::Stab,
        },
        attack_speed: 4,
        range: 1,
        special: Some(SpecialSpec {
            energy_cost: 25,
            attack: SpecialAttack::DoubleHit {
                accuracy: 115,
                damage: 115,
            },
        }),
        fixed_max_hit: None,
    }
}

/// Ranged weapon.
#[must_use]
pub fn shortbow() -> Weapon {
    Weapon {
        name: "Magic shortbow".to_string(),
        kind: WeaponKind::Ranged,
        attack_speed: 4,
        range: 7,
        special: None,
        fixed_max_hit: None,
    }
}

/// Staff casting a freezing spell.
#[must_use]
pub fn ice_staff() -> Weapon {
    Weapon {
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
    }
}

/// NPC weapon with a fixed max hit.
#[must_use]
pub fn npc_claws(max_hit: i32) -> Weapon {
    Weapon {
        name: "Claws".to_string(),
        kind: WeaponKind::Melee {
            melee_type: MeleeType::Slash,
        },
        attack_speed: 4,
        range: 1,
        special: None,
        fixed_max_hit: Some(max_hit),
    }
}

/// A small item table: whip, dagger, recoil ring.
#[must_use]
pub fn item_table() -> ItemTable {
    [
        ItemDef {
            id: WHIP,
            name: "Abyssal whip".to_string(),
            slot: EquipmentSlot::Weapon,
            bonuses: Bonuses {
                attack: StyleBonuses {
                    slash: 82,
                    ..StyleBonuses::default()
                },
                other: OtherBonuses {
                    melee_strength: 82,
                    ..OtherBonuses::default()
                },
                ..Bonuses::default()
            },
            weapon: Some(whip()),
        },
        ItemDef {
            id: DAGGER,
            name: "Dragon dagger".to_string(),
            slot: EquipmentSlot::Weapon,
            bonuses: Bonuses {
                attack: StyleBonuses {
                    stab: 40,
                    slash: 25,
                    ..StyleBonuses::default()
                },
                ..Bonuses::default()
            },
            weapon: Some(dagger()),
        },
        ItemDef {
            id: RECOIL_RING,
            name: "Ring of recoil".to_string(),
            slot: EquipmentSlot::Ring,
            bonuses: Bonuses::default(),
            weapon: None,
        },
    ]
    .into_iter()
    .collect()
}

/// Set effects for the fixture items.
#[must_use]
pub fn set_effects() -> SetEffectRegistry {
    [SetEffect {
        name: "Ring of recoil".to_string(),
        items: vec![RECOIL_RING],
        kind: SetEffectKind::Recoil { percent: 10 },
    }]
    .into_iter()
    .collect()
}

/// Spawn parameters for a maxed player.
#[must_use]
pub fn player_params(position: TilePos) -> UnitSpawnParams {
    UnitSpawnParams {
        name: "Player".to_string(),
        role: UnitRole::Player,
        position,
        stats: Stats::uniform(99),
        ..Default::default()
    }
}

/// Spawn parameters for an NPC with the given hitpoints and weapon.
#[must_use]
pub fn npc_params(position: TilePos, hitpoints: i32, weapon: Weapon) -> UnitSpawnParams {
    let mut stats = Stats::uniform(50);
    *stats.get_mut(Skill::Hitpoint) = hitpoints;
    UnitSpawnParams {
        name: "Npc".to_string(),
        role: UnitRole::Npc,
        position,
        stats,
        weapon: Some(weapon),
        ..Default::default()
    }
}

/// A player and an NPC attacking each other on an open map.
///
/// Returns the simulation and the (player, npc) ids.
#[must_use]
pub fn duel(seed: u64) -> (Simulation, EntityId, EntityId) {
    let mut sim = arena_sim(20, seed);
    let mut player = player_params(TilePos::new(2, 2));
    player.weapon = Some(whip());
    let player = sim.spawn_unit(player);
    let npc = sim.spawn_unit(npc_params(TilePos::new(8, 8), 120, npc_claws(12)));
    // Orders on freshly spawned live units cannot fail.
    let _ = sim.set_aggro(player, Some(npc));
    let _ = sim.set_aggro(npc, Some(player));
    (sim, player, npc)
}
