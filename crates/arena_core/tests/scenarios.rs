//! End-to-end scenarios driven through the public simulation API.

use arena_core::config::SimulationConfig;
use arena_core::grid::{GridMap, Tile};
use arena_core::items::{Equipment, EquipmentSlot};
use arena_core::math::TilePos;
use arena_core::projectile::HitStyle;
use arena_core::simulation::{BlockerSpawnParams, Simulation};
use arena_test_utils::determinism::step;
use arena_test_utils::fixtures::{
    arena_sim, duel, ice_staff, item_table, npc_claws, npc_params, player_params, set_effects,
    shortbow, RECOIL_RING, WHIP,
};

#[test]
fn test_duel_ends_in_a_death() {
    let (mut sim, player, npc) = duel(11);
    let mut deaths = Vec::new();
    for _ in 0..1000 {
        let events = sim.tick().unwrap();
        deaths.extend(events.deaths);
        if !deaths.is_empty() {
            break;
        }
    }
    assert_eq!(deaths.len(), 1);
    assert!(deaths[0] == player || deaths[0] == npc);
}

#[test]
fn test_player_ranged_delay_includes_extra_tick() {
    let mut sim = arena_sim(20, 1);
    let mut params = player_params(TilePos::new(0, 0));
    params.weapon = Some(shortbow());
    let player = sim.spawn_unit(params);
    let target = sim.spawn_unit(npc_params(TilePos::new(5, 0), 200, npc_claws(1)));
    sim.set_auto_retaliate(target, false).unwrap();
    sim.set_aggro(player, Some(target)).unwrap();

    let events = sim.tick().unwrap();
    assert_eq!(events.attacks.len(), 1);
    // Gap 5 from a player: 1 + (3 + 5) / 6 + 1.
    assert_eq!(events.attacks[0].delay, 3);

    let mut landed_on = None;
    for _ in 0..5 {
        let events = sim.tick().unwrap();
        if events.hits.iter().any(|h| h.source == player) {
            landed_on = Some(events.tick);
            break;
        }
    }
    assert_eq!(landed_on, Some(3));
}

#[test]
fn test_freeze_holds_target_in_place() {
    let mut sim = arena_sim(20, 5);
    let mut params = player_params(TilePos::new(2, 2));
    params.weapon = Some(ice_staff());
    let player = sim.spawn_unit(params);
    let npc = sim.spawn_unit(npc_params(TilePos::new(10, 2), 250, npc_claws(1)));
    sim.set_aggro(player, Some(npc)).unwrap();

    let mut froze = false;
    for _ in 0..300 {
        let before = sim.snapshot(npc).unwrap();
        step(&mut sim);
        let after = sim.snapshot(npc).unwrap();
        if before.frozen_ticks > 0 {
            froze = true;
            assert_eq!(before.position, after.position);
        }
        if froze && after.frozen_ticks == 0 {
            break;
        }
    }
    assert!(froze);
}

#[test]
fn test_recoil_reflects_damage() {
    let mut sim = arena_sim(20, 8);
    let mut equipment = Equipment::new();
    equipment.equip(EquipmentSlot::Ring, RECOIL_RING);
    let mut params = player_params(TilePos::new(4, 4));
    params.equipment = equipment;
    let player = sim.spawn_unit(params);
    let npc = sim.spawn_unit(npc_params(TilePos::new(5, 4), 250, npc_claws(20)));
    sim.set_auto_retaliate(player, false).unwrap();
    sim.set_aggro(npc, Some(player)).unwrap();

    for _ in 0..200 {
        let events = sim.tick().unwrap();
        let taken: Vec<_> = events
            .hits
            .iter()
            .filter(|h| h.target == player && h.amount > 0)
            .collect();
        if let Some(hit) = taken.first() {
            let recoil = events
                .hits
                .iter()
                .find(|h| h.style == HitStyle::Recoil)
                .unwrap();
            assert_eq!(recoil.source, player);
            assert_eq!(recoil.target, npc);
            assert_eq!(recoil.amount, hit.amount / 10 + 1);
            return;
        }
    }
    panic!("npc never damaged the player");
}

#[test]
fn test_equipment_change_updates_weapon() {
    let mut sim = arena_sim(10, 0);
    let player = sim.spawn_unit(player_params(TilePos::new(0, 0)));
    assert_eq!(sim.unit(player).unwrap().weapon().name, "Unarmed");

    let mut equipment = Equipment::new();
    equipment.equip(EquipmentSlot::Weapon, WHIP);
    sim.equipment_changed(player, equipment).unwrap();
    let unit = sim.unit(player).unwrap();
    assert_eq!(unit.weapon().name, "Abyssal whip");
    assert_eq!(unit.bonuses.attack.slash, 82);

    sim.equipment_changed(player, Equipment::new()).unwrap();
    assert_eq!(sim.unit(player).unwrap().bonuses.attack.slash, 0);
}

#[test]
fn test_npc_held_by_wall_without_search() {
    let mut grid = GridMap::filled(TilePos::new(0, 0), 12, 12);
    grid.fill_rect(TilePos::new(5, 0), 1, 11, Tile::WALL);
    let mut sim = Simulation::new(grid, SimulationConfig::default())
        .with_content(item_table(), set_effects());
    let player = sim.spawn_unit(player_params(TilePos::new(2, 5)));
    let npc = sim.spawn_unit(npc_params(TilePos::new(8, 5), 50, npc_claws(5)));
    sim.set_aggro(npc, Some(player)).unwrap();

    for _ in 0..10 {
        step(&mut sim);
    }
    // Greedy steps west until the wall stops it.
    assert_eq!(sim.entity(npc).unwrap().position, TilePos::new(6, 5));
}

#[test]
fn test_pillar_blocks_until_it_expires() {
    let mut sim = arena_sim(10, 0);
    let player = sim.spawn_unit(player_params(TilePos::new(0, 0)));
    let pillar = sim.spawn_blocker(BlockerSpawnParams {
        position: TilePos::new(3, 0),
        size: 1,
        lifetime: Some(3),
        ..Default::default()
    });
    sim.set_running(player, false).unwrap();

    // A blocked destination gives no path at all.
    sim.request_move(player, TilePos::new(3, 0)).unwrap();
    step(&mut sim);
    assert_eq!(sim.entity(player).unwrap().position, TilePos::new(0, 0));
    assert_eq!(sim.unit(player).unwrap().destination, None);

    step(&mut sim);
    let events = sim.tick().unwrap();
    assert_eq!(events.removed, vec![pillar]);

    sim.request_move(player, TilePos::new(3, 0)).unwrap();
    for _ in 0..3 {
        step(&mut sim);
    }
    assert_eq!(sim.entity(player).unwrap().position, TilePos::new(3, 0));
}
