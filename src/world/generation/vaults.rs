//! Vault placement
//!
//! A vault is a small single-entrance room whose access is deliberately
//! gated. Candidates come from the region finder; each converted vault gets
//! a secret door, a key-locked door, or a trigger-raised portcullis. Key and
//! trigger cells are verified reachable from the level entrance without
//! passing the vault's own door, so a keyed vault is always solvable.

use rand::rngs::StdRng;
use rand::Rng;

use crate::data::WorldConfig;
use crate::game::objects::{ActorSpec, ItemSpec, Loc, ObjectDb};
use crate::world::map::{Map, Position};
use crate::world::pathfinding::{dijkstra_map, CostTable, DistanceField};
use crate::world::region::{find_regions, Region};
use crate::world::tile::{Tile, TileKind, TileType, VaultMaterial};

/// The gating mechanism chosen for a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultMechanism {
    Secret,
    Keyed(VaultMaterial),
    Trigger,
}

#[derive(Debug, Clone)]
pub struct Vault {
    pub region: Region,
    pub entrance: Position,
    pub mechanism: VaultMechanism,
    pub key_loc: Option<Position>,
    pub trigger_loc: Option<Position>,
}

/// Largest region that still counts as a vault.
const MAX_VAULT_CELLS: usize = 75;
/// A candidate needs this many cells with all eight neighbors in the room.
const MIN_INTERIOR_CELLS: usize = 12;

fn plain_floor(t: &Tile) -> bool {
    matches!(t.kind(), TileKind::Floor | TileKind::Rubble | TileKind::Bones)
}

/// Rooms that could become vaults: small, properly interior, and with
/// exactly one door in their walls. Doors are not passable to this fill, so
/// each doored room is its own region.
pub fn find_candidates(map: &Map) -> Vec<(Region, Position)> {
    find_regions(map, &plain_floor, None)
        .into_iter()
        .filter(|r| r.len() <= MAX_VAULT_CELLS)
        .filter(|r| r.interior_cells().len() >= MIN_INTERIOR_CELLS)
        .filter_map(|r| {
            let doors = r.adjacent_doors(map);
            match doors.as_slice() {
                [door] => Some((r.clone(), *door)),
                _ => None,
            }
        })
        .collect()
}

/// Convert candidate rooms into vaults. At most one vault on the entrance
/// level so the player can never spawn walled in; at most `cfg.vault_cap`
/// elsewhere. Every skipped or degraded vault is silent.
pub fn place_vaults(
    map: &mut Map,
    rng: &mut StdRng,
    dungeon_id: u32,
    level_ix: usize,
    level_entrance: Position,
    objects: &mut ObjectDb,
    cfg: &WorldConfig,
) -> Vec<Vault> {
    let cap = if level_ix == 0 { 1 } else { cfg.vault_cap };
    let candidates = find_candidates(map);
    let mut vaults = Vec::new();

    for (region, door) in candidates {
        if vaults.len() >= cap {
            break;
        }
        if region.contains(level_entrance) {
            continue;
        }
        if !rng.gen_bool(cfg.vault_chance) {
            continue;
        }

        let mechanism = match rng.gen_range(0..3) {
            0 => VaultMechanism::Secret,
            1 => {
                let material = match rng.gen_range(0..3) {
                    0 => VaultMaterial::Iron,
                    1 => VaultMaterial::Bronze,
                    _ => VaultMaterial::Stone,
                };
                VaultMechanism::Keyed(material)
            }
            _ => VaultMechanism::Trigger,
        };

        let vault = build_vault(
            map,
            rng,
            dungeon_id,
            level_ix,
            level_entrance,
            region,
            door,
            mechanism,
            objects,
            cfg,
        );
        vaults.push(vault);
    }

    vaults
}

/// Apply one mechanism to one candidate, degrading to a secret door when
/// the stronger mechanism has nowhere valid to put its key or trigger.
#[allow(clippy::too_many_arguments)]
fn build_vault(
    map: &mut Map,
    rng: &mut StdRng,
    dungeon_id: u32,
    level_ix: usize,
    level_entrance: Position,
    region: Region,
    door: Position,
    mechanism: VaultMechanism,
    objects: &mut ObjectDb,
    cfg: &WorldConfig,
) -> Vault {
    let mut key_loc = None;
    let mut trigger_loc = None;

    let mechanism = match mechanism {
        VaultMechanism::Secret => {
            map.set_tile(door.x, door.y, TileType::SecretDoor);
            VaultMechanism::Secret
        }
        VaultMechanism::Keyed(material) => {
            map.set_tile(door.x, door.y, TileType::VaultDoor { material });
            let field = entrance_field(map, level_entrance);
            let cells = reachable_cells_outside(map, &field, &region, level_entrance, None);
            if cells.is_empty() {
                log::debug!("no reachable key cell for vault at {:?}, degrading", door);
                map.set_tile(door.x, door.y, TileType::SecretDoor);
                VaultMechanism::Secret
            } else {
                let cell = cells[rng.gen_range(0..cells.len())];
                let key_name = match material {
                    VaultMaterial::Iron => "iron key",
                    VaultMaterial::Bronze => "bronze key",
                    VaultMaterial::Stone => "stone key",
                };
                objects.set_item_at(
                    ItemSpec::new(key_name, ';'),
                    Loc::new(dungeon_id, level_ix, cell),
                );
                key_loc = Some(cell);
                VaultMechanism::Keyed(material)
            }
        }
        VaultMechanism::Trigger => {
            map.set_tile(door.x, door.y, TileType::Portcullis { lowered: true });
            let field = entrance_field(map, level_entrance);
            let cells = reachable_cells_outside(
                map,
                &field,
                &region,
                level_entrance,
                Some((door, cfg.trigger_radius)),
            );
            if cells.is_empty() {
                log::debug!("no trigger cell near vault at {:?}, degrading", door);
                map.set_tile(door.x, door.y, TileType::SecretDoor);
                VaultMechanism::Secret
            } else {
                let cell = cells[rng.gen_range(0..cells.len())];
                map.set_tile(cell.x, cell.y, TileType::GateTrigger { target: door });
                trigger_loc = Some(cell);
                VaultMechanism::Trigger
            }
        }
    };

    place_contents(map, rng, dungeon_id, level_ix, &region, objects);

    Vault {
        region,
        entrance: door,
        mechanism,
        key_loc,
        trigger_loc,
    }
}

/// Distance field from the level entrance over ordinary walking costs. The
/// vault's own door kind is absent from the table, so reachability here
/// means "reachable without passing the vault door".
fn entrance_field(map: &Map, level_entrance: Position) -> DistanceField {
    dijkstra_map(
        map,
        &[level_entrance],
        &CostTable::dungeon_walk(),
        f32::INFINITY,
        true,
    )
}

/// Floor cells outside the vault the player can actually walk to,
/// optionally restricted to a radius around the vault door.
fn reachable_cells_outside(
    map: &Map,
    field: &DistanceField,
    region: &Region,
    level_entrance: Position,
    near: Option<(Position, i32)>,
) -> Vec<Position> {
    map.positions()
        .filter(|p| map.kind_at(p.x, p.y) == Some(TileKind::Floor))
        .filter(|p| !region.contains(*p))
        .filter(|p| *p != level_entrance)
        .filter(|p| field.is_reachable(*p))
        .filter(|p| match near {
            Some((center, radius)) => p.chebyshev(&center) <= radius,
            None => true,
        })
        .collect()
}

/// Something worth the trouble, and sometimes something guarding it.
fn place_contents(
    map: &Map,
    rng: &mut StdRng,
    dungeon_id: u32,
    level_ix: usize,
    region: &Region,
    objects: &mut ObjectDb,
) {
    let cells = region.cells();
    let treasure = cells[rng.gen_range(0..cells.len())];
    objects.set_item_at(
        ItemSpec::new("sealed coffer", '='),
        Loc::new(dungeon_id, level_ix, treasure),
    );
    if rng.gen_bool(0.5) {
        let guard_cell = cells[rng.gen_range(0..cells.len())];
        if map.is_passable(guard_cell.x, guard_cell.y) {
            objects.add_actor(
                ActorSpec::new("vault revenant", 'R'),
                Loc::new(dungeon_id, level_ix, guard_cell),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::pathfinding::astar;
    use rand::SeedableRng;

    /// 21x15 fixture: an 8x8 entrance room, a two-cell corridor on row 5,
    /// one door at (11,5), and a 6x6 candidate room behind it.
    fn fixture() -> (Map, Position) {
        let mut map = Map::new(21, 15);
        for y in 1..=8 {
            for x in 1..=8 {
                map.set_tile(x, y, TileType::Floor);
            }
        }
        for y in 3..=8 {
            for x in 12..=17 {
                map.set_tile(x, y, TileType::Floor);
            }
        }
        map.set_tile(9, 5, TileType::Floor);
        map.set_tile(10, 5, TileType::Floor);
        map.set_tile(11, 5, TileType::door());
        (map, Position::new(2, 2))
    }

    #[test]
    fn candidate_filter_finds_the_single_door_room() {
        let (map, _) = fixture();
        let candidates = find_candidates(&map);
        // Both the entrance area and the vault room have exactly one
        // adjacent door here.
        assert_eq!(candidates.len(), 2);
        let vault_room = candidates
            .iter()
            .find(|(r, _)| r.contains(Position::new(12, 3)))
            .expect("right room must be a candidate");
        assert_eq!(vault_room.1, Position::new(11, 5));
        assert!(vault_room.0.interior_cells().len() >= MIN_INTERIOR_CELLS);
    }

    #[test]
    fn zero_chance_creates_nothing() {
        let (mut map, entrance) = fixture();
        let mut cfg = WorldConfig::default();
        cfg.vault_chance = 0.0;
        let mut rng = StdRng::seed_from_u64(1);
        let mut objects = ObjectDb::new();
        let vaults = place_vaults(&mut map, &mut rng, 1, 1, entrance, &mut objects, &cfg);
        assert!(vaults.is_empty());
        assert_eq!(map.kind_at(11, 5), Some(TileKind::Door));
    }

    #[test]
    fn certain_chance_swaps_the_door_for_a_mechanism() {
        let mut cfg = WorldConfig::default();
        cfg.vault_chance = 1.0;
        for seed in 0..12u64 {
            let (mut map, entrance) = fixture();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut objects = ObjectDb::new();
            let vaults = place_vaults(&mut map, &mut rng, 1, 1, entrance, &mut objects, &cfg);
            assert_eq!(vaults.len(), 1, "seed {seed}");
            let kind = map.kind_at(11, 5).unwrap();
            assert!(
                matches!(
                    kind,
                    TileKind::SecretDoor | TileKind::VaultDoor | TileKind::Portcullis
                ),
                "seed {seed} left door kind {kind:?}"
            );
        }
    }

    #[test]
    fn entrance_room_is_never_converted() {
        let mut cfg = WorldConfig::default();
        cfg.vault_chance = 1.0;
        let (mut map, entrance) = fixture();
        let mut rng = StdRng::seed_from_u64(3);
        let mut objects = ObjectDb::new();
        let vaults = place_vaults(&mut map, &mut rng, 1, 0, entrance, &mut objects, &cfg);
        for v in &vaults {
            assert!(!v.region.contains(entrance));
        }
    }

    #[test]
    fn keyed_vault_keys_are_reachable_without_the_vault_door() {
        let mut cfg = WorldConfig::default();
        cfg.vault_chance = 1.0;
        let mut keyed_seen = 0;
        for seed in 0..60u64 {
            let (mut map, entrance) = fixture();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut objects = ObjectDb::new();
            let vaults = place_vaults(&mut map, &mut rng, 1, 1, entrance, &mut objects, &cfg);
            for v in vaults {
                if let VaultMechanism::Keyed(_) = v.mechanism {
                    keyed_seen += 1;
                    let key = v.key_loc.expect("keyed vault must place a key");
                    assert!(!v.region.contains(key), "key hidden inside its own vault");
                    // dungeon_walk has no VaultDoor entry, so this path can
                    // never pass through the vault entrance.
                    let path = astar(&map, entrance, key, &CostTable::dungeon_walk(), true);
                    assert!(!path.is_empty(), "seed {seed}: key unreachable");
                    assert!(!path.contains(&v.entrance));
                }
            }
        }
        assert!(keyed_seen > 0, "no keyed vault in sixty seeds");
    }

    #[test]
    fn trigger_sits_outside_within_radius() {
        let mut cfg = WorldConfig::default();
        cfg.vault_chance = 1.0;
        let mut triggers_seen = 0;
        for seed in 0..60u64 {
            let (mut map, entrance) = fixture();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut objects = ObjectDb::new();
            let vaults = place_vaults(&mut map, &mut rng, 1, 1, entrance, &mut objects, &cfg);
            for v in vaults {
                if v.mechanism == VaultMechanism::Trigger {
                    triggers_seen += 1;
                    let trigger = v.trigger_loc.expect("trigger vault must place a trigger");
                    assert!(!v.region.contains(trigger));
                    assert!(trigger.chebyshev(&v.entrance) <= cfg.trigger_radius);
                    match map.get_tile(trigger.x, trigger.y).unwrap().tile_type {
                        TileType::GateTrigger { target } => assert_eq!(target, v.entrance),
                        other => panic!("trigger cell holds {other:?}"),
                    }
                }
            }
        }
        assert!(triggers_seen > 0, "no trigger vault in sixty seeds");
    }
}
