//! Cave levels
//!
//! Cellular automata over random noise, then every disconnected pocket is
//! joined to the main cave by a pathfinder-carved tunnel. The finished cave
//! is re-checked for single connectivity; a level with stranded pockets is a
//! generator bug, not bad luck.

use rand::rngs::StdRng;
use rand::Rng;

use crate::data::WorldConfig;
use crate::world::map::{Map, Position};
use crate::world::pathfinding::{astar, CostTable};
use crate::world::region::{find_regions, Region};
use crate::world::tile::{Tile, TileKind, TileType};

fn cave_floor(t: &Tile) -> bool {
    t.kind() == TileKind::Floor
}

/// Build one cave level.
pub fn build_level(rng: &mut StdRng, cfg: &WorldConfig) -> Map {
    let mut map = Map::new(cfg.level_width, cfg.level_height);

    // Initial noise
    for y in 1..map.height - 1 {
        for x in 1..map.width - 1 {
            if rng.gen_bool(cfg.cave_fill) {
                map.set_tile(x, y, TileType::Floor);
            }
        }
    }

    // Smooth with the birth/death rule. The map edge counts as wall so
    // caves never open onto the border.
    for _ in 0..cfg.cave_generations {
        let mut next = map.tiles.clone();
        for y in 1..map.height - 1 {
            for x in 1..map.width - 1 {
                let walls =
                    map.count_neighbors(x, y, true, |t| t.kind() == TileKind::Wall);
                let idx = map.xy_to_idx(x, y);
                if walls > 4 {
                    next[idx] = Tile::of(TileType::Wall);
                } else if walls < 4 {
                    next[idx] = Tile::of(TileType::Floor);
                }
            }
        }
        map.tiles = next;
    }

    join_pockets(&mut map);
    map
}

/// Tunnel every secondary pocket into the main cave, then re-run the region
/// finder until the cave is one piece.
fn join_pockets(map: &mut Map) {
    let carve_costs = CostTable::new()
        .with(TileKind::Floor, 1.0)
        .with(TileKind::Wall, 3.5);

    for _ in 0..8 {
        let regions = find_regions(map, &cave_floor, None);
        if regions.len() <= 1 {
            return;
        }

        let main_ix = largest_region(&regions);
        let main_cells: Vec<Position> = regions[main_ix].cells().to_vec();

        for (ix, pocket) in regions.iter().enumerate() {
            if ix == main_ix {
                continue;
            }
            let from = pocket.cells()[0];
            let Some(to) = main_cells
                .iter()
                .copied()
                .min_by_key(|c| (from.manhattan(c), c.y, c.x))
            else {
                continue;
            };
            let path = astar(map, from, to, &carve_costs, false);
            let touches_border = path.iter().any(|p| {
                p.x == 0 || p.y == 0 || p.x == map.width - 1 || p.y == map.height - 1
            });
            if path.is_empty() || touches_border {
                super::carve_tunnel(map, from, to);
            } else {
                for p in path {
                    if map.kind_at(p.x, p.y) == Some(TileKind::Wall) {
                        map.set_tile(p.x, p.y, TileType::Floor);
                    }
                }
            }
        }
    }

    let leftover = find_regions(map, &cave_floor, None);
    if leftover.len() > 1 {
        log::warn!("cave still split into {} pockets after joining", leftover.len());
    }
}

/// Index of the largest region; earlier regions win ties so the choice is
/// independent of anything but the grid.
fn largest_region(regions: &[Region]) -> usize {
    let mut best = 0;
    for (ix, r) in regions.iter().enumerate() {
        if r.len() > regions[best].len() {
            best = ix;
        }
    }
    best
}
