//! Room-and-maze dungeon levels
//!
//! Rooms are never placed geometrically; they are randomly proposed and
//! validated, up to a fixed retry budget. The space between rooms is filled
//! with mazes and the two are joined through validated door candidates.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::maze;
use crate::data::WorldConfig;
use crate::world::map::{Map, Position, DIR8};
use crate::world::pathfinding::{astar, CostTable};
use crate::world::region::find_regions;
use crate::world::tile::{Tile, TileKind, TileType};

/// A stamped room: its floor cells plus the wall ring around them.
#[derive(Debug, Clone)]
pub struct Room {
    pub cells: Vec<Position>,
    pub perimeter: Vec<Position>,
}

impl Room {
    fn from_cells(map: &Map, mut cells: Vec<Position>) -> Self {
        cells.sort_by_key(|p| (p.y, p.x));
        let mut perimeter = Vec::new();
        for p in &cells {
            for (dx, dy) in DIR8 {
                let n = Position::new(p.x + dx, p.y + dy);
                if map.in_bounds(n.x, n.y) && !cells.contains(&n) {
                    perimeter.push(n);
                }
            }
        }
        perimeter.sort_by_key(|p| (p.y, p.x));
        perimeter.dedup();
        Self { cells, perimeter }
    }

    pub fn center(&self) -> Position {
        let n = self.cells.len() as i32;
        let (sx, sy) = self
            .cells
            .iter()
            .fold((0, 0), |(ax, ay), p| (ax + p.x, ay + p.y));
        Position::new(sx / n, sy / n)
    }
}

/// Propose-and-validate room placement. Each attempt rolls a rectangle or a
/// circle; overlap with existing floor or another room's perimeter rejects
/// the proposal. Runs until the attempt budget is spent, never errors.
pub fn place_rooms(map: &mut Map, rng: &mut StdRng, cfg: &WorldConfig) -> Vec<Room> {
    let mut rooms: Vec<Room> = Vec::new();

    for _ in 0..cfg.room_attempts {
        let circular = rng.gen_bool(0.25);
        let proposal = if circular {
            propose_circle(map, rng)
        } else {
            propose_rect(map, rng)
        };
        let Some(cells) = proposal else {
            continue;
        };

        if !placement_clear(map, &cells) {
            continue;
        }

        for p in &cells {
            map.set_tile(p.x, p.y, TileType::Floor);
        }
        rooms.push(Room::from_cells(map, cells));
    }

    rooms
}

/// Odd-sized rectangle at odd coordinates so rooms line up with the maze
/// lattice.
fn propose_rect(map: &Map, rng: &mut StdRng) -> Option<Vec<Position>> {
    let w = 2 * rng.gen_range(2..=4) + 1;
    let h = 2 * rng.gen_range(1..=3) + 1;
    if map.width < w + 4 || map.height < h + 4 {
        return None;
    }
    let x = 2 * rng.gen_range(1..=(map.width - w - 2) / 2) - 1;
    let y = 2 * rng.gen_range(1..=(map.height - h - 2) / 2) - 1;

    let mut cells = Vec::with_capacity((w * h) as usize);
    for cy in y..y + h {
        for cx in x..x + w {
            cells.push(Position::new(cx, cy));
        }
    }
    Some(cells)
}

fn propose_circle(map: &Map, rng: &mut StdRng) -> Option<Vec<Position>> {
    let r = rng.gen_range(2..=3);
    let d = 2 * r + 1;
    if map.width < d + 4 || map.height < d + 4 {
        return None;
    }
    let cx = 2 * rng.gen_range(1..=(map.width - d - 2) / 2) - 1 + r;
    let cy = 2 * rng.gen_range(1..=(map.height - d - 2) / 2) - 1 + r;

    let mut cells = Vec::new();
    for y in cy - r..=cy + r {
        for x in cx - r..=cx + r {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= r * r + 1 {
                cells.push(Position::new(x, y));
            }
        }
    }
    Some(cells)
}

/// The proposal and a one-cell margin around it must all still be wall.
fn placement_clear(map: &Map, cells: &[Position]) -> bool {
    for p in cells {
        for dy in -1..=1 {
            for dx in -1..=1 {
                match map.kind_at(p.x + dx, p.y + dy) {
                    Some(TileKind::Wall) => {}
                    _ => return false,
                }
            }
        }
    }
    true
}

/// Wall cells on a room's perimeter with floor directly on both
/// perpendicular sides. The only places a door may go.
pub fn door_candidates(map: &Map, room: &Room) -> Vec<Position> {
    room.perimeter
        .iter()
        .copied()
        .filter(|p| is_door_candidate(map, *p))
        .collect()
}

pub fn is_door_candidate(map: &Map, p: Position) -> bool {
    if map.kind_at(p.x, p.y) != Some(TileKind::Wall) {
        return false;
    }
    let floor = |x: i32, y: i32| {
        matches!(
            map.kind_at(x, y),
            Some(TileKind::Floor | TileKind::StoneFloor)
        )
    };
    (floor(p.x - 1, p.y) && floor(p.x + 1, p.y)) || (floor(p.x, p.y - 1) && floor(p.x, p.y + 1))
}

/// Passability used when asking "is this level one piece": closed and locked
/// doors count as openings.
pub fn connectivity_pred(t: &Tile) -> bool {
    t.is_passable()
        || matches!(
            t.kind(),
            TileKind::Door | TileKind::SecretDoor | TileKind::VaultDoor | TileKind::Portcullis
        )
}

/// Build one rooms-and-maze level.
pub fn build_level(rng: &mut StdRng, cfg: &WorldConfig) -> Map {
    let mut map = Map::new(cfg.level_width, cfg.level_height);
    let rooms = place_rooms(&mut map, rng, cfg);
    maze::fill_with_mazes(&mut map, rng);

    // Open each room onto whatever the maze carved around it.
    for room in &rooms {
        let candidates = door_candidates(&map, room);
        if candidates.is_empty() {
            continue;
        }
        let doors = rng.gen_range(1..=2usize).min(candidates.len());
        let picked: Vec<Position> = candidates
            .choose_multiple(rng, doors)
            .copied()
            .collect();
        for p in picked {
            let tile_type = if rng.gen_bool(0.1) {
                TileType::locked_door()
            } else {
                TileType::door()
            };
            map.set_tile(p.x, p.y, tile_type);
        }
    }

    join_disconnected(&mut map, rng);
    map
}

/// Door or carve until the level is one connected component. Degrades by
/// carving a direct tunnel when no door candidate bridges two components.
pub(crate) fn join_disconnected(map: &mut Map, rng: &mut StdRng) {
    // Each pass joins at least two components, so the cap only matters for
    // degenerate grids.
    for _ in 0..64 {
        let regions = find_regions(map, &connectivity_pred, None);
        if regions.len() <= 1 {
            return;
        }

        let mut bridges: Vec<Position> = Vec::new();
        for p in map.positions() {
            if map.kind_at(p.x, p.y) != Some(TileKind::Wall) {
                continue;
            }
            let sides = [
                (Position::new(p.x - 1, p.y), Position::new(p.x + 1, p.y)),
                (Position::new(p.x, p.y - 1), Position::new(p.x, p.y + 1)),
            ];
            for (a, b) in sides {
                let ra = regions.iter().position(|r| r.contains(a));
                let rb = regions.iter().position(|r| r.contains(b));
                if let (Some(ra), Some(rb)) = (ra, rb) {
                    if ra != rb {
                        bridges.push(p);
                        break;
                    }
                }
            }
        }

        if !bridges.is_empty() {
            let p = bridges[rng.gen_range(0..bridges.len())];
            map.set_tile(p.x, p.y, TileType::door());
            continue;
        }

        // No shared wall anywhere: tunnel between the two first components.
        let from = regions[0].cells()[0];
        let to = regions[1].cells()[0];
        let carve_costs = CostTable::new()
            .with(TileKind::Floor, 1.0)
            .with(TileKind::Door, 1.0)
            .with(TileKind::Wall, 4.0);
        let path = astar(map, from, to, &carve_costs, false);
        let touches_border = path
            .iter()
            .any(|p| p.x == 0 || p.y == 0 || p.x == map.width - 1 || p.y == map.height - 1);
        if path.is_empty() || touches_border {
            super::carve_tunnel(map, from, to);
            continue;
        }
        for p in path {
            if map.kind_at(p.x, p.y) == Some(TileKind::Wall) {
                map.set_tile(p.x, p.y, TileType::Floor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn rooms_never_overlap() {
        let cfg = WorldConfig::default();
        let mut map = Map::new(cfg.level_width, cfg.level_height);
        let mut rng = StdRng::seed_from_u64(7);
        let rooms = place_rooms(&mut map, &mut rng, &cfg);
        assert!(!rooms.is_empty());

        for (i, a) in rooms.iter().enumerate() {
            for b in rooms.iter().skip(i + 1) {
                for cell in &a.cells {
                    assert!(!b.cells.contains(cell), "rooms share cell {:?}", cell);
                    assert!(
                        !b.perimeter.contains(cell),
                        "room floor {:?} on another room's perimeter",
                        cell
                    );
                }
            }
        }
    }

    #[test]
    fn built_level_is_one_component() {
        let cfg = WorldConfig::default();
        for seed in [1u64, 99, 4096] {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = build_level(&mut rng, &cfg);
            let regions = find_regions(&map, &connectivity_pred, None);
            assert_eq!(regions.len(), 1, "seed {seed} produced a split level");
        }
    }

    #[test]
    fn door_candidate_requires_opposed_floor() {
        let mut map = Map::new(7, 7);
        map.set_tile(2, 3, TileType::Floor);
        map.set_tile(4, 3, TileType::Floor);
        assert!(is_door_candidate(&map, Position::new(3, 3)));
        // Corner contact only
        map.set_tile(4, 3, TileType::Wall);
        map.set_tile(4, 4, TileType::Floor);
        assert!(!is_door_candidate(&map, Position::new(3, 3)));
    }
}
