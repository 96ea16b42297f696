//! Maze carving
//!
//! Randomized Prim's growth over the odd-coordinate cell lattice. Carved
//! mazes span every lattice cell reachable from their start, so a maze on an
//! all-wall grid is one connected region.

use rand::rngs::StdRng;
use rand::Rng;

use crate::world::map::{Map, Position, DIR8};
use crate::world::tile::{TileKind, TileType};

/// Lattice steps, two cells at a time, clockwise from north.
const LATTICE: [(i32, i32); 4] = [(0, -2), (2, 0), (0, 2), (-2, 0)];

fn in_lattice(map: &Map, x: i32, y: i32) -> bool {
    x >= 1 && x < map.width - 1 && y >= 1 && y < map.height - 1
}

/// Corridors must not touch floor the maze did not carve itself, or rooms
/// would gain doorless entrances. Rooms connect through placed doors only.
fn clear_of_foreign_floor(map: &Map, carved: &[bool], cell: Position) -> bool {
    DIR8.iter().all(|(dx, dy)| {
        let (nx, ny) = (cell.x + dx, cell.y + dy);
        match map.kind_at(nx, ny) {
            Some(TileKind::Floor) => carved[map.xy_to_idx(nx, ny)],
            _ => true,
        }
    })
}

/// Carve a maze starting from `start`, which must sit on the odd lattice.
/// Does nothing if the start cell is not wall.
pub fn carve_maze(map: &mut Map, rng: &mut StdRng, start: Position) {
    if !in_lattice(map, start.x, start.y) || map.kind_at(start.x, start.y) != Some(TileKind::Wall) {
        return;
    }

    // Room floor can sit on the lattice too, so track which cells this maze
    // carved itself; attaching to a room would knock a doorless hole in its
    // wall.
    let mut carved = vec![false; map.tiles.len()];
    if !clear_of_foreign_floor(map, &carved, start) {
        return;
    }
    carved[map.xy_to_idx(start.x, start.y)] = true;
    map.set_tile(start.x, start.y, TileType::Floor);

    let mut frontier: Vec<Position> = Vec::new();
    push_frontier(map, start, &mut frontier);

    while !frontier.is_empty() {
        let ix = rng.gen_range(0..frontier.len());
        let cell = frontier.swap_remove(ix);
        if map.kind_at(cell.x, cell.y) != Some(TileKind::Wall) {
            continue; // reached from another side already
        }
        if !clear_of_foreign_floor(map, &carved, cell) {
            continue;
        }

        let attachments: Vec<Position> = LATTICE
            .iter()
            .map(|(dx, dy)| Position::new(cell.x + dx, cell.y + dy))
            .filter(|n| in_lattice(map, n.x, n.y) && carved[map.xy_to_idx(n.x, n.y)])
            .collect();
        if attachments.is_empty() {
            continue;
        }
        let attach = attachments[rng.gen_range(0..attachments.len())];

        carved[map.xy_to_idx(cell.x, cell.y)] = true;
        map.set_tile(cell.x, cell.y, TileType::Floor);
        let mid = Position::new((cell.x + attach.x) / 2, (cell.y + attach.y) / 2);
        map.set_tile(mid.x, mid.y, TileType::Floor);
        push_frontier(map, cell, &mut frontier);
    }
}

fn push_frontier(map: &Map, from: Position, frontier: &mut Vec<Position>) {
    for (dx, dy) in LATTICE {
        let n = Position::new(from.x + dx, from.y + dy);
        if in_lattice(map, n.x, n.y) && map.kind_at(n.x, n.y) == Some(TileKind::Wall) {
            frontier.push(n);
        }
    }
}

/// Carve mazes into every pocket of solid wall, scanning the lattice
/// row-major. Pockets separated by rooms each grow their own maze.
pub fn fill_with_mazes(map: &mut Map, rng: &mut StdRng) {
    let (w, h) = (map.width, map.height);
    let mut y = 1;
    while y < h - 1 {
        let mut x = 1;
        while x < w - 1 {
            if map.kind_at(x, y) == Some(TileKind::Wall) {
                carve_maze(map, rng, Position::new(x, y));
            }
            x += 2;
        }
        y += 2;
    }
}
