//! Region finding
//!
//! Flood-fill connected components of passable tiles under a pluggable
//! passability predicate. Used for room detection, wilderness valley
//! detection and vault candidate detection.

use std::collections::VecDeque;

use super::map::{Map, Position, DIR4, DIR8};
use super::tile::{Tile, TileKind};

/// One maximal connected component of passable tiles.
///
/// Cells are kept sorted row-major so any iteration that feeds the RNG is
/// deterministic regardless of how the fill visited them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: usize,
    cells: Vec<Position>,
}

impl Region {
    fn new(id: usize, mut cells: Vec<Position>) -> Self {
        cells.sort_by_key(|p| (p.y, p.x));
        Self { id, cells }
    }

    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells
            .binary_search_by_key(&(pos.y, pos.x), |p| (p.y, p.x))
            .is_ok()
    }

    /// Cells whose eight neighbors all belong to this region.
    pub fn interior_cells(&self) -> Vec<Position> {
        self.cells
            .iter()
            .copied()
            .filter(|p| {
                DIR8.iter()
                    .all(|(dx, dy)| self.contains(Position::new(p.x + dx, p.y + dy)))
            })
            .collect()
    }

    /// Cells outside the region that touch it (8-directional), row-major.
    pub fn perimeter(&self, map: &Map) -> Vec<Position> {
        let mut out = Vec::new();
        for p in &self.cells {
            for (dx, dy) in DIR8 {
                let n = Position::new(p.x + dx, p.y + dy);
                if map.in_bounds(n.x, n.y) && !self.contains(n) {
                    out.push(n);
                }
            }
        }
        out.sort_by_key(|p| (p.y, p.x));
        out.dedup();
        out
    }

    /// Door tiles cardinally adjacent to the region, row-major. A vault
    /// candidate must have exactly one of these.
    pub fn adjacent_doors(&self, map: &Map) -> Vec<Position> {
        let mut out = Vec::new();
        for p in &self.cells {
            for (dx, dy) in DIR4 {
                let n = Position::new(p.x + dx, p.y + dy);
                if matches!(
                    map.kind_at(n.x, n.y),
                    Some(
                        TileKind::Door
                            | TileKind::SecretDoor
                            | TileKind::VaultDoor
                            | TileKind::Portcullis
                    )
                ) {
                    out.push(n);
                }
            }
        }
        out.sort_by_key(|p| (p.y, p.x));
        out.dedup();
        out
    }
}

/// Find every maximal connected component of tiles satisfying `passable`,
/// scanning row-major so region numbering is deterministic. Tiles of the
/// optional `boundary` kind are never entered even if passable.
pub fn find_regions(
    map: &Map,
    passable: &dyn Fn(&Tile) -> bool,
    boundary: Option<TileKind>,
) -> Vec<Region> {
    let mut visited = vec![false; map.tiles.len()];
    let mut regions = Vec::new();

    for idx in 0..map.tiles.len() {
        if visited[idx] {
            continue;
        }
        let (x, y) = map.idx_to_xy(idx);
        let tile = &map.tiles[idx];
        if !passable(tile) || Some(tile.kind()) == boundary {
            continue;
        }
        let cells = flood(map, Position::new(x, y), passable, boundary, &mut visited);
        regions.push(Region::new(regions.len(), cells));
    }

    regions
}

/// Flood from one starting cell. Returns `None` when the start itself is
/// not passable (or out of bounds).
pub fn region_at(
    map: &Map,
    start: Position,
    passable: &dyn Fn(&Tile) -> bool,
    boundary: Option<TileKind>,
) -> Option<Region> {
    let tile = map.get_tile(start.x, start.y)?;
    if !passable(tile) || Some(tile.kind()) == boundary {
        return None;
    }
    let mut visited = vec![false; map.tiles.len()];
    let cells = flood(map, start, passable, boundary, &mut visited);
    Some(Region::new(0, cells))
}

fn flood(
    map: &Map,
    start: Position,
    passable: &dyn Fn(&Tile) -> bool,
    boundary: Option<TileKind>,
    visited: &mut [bool],
) -> Vec<Position> {
    let mut cells = Vec::new();
    let mut queue = VecDeque::new();
    visited[map.xy_to_idx(start.x, start.y)] = true;
    queue.push_back(start);

    while let Some(pos) = queue.pop_front() {
        cells.push(pos);
        for (dx, dy) in DIR8 {
            let nx = pos.x + dx;
            let ny = pos.y + dy;
            if !map.in_bounds(nx, ny) {
                continue;
            }
            let nidx = map.xy_to_idx(nx, ny);
            if visited[nidx] {
                continue;
            }
            let tile = &map.tiles[nidx];
            if !passable(tile) || Some(tile.kind()) == boundary {
                continue;
            }
            visited[nidx] = true;
            queue.push_back(Position::new(nx, ny));
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::TileType;

    fn floor_pred(t: &Tile) -> bool {
        t.kind() == TileKind::Floor
    }

    fn carve_rect(map: &mut Map, x0: i32, y0: i32, x1: i32, y1: i32) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                map.set_tile(x, y, TileType::Floor);
            }
        }
    }

    #[test]
    fn completeness_every_passable_cell_in_exactly_one_region() {
        let mut map = Map::new(20, 12);
        carve_rect(&mut map, 1, 1, 5, 5);
        carve_rect(&mut map, 10, 2, 14, 4);
        map.set_tile(17, 9, TileType::Floor); // isolated single cell

        let regions = find_regions(&map, &floor_pred, None);
        assert_eq!(regions.len(), 3);

        let passable_total: usize = map
            .positions()
            .filter(|p| map.kind_at(p.x, p.y) == Some(TileKind::Floor))
            .count();
        let region_total: usize = regions.iter().map(|r| r.len()).sum();
        assert_eq!(passable_total, region_total);

        for p in map.positions() {
            if map.kind_at(p.x, p.y) == Some(TileKind::Floor) {
                let owners = regions.iter().filter(|r| r.contains(p)).count();
                assert_eq!(owners, 1, "cell {:?} owned by {} regions", p, owners);
            }
        }
    }

    #[test]
    fn single_cell_region_is_valid() {
        let mut map = Map::new(5, 5);
        map.set_tile(2, 2, TileType::Floor);
        let regions = find_regions(&map, &floor_pred, None);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].len(), 1);
        assert!(regions[0].contains(Position::new(2, 2)));
    }

    #[test]
    fn idempotent_membership() {
        let mut map = Map::new(16, 16);
        carve_rect(&mut map, 1, 1, 6, 6);
        carve_rect(&mut map, 9, 9, 14, 14);
        let a = find_regions(&map, &floor_pred, None);
        let b = find_regions(&map, &floor_pred, None);
        assert_eq!(a.len(), b.len());
        for (ra, rb) in a.iter().zip(&b) {
            assert_eq!(ra.cells(), rb.cells());
        }
    }

    #[test]
    fn diagonal_adjacency_joins_regions() {
        let mut map = Map::new(6, 6);
        map.set_tile(1, 1, TileType::Floor);
        map.set_tile(2, 2, TileType::Floor);
        let regions = find_regions(&map, &floor_pred, None);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].len(), 2);
    }

    #[test]
    fn boundary_kind_splits_fill() {
        let mut map = Map::new(9, 3);
        carve_rect(&mut map, 1, 1, 7, 1);
        map.set_tile(4, 1, TileType::StoneFloor);
        let pred = |t: &Tile| matches!(t.kind(), TileKind::Floor | TileKind::StoneFloor);
        let split = find_regions(&map, &pred, Some(TileKind::StoneFloor));
        assert_eq!(split.len(), 2);
        let joined = find_regions(&map, &pred, None);
        assert_eq!(joined.len(), 1);
    }

    #[test]
    fn empty_grid_yields_no_regions() {
        let map = Map::new(8, 8);
        assert!(find_regions(&map, &floor_pred, None).is_empty());
    }

    #[test]
    fn perimeter_rings_a_room() {
        let mut map = Map::new(10, 10);
        carve_rect(&mut map, 2, 2, 6, 6); // 5x5 room
        let regions = find_regions(&map, &floor_pred, None);
        let perimeter = regions[0].perimeter(&map);
        // 7x7 ring around a 5x5 block
        assert_eq!(perimeter.len(), 7 * 7 - 5 * 5);
        assert!(perimeter.iter().all(|p| !regions[0].contains(*p)));
    }

    #[test]
    fn seeded_fill_matches_whole_map_region() {
        let mut map = Map::new(12, 12);
        carve_rect(&mut map, 1, 1, 4, 4);
        carve_rect(&mut map, 7, 7, 10, 10);
        let all = find_regions(&map, &floor_pred, None);
        let seeded = region_at(&map, Position::new(8, 8), &floor_pred, None).unwrap();
        let matching = all
            .iter()
            .find(|r| r.contains(Position::new(8, 8)))
            .unwrap();
        assert_eq!(seeded.cells(), matching.cells());
        assert!(region_at(&map, Position::new(0, 0), &floor_pred, None).is_none());
    }

    #[test]
    fn interior_cells_of_a_room() {
        let mut map = Map::new(10, 10);
        carve_rect(&mut map, 2, 2, 6, 6); // 5x5 room
        let regions = find_regions(&map, &floor_pred, None);
        // 3x3 inner block has all eight neighbors inside the room
        assert_eq!(regions[0].interior_cells().len(), 9);
    }
}
