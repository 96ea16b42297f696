//! Map data structure
//!
//! The 2D grid representing one level of the world.

use serde::{Deserialize, Serialize};

use super::tile::{Tile, TileKind, TileType};

/// Cardinal neighbor offsets, clockwise from north.
pub const DIR4: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// All eight neighbor offsets, clockwise from north. Iteration order is
/// fixed so randomized choices over neighbors stay reproducible.
pub const DIR8: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// A coordinate on a map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position
    pub fn manhattan(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance (diagonal steps count as one)
    pub fn chebyshev(&self, other: &Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// One level's tile grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Map {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<Tile>,
}

impl Map {
    /// Create a new map filled with walls
    pub fn new(width: i32, height: i32) -> Self {
        Self::filled(width, height, TileType::Wall)
    }

    /// Create a new map filled with the given tile type
    pub fn filled(width: i32, height: i32, tile_type: TileType) -> Self {
        assert!(width > 0 && height > 0, "map dimensions must be positive");
        Self {
            width,
            height,
            tiles: vec![Tile::of(tile_type); (width * height) as usize],
        }
    }

    /// Convert 2D coordinates to 1D index
    #[inline]
    pub fn xy_to_idx(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Convert 1D index to 2D coordinates
    #[inline]
    pub fn idx_to_xy(&self, idx: usize) -> (i32, i32) {
        let idx = idx as i32;
        (idx % self.width, idx / self.width)
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    pub fn get_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        if self.in_bounds(x, y) {
            Some(&self.tiles[self.xy_to_idx(x, y)])
        } else {
            None
        }
    }

    pub fn get_tile_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        if self.in_bounds(x, y) {
            let idx = self.xy_to_idx(x, y);
            Some(&mut self.tiles[idx])
        } else {
            None
        }
    }

    /// Set tile type at position. Out-of-bounds writes are ignored.
    pub fn set_tile(&mut self, x: i32, y: i32, tile_type: TileType) {
        if self.in_bounds(x, y) {
            let idx = self.xy_to_idx(x, y);
            self.tiles[idx] = Tile::of(tile_type);
        }
    }

    pub fn kind_at(&self, x: i32, y: i32) -> Option<TileKind> {
        self.get_tile(x, y).map(|t| t.kind())
    }

    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        self.get_tile(x, y).map_or(false, |t| t.is_passable())
    }

    /// Row-major iterator over every coordinate
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width;
        (0..self.tiles.len()).map(move |i| {
            let i = i as i32;
            Position::new(i % width, i / width)
        })
    }

    /// All coordinates holding a tile of the given kind, row-major
    pub fn find_tiles(&self, kind: TileKind) -> Vec<Position> {
        self.positions()
            .filter(|p| self.kind_at(p.x, p.y) == Some(kind))
            .collect()
    }

    /// Count neighbors (8-directional) matching a predicate. Out-of-bounds
    /// neighbors match if `oob_matches` is set, which cellular automata use
    /// to treat the map edge as solid.
    pub fn count_neighbors(
        &self,
        x: i32,
        y: i32,
        oob_matches: bool,
        pred: impl Fn(&Tile) -> bool,
    ) -> i32 {
        let mut count = 0;
        for (dx, dy) in DIR8 {
            match self.get_tile(x + dx, y + dy) {
                Some(tile) if pred(tile) => count += 1,
                None if oob_matches => count += 1,
                _ => {}
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_checked_access() {
        let mut map = Map::new(10, 5);
        assert!(map.get_tile(-1, 0).is_none());
        assert!(map.get_tile(10, 0).is_none());
        assert!(map.get_tile(0, 5).is_none());
        assert!(map.get_tile(9, 4).is_some());

        // out-of-bounds writes do nothing
        map.set_tile(99, 99, TileType::Floor);
        assert!(map.tiles.iter().all(|t| t.kind() == TileKind::Wall));
    }

    #[test]
    fn index_round_trip() {
        let map = Map::new(7, 3);
        for idx in 0..map.tiles.len() {
            let (x, y) = map.idx_to_xy(idx);
            assert_eq!(map.xy_to_idx(x, y), idx);
        }
    }

    #[test]
    fn every_coordinate_has_exactly_one_tile() {
        let map = Map::new(12, 9);
        assert_eq!(map.tiles.len(), 12 * 9);
        assert_eq!(map.positions().count(), 12 * 9);
    }
}
