//! Wilderness generation
//!
//! Diamond-square midpoint displacement builds a heightmap biased from sea
//! on one side to mountains on the other. Heights become biomes through a
//! fixed threshold table, vegetation is clumped by a short cellular
//! automaton, rivers are walked north as Bresenham segments, and the outer
//! ring is sealed so nothing walks off the world.

use rand::rngs::StdRng;
use rand::Rng;

use crate::data::WorldConfig;
use crate::world::map::{Map, Position};
use crate::world::region::{find_regions, Region};
use crate::world::tile::{Tile, TileKind, TileType};

/// Fuzz source for midpoint displacement. Tests stub this to zero to get
/// hand-computable heights.
pub type FuzzFn<'a> = &'a mut dyn FnMut(&mut StdRng, f32) -> f32;

/// Generate the overworld map.
pub fn generate(rng: &mut StdRng, cfg: &WorldConfig) -> Map {
    let size = cfg.wilderness_size;
    let corners = [
        rng.gen_range(0.0..cfg.sea_corner_max),
        rng.gen_range(0.0..cfg.sea_corner_max),
        rng.gen_range(cfg.peak_corner_min..cfg.peak_corner_max),
        rng.gen_range(cfg.peak_corner_min..cfg.peak_corner_max),
    ];
    let mut heights = diamond_square(rng, size, corners, cfg.fuzz_scale, &mut |rng, scale| {
        rng.gen_range(-scale..=scale)
    });
    smooth(&mut heights, size);

    let mut map = heights_to_tiles(rng, &heights, size, cfg);
    clump_vegetation(&mut map, cfg.vegetation_generations);
    carve_rivers(rng, &mut map, cfg);
    seal_border(&mut map);
    map
}

/// Diamond-square on a `size x size` grid, `size = 2^n + 1`. Corner order is
/// top-left, top-right, bottom-left, bottom-right. The fuzz amplitude halves
/// at each subdivision.
///
/// # Panics
/// Panics when `size` is not a power of two plus one; that is a caller bug.
pub fn diamond_square(
    rng: &mut StdRng,
    size: usize,
    corners: [f32; 4],
    initial_scale: f32,
    fuzz: FuzzFn,
) -> Vec<f32> {
    assert!(
        size >= 3 && (size - 1).is_power_of_two(),
        "diamond-square grid must be 2^n + 1 cells wide"
    );

    let mut heights = vec![0.0f32; size * size];
    heights[0] = corners[0];
    heights[size - 1] = corners[1];
    heights[(size - 1) * size] = corners[2];
    heights[size * size - 1] = corners[3];

    subdivide(&mut heights, size, 0, 0, size - 1, initial_scale, rng, fuzz);
    heights
}

/// One recursion step: the diamond step fills the square's center, the
/// square step fills its four edge midpoints from whichever neighbors are
/// in bounds, then the four sub-squares recurse with half the fuzz.
#[allow(clippy::too_many_arguments)]
fn subdivide(
    heights: &mut [f32],
    size: usize,
    x0: usize,
    y0: usize,
    span: usize,
    scale: f32,
    rng: &mut StdRng,
    fuzz: FuzzFn,
) {
    if span < 2 {
        return;
    }
    let half = span / 2;
    let (x1, y1) = (x0 + span, y0 + span);
    let (cx, cy) = (x0 + half, y0 + half);

    let tl = heights[y0 * size + x0];
    let tr = heights[y0 * size + x1];
    let bl = heights[y1 * size + x0];
    let br = heights[y1 * size + x1];

    // Diamond step
    let center = (tl + tr + bl + br) / 4.0 + fuzz(rng, scale);
    heights[cy * size + cx] = center;

    // Square step. Each midpoint averages its two square corners, the
    // center, and the matching cell of the neighboring square when the grid
    // extends that far.
    let mids = [
        (cx, y0, tl, tr, y0 >= half, (y0 as isize - half as isize, cx as isize)),
        (cx, y1, bl, br, y1 + half < size, ((y1 + half) as isize, cx as isize)),
        (x0, cy, tl, bl, x0 >= half, (cy as isize, x0 as isize - half as isize)),
        (x1, cy, tr, br, x1 + half < size, (cy as isize, (x1 + half) as isize)),
    ];
    for (mx, my, a, b, has_outside, (oy, ox)) in mids {
        let mut sum = a + b + center;
        let mut n = 3.0;
        if has_outside {
            sum += heights[oy as usize * size + ox as usize];
            n += 1.0;
        }
        heights[my * size + mx] = sum / n + fuzz(rng, scale);
    }

    let next = scale * 0.5;
    subdivide(heights, size, x0, y0, half, next, rng, fuzz);
    subdivide(heights, size, cx, y0, half, next, rng, fuzz);
    subdivide(heights, size, x0, cy, half, next, rng, fuzz);
    subdivide(heights, size, cx, cy, half, next, rng, fuzz);
}

/// Average every cell with its neighbors to knock down displacement
/// artifacts.
pub fn smooth(heights: &mut Vec<f32>, size: usize) {
    let src = heights.clone();
    for y in 0..size {
        for x in 0..size {
            let mut sum = 0.0;
            let mut n = 0.0;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx >= 0 && ny >= 0 && (nx as usize) < size && (ny as usize) < size {
                        sum += src[ny as usize * size + nx as usize];
                        n += 1.0;
                    }
                }
            }
            heights[y * size + x] = sum / n;
        }
    }
}

/// Fixed threshold table from height to biome. Mid-band cells alternate
/// grass and tree by coordinate parity; the automaton below turns that
/// checkerboard into clumps.
fn heights_to_tiles(rng: &mut StdRng, heights: &[f32], size: usize, cfg: &WorldConfig) -> Map {
    let side = size as i32;
    let mut map = Map::filled(side, side, TileType::Grass);
    for y in 0..side {
        for x in 0..side {
            let h = heights[(y as usize) * size + x as usize];
            let tile_type = if h < cfg.deep_water_below {
                TileType::DeepWater
            } else if h < cfg.sand_below {
                TileType::Sand
            } else if h < cfg.grass_below {
                if (x + y) % 2 == 0 {
                    TileType::Grass
                } else {
                    TileType::Tree
                }
            } else if h >= cfg.snow_above && rng.gen_bool(0.33) {
                TileType::SnowPeak
            } else {
                TileType::Mountain
            };
            map.set_tile(x, y, tile_type);
        }
    }
    map
}

/// Two-generation cellular pass: grass crowded by trees becomes tree,
/// lonely trees die back to grass.
pub fn clump_vegetation(map: &mut Map, generations: u32) {
    for _ in 0..generations {
        let mut next = map.tiles.clone();
        for y in 0..map.height {
            for x in 0..map.width {
                let trees = map.count_neighbors(x, y, false, |t| t.kind() == TileKind::Tree);
                let idx = map.xy_to_idx(x, y);
                match map.kind_at(x, y) {
                    Some(TileKind::Grass) if (5..=8).contains(&trees) => {
                        next[idx] = Tile::of(TileType::Tree);
                    }
                    Some(TileKind::Tree) if trees < 4 => {
                        next[idx] = Tile::of(TileType::Grass);
                    }
                    _ => {}
                }
            }
        }
        map.tiles = next;
    }
}

fn is_water(map: &Map, x: i32, y: i32) -> bool {
    matches!(
        map.kind_at(x, y),
        Some(TileKind::Water | TileKind::DeepWater | TileKind::WorldBorder)
    )
}

/// Walk one river north from `start`, drawing a Bresenham segment per step.
/// The river dies when it runs off the map or crosses other water twice.
fn walk_river(rng: &mut StdRng, map: &mut Map, start: Position) {
    let mut cur = start;
    let mut crossings = 0;
    let mut in_water_run = false;
    if !is_water(map, start.x, start.y) {
        map.set_tile(start.x, start.y, TileType::Water);
    }
    while cur.y > 1 {
        let next = Position::new(
            cur.x + rng.gen_range(-2..=2),
            cur.y - rng.gen_range(2..=4),
        );
        // Skip the segment's first point; it is the previous segment's end
        // and already water.
        for p in bresenham(cur, next).into_iter().skip(1) {
            if !map.in_bounds(p.x, p.y) {
                return;
            }
            if is_water(map, p.x, p.y) {
                // Count contiguous water runs, not cells, so one lake or
                // river counts as a single crossing.
                if !in_water_run {
                    crossings += 1;
                    if crossings >= 2 {
                        return;
                    }
                }
                in_water_run = true;
                continue;
            }
            in_water_run = false;
            map.set_tile(p.x, p.y, TileType::Water);
        }
        cur = next;
    }
}

/// Rivers rise in each horizontal third of the map, at cells pressed
/// against high mountains.
fn carve_rivers(rng: &mut StdRng, map: &mut Map, cfg: &WorldConfig) {
    let third = map.width / 3;
    for t in 0..3 {
        let x_lo = t * third;
        let x_hi = if t == 2 { map.width } else { (t + 1) * third };

        let mut candidates: Vec<Position> = Vec::new();
        for y in map.height / 2..map.height - 1 {
            for x in x_lo.max(1)..x_hi.min(map.width - 1) {
                if is_water(map, x, y) {
                    continue;
                }
                if count_adjacent_mountains(map, Position::new(x, y)) >= 4 {
                    candidates.push(Position::new(x, y));
                }
            }
        }
        if candidates.is_empty() {
            continue;
        }
        let rivers = 1 + rng.gen_range(0..=cfg.extra_rivers_per_third);
        for _ in 0..rivers {
            let start = candidates[rng.gen_range(0..candidates.len())];
            walk_river(rng, map, start);
        }
    }

    fill_diagonal_gaps(map);
}

/// Bresenham leaves diagonal-only water contacts a walker could slip
/// through. Square them off.
fn fill_diagonal_gaps(map: &mut Map) {
    // A fill can open a fresh gap against an already-scanned row, so run
    // to a fixpoint. Each pass only adds water; termination is bounded by
    // the cell count.
    loop {
        let mut changed = false;
        for y in 0..map.height - 1 {
            for x in 0..map.width {
                if map.kind_at(x, y) != Some(TileKind::Water) {
                    continue;
                }
                if map.kind_at(x + 1, y + 1) == Some(TileKind::Water)
                    && !is_water(map, x + 1, y)
                    && !is_water(map, x, y + 1)
                {
                    map.set_tile(x + 1, y, TileType::Water);
                    changed = true;
                }
                if x > 0
                    && map.kind_at(x - 1, y + 1) == Some(TileKind::Water)
                    && !is_water(map, x - 1, y)
                    && !is_water(map, x, y + 1)
                {
                    map.set_tile(x - 1, y, TileType::Water);
                    changed = true;
                }
            }
        }
        if !changed {
            return;
        }
    }
}

/// Integer line from `a` to `b` inclusive.
pub fn bresenham(a: Position, b: Position) -> Vec<Position> {
    let mut points = Vec::new();
    let dx = (b.x - a.x).abs();
    let dy = -(b.y - a.y).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (a.x, a.y);
    loop {
        points.push(Position::new(x, y));
        if x == b.x && y == b.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

/// The world ends in deep water.
fn seal_border(map: &mut Map) {
    for x in 0..map.width {
        map.set_tile(x, 0, TileType::WorldBorder);
        map.set_tile(x, map.height - 1, TileType::WorldBorder);
    }
    for y in 0..map.height {
        map.set_tile(0, y, TileType::WorldBorder);
        map.set_tile(map.width - 1, y, TileType::WorldBorder);
    }
}

/// How many of a cell's eight neighbors are mountain or snow peak.
pub fn count_adjacent_mountains(map: &Map, pos: Position) -> i32 {
    map.count_neighbors(pos.x, pos.y, false, |t| {
        matches!(t.kind(), TileKind::Mountain | TileKind::SnowPeak)
    })
}

/// Pockets of traversable land. The largest one is the overworld proper;
/// the rest are hidden valleys sealed off by mountains.
pub fn find_valleys(map: &Map) -> Vec<Region> {
    let pred = |t: &Tile| {
        matches!(
            t.kind(),
            TileKind::Grass
                | TileKind::Tree
                | TileKind::Dirt
                | TileKind::Sand
                | TileKind::Water
                | TileKind::StoneFloor
                | TileKind::Portal
        )
    };
    find_regions(map, &pred, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn zero_fuzz(rng: &mut StdRng, size: usize, corners: [f32; 4]) -> Vec<f32> {
        diamond_square(rng, size, corners, 100.0, &mut |_, _| 0.0)
    }

    #[test]
    fn three_by_three_zero_fuzz_is_pure_averaging() {
        let mut rng = StdRng::seed_from_u64(0);
        let h = zero_fuzz(&mut rng, 3, [10.0, 90.0, 10.0, 270.0]);
        let at = |x: usize, y: usize| h[y * 3 + x];
        assert_eq!(at(1, 1), 95.0); // center: mean of the four corners
        assert_eq!(at(1, 0), (10.0 + 90.0 + 95.0) / 3.0); // top edge
        assert_eq!(at(1, 2), (10.0 + 270.0 + 95.0) / 3.0); // bottom edge
        assert_eq!(at(0, 1), (10.0 + 10.0 + 95.0) / 3.0); // left edge
        assert_eq!(at(2, 1), (90.0 + 270.0 + 95.0) / 3.0); // right edge
    }

    #[test]
    fn five_by_five_zero_fuzz_coarse_lattice() {
        let mut rng = StdRng::seed_from_u64(0);
        let h = zero_fuzz(&mut rng, 5, [10.0, 90.0, 10.0, 270.0]);
        let at = |x: usize, y: usize| h[y * 5 + x];
        // Corners are never rewritten
        assert_eq!(at(0, 0), 10.0);
        assert_eq!(at(4, 0), 90.0);
        assert_eq!(at(0, 4), 10.0);
        assert_eq!(at(4, 4), 270.0);
        // The top-level diamond and square cells become sub-square corners
        // and survive the recursion untouched.
        assert_eq!(at(2, 2), 95.0);
        assert_eq!(at(2, 0), (10.0 + 90.0 + 95.0) / 3.0);
        assert_eq!(at(2, 4), (10.0 + 270.0 + 95.0) / 3.0);
        assert_eq!(at(0, 2), (10.0 + 10.0 + 95.0) / 3.0);
        assert_eq!(at(4, 2), (90.0 + 270.0 + 95.0) / 3.0);
    }

    #[test]
    #[should_panic(expected = "2^n + 1")]
    fn non_lattice_size_is_a_caller_bug() {
        let mut rng = StdRng::seed_from_u64(0);
        zero_fuzz(&mut rng, 16, [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn wilderness_is_reproducible() {
        let mut cfg = WorldConfig::default();
        cfg.wilderness_size = 65; // keep the test fast
        let build = |seed: u64, cfg: &WorldConfig| {
            let mut rng = StdRng::seed_from_u64(seed);
            generate(&mut rng, cfg)
                .tiles
                .iter()
                .map(|t| t.kind())
                .collect::<Vec<_>>()
        };
        assert_eq!(build(5, &cfg), build(5, &cfg));
    }

    #[test]
    fn border_is_sealed_water() {
        let mut cfg = WorldConfig::default();
        cfg.wilderness_size = 33;
        let mut rng = StdRng::seed_from_u64(9);
        let map = generate(&mut rng, &cfg);
        for x in 0..map.width {
            assert_eq!(map.kind_at(x, 0), Some(TileKind::WorldBorder));
            assert_eq!(map.kind_at(x, map.height - 1), Some(TileKind::WorldBorder));
        }
    }

    #[test]
    fn rivers_have_no_diagonal_gaps() {
        let mut cfg = WorldConfig::default();
        cfg.wilderness_size = 65;
        let mut rng = StdRng::seed_from_u64(41);
        let map = generate(&mut rng, &cfg);
        for y in 0..map.height - 1 {
            for x in 1..map.width - 1 {
                if map.kind_at(x, y) != Some(TileKind::Water) {
                    continue;
                }
                if map.kind_at(x + 1, y + 1) == Some(TileKind::Water) {
                    assert!(
                        is_water(&map, x + 1, y) || is_water(&map, x, y + 1),
                        "diagonal water gap at ({x},{y})"
                    );
                }
                if map.kind_at(x - 1, y + 1) == Some(TileKind::Water) {
                    assert!(
                        is_water(&map, x - 1, y) || is_water(&map, x, y + 1),
                        "diagonal water gap at ({x},{y})"
                    );
                }
            }
        }
    }

    #[test]
    fn vegetation_rule_erodes_a_solid_block() {
        // 3x3 tree block on grass: the corners see three trees and die in
        // the first generation; the remaining plus-shape arms see three and
        // die in the second; the center holds at exactly four.
        let mut map = Map::filled(9, 9, TileType::Grass);
        for y in 3..=5 {
            for x in 3..=5 {
                map.set_tile(x, y, TileType::Tree);
            }
        }
        clump_vegetation(&mut map, 2);
        for y in 0..9 {
            for x in 0..9 {
                let expect = if x == 4 && y == 4 {
                    TileKind::Tree
                } else {
                    TileKind::Grass
                };
                assert_eq!(map.kind_at(x, y), Some(expect), "at ({x},{y})");
            }
        }
    }
}
