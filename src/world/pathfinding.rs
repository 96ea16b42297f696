//! Pathfinding
//!
//! Weighted shortest paths (A*) and full-map distance fields (Dijkstra maps)
//! over per-tile-kind cost tables. Tiles absent from the table are
//! impassable. Unreachable goals yield empty results, never errors; callers
//! branch on emptiness.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::map::{Map, Position, DIR4, DIR8};
use super::tile::TileKind;

/// Traversal costs per tile kind. Lookup only; iteration order never feeds
/// the RNG, so a hash map is safe here.
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    costs: HashMap<TileKind, f32>,
}

impl CostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: TileKind, cost: f32) -> Self {
        assert!(cost >= 0.0, "tile costs must be non-negative");
        self.costs.insert(kind, cost);
        self
    }

    pub fn remove(mut self, kind: TileKind) -> Self {
        self.costs.remove(&kind);
        self
    }

    pub fn cost(&self, kind: TileKind) -> Option<f32> {
        self.costs.get(&kind).copied()
    }

    fn min_cost(&self) -> f32 {
        self.costs.values().fold(f32::INFINITY, |a, &b| a.min(b))
    }

    /// Costs for an ordinary walker inside a dungeon level. Doors cost more
    /// than open floor so paths prefer existing openings over detours.
    pub fn dungeon_walk() -> Self {
        Self::new()
            .with(TileKind::Floor, 1.0)
            .with(TileKind::StoneFloor, 1.0)
            .with(TileKind::Door, 2.0)
            .with(TileKind::GateTrigger, 1.0)
            .with(TileKind::StairsUp, 1.0)
            .with(TileKind::StairsDown, 1.0)
            .with(TileKind::Rubble, 1.5)
            .with(TileKind::Bones, 1.0)
            .with(TileKind::Brazier, 1.0)
    }

    /// Costs for overland travel. Water is crossable but expensive, which is
    /// what makes the ancient road hug the shore instead of fording rivers.
    pub fn overland_walk() -> Self {
        Self::new()
            .with(TileKind::Grass, 1.0)
            .with(TileKind::Dirt, 1.0)
            .with(TileKind::Sand, 1.2)
            .with(TileKind::Tree, 2.0)
            .with(TileKind::StoneFloor, 1.0)
            .with(TileKind::Water, 4.0)
            .with(TileKind::Portal, 1.0)
            .with(TileKind::Door, 1.5)
    }
}

/// Frontier entry. Ordering is reversed so the std max-heap pops the lowest
/// priority first, with ties broken by insertion sequence for reproducible
/// expansion order.
#[derive(Debug, Clone, Copy)]
struct Node {
    priority: f32,
    seq: u64,
    pos: Position,
    g: f32,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

fn step_dirs(diagonal: bool) -> &'static [(i32, i32)] {
    if diagonal {
        &DIR8
    } else {
        &DIR4
    }
}

/// Lowest-total-cost path from `start` to `goal`, inclusive of both ends.
/// Returns an empty vector when no path exists or either endpoint is
/// out of bounds or uncosted.
pub fn astar(
    map: &Map,
    start: Position,
    goal: Position,
    costs: &CostTable,
    diagonal: bool,
) -> Vec<Position> {
    let endpoints_ok = [start, goal].iter().all(|p| {
        map.kind_at(p.x, p.y)
            .map_or(false, |k| costs.cost(k).is_some())
    });
    if !endpoints_ok {
        return Vec::new();
    }

    let min_cost = costs.min_cost();
    let h = |p: Position| -> f32 {
        let d = if diagonal {
            p.chebyshev(&goal)
        } else {
            p.manhattan(&goal)
        };
        d as f32 * min_cost
    };

    let mut g_score = vec![f32::INFINITY; map.tiles.len()];
    let mut came_from: Vec<Option<Position>> = vec![None; map.tiles.len()];
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;

    g_score[map.xy_to_idx(start.x, start.y)] = 0.0;
    heap.push(Node {
        priority: h(start),
        seq,
        pos: start,
        g: 0.0,
    });

    while let Some(node) = heap.pop() {
        let idx = map.xy_to_idx(node.pos.x, node.pos.y);
        if node.g > g_score[idx] {
            continue; // stale entry
        }
        if node.pos == goal {
            let mut path = vec![goal];
            let mut cur = goal;
            while let Some(prev) = came_from[map.xy_to_idx(cur.x, cur.y)] {
                path.push(prev);
                cur = prev;
            }
            path.reverse();
            return path;
        }

        for (dx, dy) in step_dirs(diagonal) {
            let nx = node.pos.x + dx;
            let ny = node.pos.y + dy;
            let Some(kind) = map.kind_at(nx, ny) else {
                continue;
            };
            let Some(step) = costs.cost(kind) else {
                continue;
            };
            let nidx = map.xy_to_idx(nx, ny);
            let tentative = node.g + step;
            if tentative < g_score[nidx] {
                g_score[nidx] = tentative;
                came_from[nidx] = Some(node.pos);
                seq += 1;
                let npos = Position::new(nx, ny);
                heap.push(Node {
                    priority: tentative + h(npos),
                    seq,
                    pos: npos,
                    g: tentative,
                });
            }
        }
    }

    Vec::new()
}

/// Shortest cost from every reachable cell to the nearest goal, bounded by
/// `max_cost`. Unreached cells hold infinity.
#[derive(Debug, Clone)]
pub struct DistanceField {
    width: i32,
    height: i32,
    dist: Vec<f32>,
}

impl DistanceField {
    pub fn get(&self, pos: Position) -> Option<f32> {
        if pos.x < 0 || pos.x >= self.width || pos.y < 0 || pos.y >= self.height {
            return None;
        }
        let d = self.dist[(pos.y * self.width + pos.x) as usize];
        if d.is_finite() {
            Some(d)
        } else {
            None
        }
    }

    pub fn is_reachable(&self, pos: Position) -> bool {
        self.get(pos).is_some()
    }

    /// The neighbor with the strictly lowest cost, if any is lower than the
    /// cell itself. Scans neighbors in a fixed order so gradient descent is
    /// reproducible. This is how the ancient road follows the field.
    pub fn descend(&self, pos: Position) -> Option<Position> {
        let here = self.get(pos)?;
        let mut best: Option<(f32, Position)> = None;
        for (dx, dy) in DIR8 {
            let n = Position::new(pos.x + dx, pos.y + dy);
            if let Some(d) = self.get(n) {
                if d < here && best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, n));
                }
            }
        }
        best.map(|(_, p)| p)
    }
}

/// Compute a Dijkstra map from one or more goal cells.
///
/// # Panics
/// Panics on a negative `max_cost`; that is a caller bug, not a runtime
/// generation failure.
pub fn dijkstra_map(
    map: &Map,
    goals: &[Position],
    costs: &CostTable,
    max_cost: f32,
    diagonal: bool,
) -> DistanceField {
    assert!(max_cost >= 0.0, "negative distance bound");

    let mut dist = vec![f32::INFINITY; map.tiles.len()];
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;

    for goal in goals {
        let Some(kind) = map.kind_at(goal.x, goal.y) else {
            continue;
        };
        if costs.cost(kind).is_none() {
            continue;
        }
        let idx = map.xy_to_idx(goal.x, goal.y);
        if dist[idx] > 0.0 {
            dist[idx] = 0.0;
            heap.push(Node {
                priority: 0.0,
                seq,
                pos: *goal,
                g: 0.0,
            });
            seq += 1;
        }
    }

    while let Some(node) = heap.pop() {
        let idx = map.xy_to_idx(node.pos.x, node.pos.y);
        if node.g > dist[idx] {
            continue;
        }
        for (dx, dy) in step_dirs(diagonal) {
            let nx = node.pos.x + dx;
            let ny = node.pos.y + dy;
            let Some(kind) = map.kind_at(nx, ny) else {
                continue;
            };
            let Some(step) = costs.cost(kind) else {
                continue;
            };
            let tentative = node.g + step;
            if tentative > max_cost {
                continue;
            }
            let nidx = map.xy_to_idx(nx, ny);
            if tentative < dist[nidx] {
                dist[nidx] = tentative;
                heap.push(Node {
                    priority: tentative,
                    seq,
                    pos: Position::new(nx, ny),
                    g: tentative,
                });
                seq += 1;
            }
        }
    }

    DistanceField {
        width: map.width,
        height: map.height,
        dist,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::TileType;

    fn open_map(width: i32, height: i32) -> Map {
        Map::filled(width, height, TileType::Floor)
    }

    fn floors_only() -> CostTable {
        CostTable::new().with(TileKind::Floor, 1.0)
    }

    #[test]
    fn astar_matches_dijkstra_on_uniform_grid() {
        let map = open_map(10, 6);
        let costs = floors_only();
        let start = Position::new(1, 1);
        let goal = Position::new(8, 4);

        let path = astar(&map, start, goal, &costs, true);
        assert!(!path.is_empty());
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        // Uniform unit costs: path cost is its step count, which equals the
        // Chebyshev distance on an open grid.
        let path_cost = (path.len() - 1) as f32;
        assert_eq!(path_cost, start.chebyshev(&goal) as f32);

        let field = dijkstra_map(&map, &[goal], &costs, f32::INFINITY, true);
        assert_eq!(field.get(start), Some(path_cost));
    }

    #[test]
    fn sealed_wall_means_empty_path() {
        let mut map = open_map(9, 9);
        for y in 0..9 {
            map.set_tile(4, y, TileType::Wall);
        }
        let path = astar(
            &map,
            Position::new(1, 4),
            Position::new(7, 4),
            &floors_only(),
            true,
        );
        assert!(path.is_empty());
    }

    #[test]
    fn out_of_bounds_endpoints_are_unreachable_not_errors() {
        let map = open_map(5, 5);
        let costs = floors_only();
        assert!(astar(&map, Position::new(-1, 0), Position::new(2, 2), &costs, true).is_empty());
        assert!(astar(&map, Position::new(2, 2), Position::new(9, 9), &costs, true).is_empty());
    }

    #[test]
    fn uncosted_tile_kind_is_impassable() {
        let mut map = open_map(7, 3);
        map.set_tile(3, 0, TileType::Water);
        map.set_tile(3, 1, TileType::Water);
        map.set_tile(3, 2, TileType::Water);
        let path = astar(
            &map,
            Position::new(1, 1),
            Position::new(5, 1),
            &floors_only(),
            true,
        );
        assert!(path.is_empty());
    }

    /// Every simple path on a tiny grid, by exhaustive walk.
    fn brute_force_min_cost(
        map: &Map,
        costs: &CostTable,
        pos: Position,
        goal: Position,
        visited: &mut Vec<Position>,
        spent: f32,
        best: &mut f32,
    ) {
        if pos == goal {
            *best = best.min(spent);
            return;
        }
        for (dx, dy) in DIR8 {
            let n = Position::new(pos.x + dx, pos.y + dy);
            if visited.contains(&n) {
                continue;
            }
            let Some(kind) = map.kind_at(n.x, n.y) else {
                continue;
            };
            let Some(step) = costs.cost(kind) else {
                continue;
            };
            visited.push(n);
            brute_force_min_cost(map, costs, n, goal, visited, spent + step, best);
            visited.pop();
        }
    }

    #[test]
    fn astar_is_optimal_on_mixed_costs() {
        let mut map = Map::filled(4, 3, TileType::Rubble);
        for x in 0..4 {
            map.set_tile(x, 0, TileType::Floor);
        }
        let costs = CostTable::new()
            .with(TileKind::Floor, 1.0)
            .with(TileKind::Rubble, 5.0);
        let start = Position::new(0, 2);
        let goal = Position::new(3, 2);

        let path = astar(&map, start, goal, &costs, true);
        assert!(!path.is_empty());
        let path_cost: f32 = path[1..]
            .iter()
            .map(|p| costs.cost(map.kind_at(p.x, p.y).unwrap()).unwrap())
            .sum();

        let mut best = f32::INFINITY;
        let mut visited = vec![start];
        brute_force_min_cost(&map, &costs, start, goal, &mut visited, 0.0, &mut best);
        assert_eq!(path_cost, best);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let mut map = open_map(12, 12);
        map.set_tile(5, 5, TileType::Wall);
        map.set_tile(6, 5, TileType::Wall);
        let costs = floors_only();
        let a = astar(&map, Position::new(1, 1), Position::new(10, 10), &costs, true);
        let b = astar(&map, Position::new(1, 1), Position::new(10, 10), &costs, true);
        assert_eq!(a, b);
    }

    #[test]
    fn bounded_field_stops_at_radius() {
        let map = open_map(20, 3);
        let field = dijkstra_map(
            &map,
            &[Position::new(0, 1)],
            &floors_only(),
            5.0,
            true,
        );
        assert_eq!(field.get(Position::new(5, 1)), Some(5.0));
        assert_eq!(field.get(Position::new(6, 1)), None);
    }

    #[test]
    fn descend_follows_the_gradient_home() {
        let map = open_map(10, 10);
        let goal = Position::new(2, 2);
        let field = dijkstra_map(&map, &[goal], &floors_only(), f32::INFINITY, true);
        let mut cur = Position::new(8, 7);
        let mut steps = 0;
        while let Some(next) = field.descend(cur) {
            cur = next;
            steps += 1;
            assert!(steps < 100, "descent must terminate");
        }
        assert_eq!(cur, goal);
    }

    #[test]
    #[should_panic(expected = "negative distance bound")]
    fn negative_bound_is_a_caller_bug() {
        let map = open_map(3, 3);
        dijkstra_map(&map, &[Position::new(1, 1)], &floors_only(), -1.0, true);
    }
}
