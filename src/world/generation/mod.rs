//! Procedural campaign generation
//!
//! The pipeline runs Wilderness, then Town, then the main dungeon, then
//! vaults and features per level, each stage mutating the maps the previous
//! stage produced. The region finder and pathfinder are the shared
//! utilities nearly every stage leans on.

pub mod caves;
pub mod maze;
pub mod rooms;
pub mod tower;
pub mod town;
pub mod vaults;
pub mod wilderness;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::data::WorldConfig;
use crate::game::history::FactDb;
use crate::game::objects::{ItemSpec, Loc, ObjectDb};
use crate::world::dungeon::{Campaign, Dungeon, MAIN_DUNGEON_ID, OVERWORLD_ID};
use crate::world::map::{Map, Position, DIR8};
use crate::world::pathfinding::{dijkstra_map, CostTable};
use crate::world::region::Region;
use crate::world::tile::{TileKind, TileType};
use crate::world::WorldGenError;

const OVERWORLD_ATTEMPTS: u32 = 5;

const SPAWN_DECKS: [&str; 5] = ["vermin", "kobold-warrens", "restless-dead", "deep-cult", "abyssal"];

const ARRIVAL_MESSAGES: [&str; 5] = [
    "Cold air rises from the dark below.",
    "The walls here are older than the town above.",
    "Something scratches behind the stonework.",
    "The torch smoke refuses to rise.",
    "The dark here has weight.",
];

/// Generate a whole campaign from one seed. Bit-for-bit reproducible: the
/// same seed and configuration always yield identical maps.
pub fn generate_campaign(
    seed: u64,
    cfg: &WorldConfig,
    objects: &mut ObjectDb,
) -> Result<Campaign, WorldGenError> {
    cfg.validate().map_err(WorldGenError::InvalidConfig)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut facts = FactDb::seeded(&mut rng);

    // Generate-validate-retry: a wilderness whose main valley is a puddle
    // gets thrown away.
    let (mut overworld, valley) = viable_overworld(&mut rng, cfg)?;

    let town = town::create_town(&mut overworld, &mut rng, &valley, &mut facts, cfg);

    let entrance = pick_dungeon_entrance(&overworld, &mut rng, &valley, &town);
    facts.record(
        "a sealed delve was found in the mountains",
        0,
        Some(Loc::new(OVERWORLD_ID, 0, entrance)),
    );

    let main_dungeon = build_main_dungeon(&mut rng, cfg, &mut facts, objects, &town.name);

    draw_ancient_road(&mut overworld, &mut rng, entrance, &town);
    overworld.set_tile(entrance.x, entrance.y, TileType::Portal);

    Ok(Campaign {
        seed,
        wilderness: overworld,
        town,
        dungeons: vec![main_dungeon],
        facts,
        dungeon_entrance: entrance,
    })
}

/// Roll wilderness maps until one has a main valley big enough to hold a
/// town and a dungeon entrance.
fn viable_overworld(
    rng: &mut StdRng,
    cfg: &WorldConfig,
) -> Result<(Map, Region), WorldGenError> {
    let min_valley = (cfg.wilderness_size * cfg.wilderness_size) / 10;
    for attempt in 0..OVERWORLD_ATTEMPTS {
        let map = wilderness::generate(rng, cfg);
        let valleys = wilderness::find_valleys(&map);
        let Some(main) = valleys.iter().max_by_key(|v| v.len()) else {
            continue;
        };
        if main.len() >= min_valley {
            return Ok((map, main.clone()));
        }
        log::debug!(
            "overworld attempt {attempt}: main valley only {} cells, rerolling",
            main.len()
        );
    }
    Err(WorldGenError::ExhaustedRetries(OVERWORLD_ATTEMPTS))
}

/// The dungeon entrance wants to sit nestled into the mountains. Relax the
/// nestling requirement rather than fail.
fn pick_dungeon_entrance(
    map: &Map,
    rng: &mut StdRng,
    valley: &Region,
    town: &town::Town,
) -> Position {
    let (tx1, ty1, tx2, ty2) = town.boundary;
    let in_town =
        |p: &Position| p.x >= tx1 - 2 && p.x <= tx2 + 2 && p.y >= ty1 - 2 && p.y <= ty2 + 2;

    for required in [4, 2, 0] {
        let options: Vec<Position> = valley
            .cells()
            .iter()
            .copied()
            .filter(|p| !in_town(p))
            .filter(|p| {
                matches!(
                    map.kind_at(p.x, p.y),
                    Some(TileKind::Grass | TileKind::Dirt | TileKind::Sand | TileKind::Tree)
                )
            })
            .filter(|p| wilderness::count_adjacent_mountains(map, *p) >= required)
            .collect();
        if !options.is_empty() {
            return options[rng.gen_range(0..options.len())];
        }
    }

    // Valley cells exist by construction, so this is unreachable in
    // practice; take the first cell rather than panic.
    valley.cells()[0]
}

/// Level styles of the main dungeon.
fn build_level_for_depth(rng: &mut StdRng, cfg: &WorldConfig, depth: usize) -> Map {
    let roll = rng.gen_range(0..100);
    if depth >= 2 && roll < 30 {
        tower::build_level(rng, cfg)
    } else if roll < 55 {
        caves::build_level(rng, cfg)
    } else {
        rooms::build_level(rng, cfg)
    }
}

fn build_main_dungeon(
    rng: &mut StdRng,
    cfg: &WorldConfig,
    facts: &mut FactDb,
    objects: &mut ObjectDb,
    town_name: &str,
) -> Dungeon {
    let mut dungeon = Dungeon::new(MAIN_DUNGEON_ID, format!("The Undervaults of {town_name}"));

    let mut levels: Vec<Map> = (0..cfg.dungeon_depth)
        .map(|depth| build_level_for_depth(rng, cfg, depth))
        .collect();

    let arrivals = link_stairs(&mut levels, rng);

    for (ix, map) in levels.iter_mut().enumerate() {
        // Features first: vault key placement must see the statues and
        // braziers that change where a walker can stand.
        add_features(map, rng, facts, objects, ix);

        let placed = vaults::place_vaults(
            map,
            rng,
            MAIN_DUNGEON_ID,
            ix,
            arrivals[ix],
            objects,
            cfg,
        );
        for vault in &placed {
            facts.record(
                "a sealed chamber was walled off",
                0,
                Some(Loc::new(MAIN_DUNGEON_ID, ix, vault.entrance)),
            );
        }

        dungeon
            .arrival_messages
            .push(ARRIVAL_MESSAGES[ix % ARRIVAL_MESSAGES.len()].to_string());
        dungeon
            .spawn_decks
            .push(SPAWN_DECKS[ix.min(SPAWN_DECKS.len() - 1)].to_string());
    }

    dungeon.levels = levels;
    dungeon
}

/// Stepwise tunnel between two interior cells. Both coordinates move toward
/// the target each iteration, so the tunnel never leaves the rectangle
/// spanned by its endpoints and cannot breach the map border.
pub(crate) fn carve_tunnel(map: &mut Map, from: Position, to: Position) {
    let mut x = from.x;
    let mut y = from.y;
    while x != to.x || y != to.y {
        if x < to.x {
            x += 1;
        } else if x > to.x {
            x -= 1;
        }
        if map.kind_at(x, y) == Some(TileKind::Wall) {
            map.set_tile(x, y, TileType::Floor);
        }
        if y < to.y {
            y += 1;
        } else if y > to.y {
            y -= 1;
        }
        if map.kind_at(x, y) == Some(TileKind::Wall) {
            map.set_tile(x, y, TileType::Floor);
        }
    }
}

/// Open floor cells shared by two adjacent levels, so stairs line up.
fn shared_open_cells(a: &Map, b: &Map) -> Vec<Position> {
    a.positions()
        .filter(|p| a.kind_at(p.x, p.y) == Some(TileKind::Floor))
        .filter(|p| b.kind_at(p.x, p.y) == Some(TileKind::Floor))
        .collect()
}

/// Place the entrance stairs and link each level to the next, preferring
/// aligned stair positions. Returns each level's arrival cell.
fn link_stairs(levels: &mut [Map], rng: &mut StdRng) -> Vec<Position> {
    let mut arrivals = Vec::with_capacity(levels.len());

    let open0: Vec<Position> = levels[0]
        .positions()
        .filter(|p| levels[0].kind_at(p.x, p.y) == Some(TileKind::Floor))
        .collect();
    // Levels always carve floor, so open0 is never empty; guard anyway.
    let up = if open0.is_empty() {
        Position::new(1, 1)
    } else {
        open0[rng.gen_range(0..open0.len())]
    };
    levels[0].set_tile(up.x, up.y, TileType::StairsUp);
    arrivals.push(up);

    for n in 0..levels.len() - 1 {
        let (upper, lower) = {
            let (a, b) = levels.split_at_mut(n + 1);
            (&mut a[n], &mut b[0])
        };
        let shared = shared_open_cells(upper, lower);
        let stairs = if shared.is_empty() {
            // No aligned spot; land wherever the lower level has floor.
            log::debug!("levels {n} and {} have no aligned stair cell", n + 1);
            let open: Vec<Position> = lower
                .positions()
                .filter(|p| lower.kind_at(p.x, p.y) == Some(TileKind::Floor))
                .collect();
            let p = if open.is_empty() {
                Position::new(1, 1)
            } else {
                open[rng.gen_range(0..open.len())]
            };
            upper_fallback_stairs(upper, p);
            p
        } else {
            let p = shared[rng.gen_range(0..shared.len())];
            upper.set_tile(p.x, p.y, TileType::StairsDown);
            p
        };
        lower.set_tile(stairs.x, stairs.y, TileType::StairsUp);
        arrivals.push(stairs);
    }

    arrivals
}

/// Unaligned fallback: the upper level still needs a way down somewhere,
/// as close to where the lower level's stairs landed as it can get.
fn upper_fallback_stairs(upper: &mut Map, preferred: Position) {
    let open: Vec<Position> = upper
        .positions()
        .filter(|p| upper.kind_at(p.x, p.y) == Some(TileKind::Floor))
        .collect();
    let Some(down) = open
        .iter()
        .min_by_key(|p| (p.manhattan(&preferred), p.y, p.x))
    else {
        return;
    };
    upper.set_tile(down.x, down.y, TileType::StairsDown);
}

/// A cell where even an impassable decoration cannot block movement: open
/// floor whose eight neighbors are all open floor, so walkers route around
/// it.
fn is_decoration_spot(map: &Map, p: Position) -> bool {
    if map.kind_at(p.x, p.y) != Some(TileKind::Floor) {
        return false;
    }
    DIR8
        .iter()
        .all(|(dx, dy)| map.kind_at(p.x + dx, p.y + dy) == Some(TileKind::Floor))
}

/// Low-density flavor: rubble and bones everywhere, plus the occasional
/// statue or journal that leans on recorded history for its subject.
fn add_features(
    map: &mut Map,
    rng: &mut StdRng,
    facts: &mut FactDb,
    objects: &mut ObjectDb,
    level_ix: usize,
) {
    for y in 1..map.height - 1 {
        for x in 1..map.width - 1 {
            if map.kind_at(x, y) != Some(TileKind::Floor) {
                continue;
            }
            if rng.gen_bool(0.02) {
                let tile_type = if rng.gen_bool(0.5) {
                    TileType::Rubble
                } else {
                    TileType::Bones
                };
                map.set_tile(x, y, tile_type);
            }
        }
    }

    let spots: Vec<Position> = map
        .positions()
        .filter(|p| is_decoration_spot(map, *p))
        .collect();
    if spots.is_empty() {
        return;
    }

    if rng.gen_bool(0.4) {
        let p = spots[rng.gen_range(0..spots.len())];
        map.set_tile(p.x, p.y, TileType::Statue);
        if let Some(ruler) = facts.latest_ruler() {
            let detail = format!("a statue of {} {} stands below", ruler.name, ruler.title);
            facts.record(detail, 0, Some(Loc::new(MAIN_DUNGEON_ID, level_ix, p)));
        }
    }

    if rng.gen_bool(0.5) {
        let p = spots[rng.gen_range(0..spots.len())];
        if map.kind_at(p.x, p.y) == Some(TileKind::Floor) {
            let name = match facts.random_fact(rng) {
                Some(fact) => format!("weathered journal ({})", fact.detail),
                None => "weathered journal".to_string(),
            };
            objects.set_item_at(ItemSpec::new(name, '?'), Loc::new(MAIN_DUNGEON_ID, level_ix, p));
        }
    }

    if rng.gen_bool(0.3) {
        let p = spots[rng.gen_range(0..spots.len())];
        if map.kind_at(p.x, p.y) == Some(TileKind::Floor) {
            map.set_tile(p.x, p.y, TileType::Brazier);
        }
    }
}

/// Trace the most likely ancient road from the dungeon entrance toward the
/// town square by walking down the distance field, and let it trail off the
/// further it gets.
fn draw_ancient_road(map: &mut Map, rng: &mut StdRng, entrance: Position, town: &town::Town) {
    let goals: Vec<Position> = if town.square.is_empty() {
        let (x1, y1, x2, y2) = town.boundary;
        vec![Position::new((x1 + x2) / 2, (y1 + y2) / 2)]
    } else {
        town.square.clone()
    };

    let field = dijkstra_map(map, &goals, &CostTable::overland_walk(), f32::INFINITY, true);
    if !field.is_reachable(entrance) {
        log::debug!("dungeon entrance is cut off from town, no road drawn");
        return;
    }

    let mut draw_chance = 1.0f64;
    let mut cur = entrance;
    while let Some(next) = field.descend(cur) {
        if field.get(next) == Some(0.0) {
            break; // reached the square
        }
        let kind = map.kind_at(next.x, next.y);
        let wet = matches!(kind, Some(TileKind::Water | TileKind::DeepWater));
        if !wet && kind != Some(TileKind::StoneFloor) && rng.gen_bool(draw_chance.max(0.0)) {
            map.set_tile(next.x, next.y, TileType::StoneFloor);
            draw_chance -= 0.05;
        }
        if draw_chance <= 0.1 {
            break; // the old road has long since crumbled away
        }
        cur = next;
    }
}
