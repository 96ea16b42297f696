//! Town building
//!
//! The town sits in the overworld's main valley: a handful of walled
//! buildings around a paved square. Buildings are randomly proposed and
//! validated like dungeon rooms; a town short a house or two is fine.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::WorldConfig;
use crate::game::history::FactDb;
use crate::game::objects::Loc;
use crate::world::dungeon::OVERWORLD_ID;
use crate::world::map::{Map, Position};
use crate::world::region::Region;
use crate::world::tile::{TileKind, TileType};

const TOWN_NAMES: [&str; 8] = [
    "Duskfell", "Bleakmoor", "Harrowgate", "Thornwick", "Greyford", "Mirebrook", "Coldhaven",
    "Ashdale",
];

const TAVERN_NAMES: [&str; 6] = [
    "The Drowned Rat",
    "The Broken Antler",
    "The Last Lantern",
    "The Crooked Stave",
    "The Hanged Crow",
    "The Mossy Flagon",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingKind {
    Tavern,
    Smithy,
    Shrine,
    Home,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub kind: BuildingKind,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub door: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Town {
    pub name: String,
    pub tavern_name: String,
    /// Inclusive bounds: (x1, y1, x2, y2).
    pub boundary: (i32, i32, i32, i32),
    pub square: Vec<Position>,
    pub buildings: Vec<Building>,
}

const TOWN_W: i32 = 36;
const TOWN_H: i32 = 24;

fn is_land(map: &Map, x: i32, y: i32) -> bool {
    matches!(
        map.kind_at(x, y),
        Some(TileKind::Grass | TileKind::Tree | TileKind::Dirt | TileKind::Sand)
    )
}

/// Choose a town site inside the valley and build the town onto the map.
pub fn create_town(
    map: &mut Map,
    rng: &mut StdRng,
    valley: &Region,
    facts: &mut FactDb,
    _cfg: &WorldConfig,
) -> Town {
    let site = choose_site(map, rng, valley);
    let (tx, ty) = site;
    let boundary = (tx, ty, tx + TOWN_W - 1, ty + TOWN_H - 1);

    let name = (*TOWN_NAMES.choose(rng).unwrap()).to_string();
    let tavern_name = (*TAVERN_NAMES.choose(rng).unwrap()).to_string();

    // The square first, so buildings crowd around it.
    let square = pave_square(map, boundary);

    let plan = [
        BuildingKind::Tavern,
        BuildingKind::Smithy,
        BuildingKind::Shrine,
        BuildingKind::Home,
        BuildingKind::Home,
        BuildingKind::Home,
    ];
    let mut buildings = Vec::new();
    for kind in plan {
        if let Some(b) = place_building(map, rng, boundary, &buildings, kind) {
            buildings.push(b);
        }
    }

    let center = Position::new(tx + TOWN_W / 2, ty + TOWN_H / 2);
    facts.record(
        format!("the town of {name} was founded"),
        0,
        Some(Loc::new(OVERWORLD_ID, 0, center)),
    );
    if let Some(tavern) = buildings.iter().find(|b| b.kind == BuildingKind::Tavern) {
        facts.record(
            format!("{tavern_name} opened its doors"),
            0,
            Some(Loc::new(OVERWORLD_ID, 0, tavern.door)),
        );
    }

    Town {
        name,
        tavern_name,
        boundary,
        square,
        buildings,
    }
}

/// Scan for rectangles that are mostly land and mostly inside the valley,
/// then pick one at random. Falls back to the valley's first cell when the
/// terrain offers nothing better.
fn choose_site(map: &Map, rng: &mut StdRng, valley: &Region) -> (i32, i32) {
    let mut candidates: Vec<(i32, i32)> = Vec::new();
    let mut y = 1;
    while y + TOWN_H < map.height - 1 {
        let mut x = 1;
        while x + TOWN_W < map.width - 1 {
            if site_fits(map, valley, x, y) {
                candidates.push((x, y));
            }
            x += 4;
        }
        y += 4;
    }

    if !candidates.is_empty() {
        return candidates[rng.gen_range(0..candidates.len())];
    }
    log::warn!("no clean town site found, settling on rough ground");
    let p = valley.cells()[0];
    (
        p.x.clamp(1, map.width - TOWN_W - 2),
        p.y.clamp(1, map.height - TOWN_H - 2),
    )
}

fn site_fits(map: &Map, valley: &Region, x: i32, y: i32) -> bool {
    let mut land = 0;
    for cy in y..y + TOWN_H {
        for cx in x..x + TOWN_W {
            if !valley.contains(Position::new(cx, cy)) {
                return false;
            }
            if is_land(map, cx, cy) {
                land += 1;
            }
        }
    }
    land * 10 >= TOWN_W * TOWN_H * 9
}

fn pave_square(map: &mut Map, boundary: (i32, i32, i32, i32)) -> Vec<Position> {
    let (x1, y1, x2, y2) = boundary;
    let cx = (x1 + x2) / 2;
    let cy = (y1 + y2) / 2;
    let mut square = Vec::new();
    for y in cy - 3..=cy + 3 {
        for x in cx - 4..=cx + 4 {
            if is_land(map, x, y) {
                map.set_tile(x, y, TileType::StoneFloor);
                square.push(Position::new(x, y));
            }
        }
    }
    square
}

/// Propose-and-validate building placement inside the town boundary.
fn place_building(
    map: &mut Map,
    rng: &mut StdRng,
    boundary: (i32, i32, i32, i32),
    existing: &[Building],
    kind: BuildingKind,
) -> Option<Building> {
    let (bx1, by1, bx2, by2) = boundary;

    for _ in 0..50 {
        let w = rng.gen_range(6..=10);
        let h = rng.gen_range(5..=8);
        if bx2 - bx1 < w + 2 || by2 - by1 < h + 2 {
            return None;
        }
        let x1 = rng.gen_range(bx1 + 1..=bx2 - w - 1);
        let y1 = rng.gen_range(by1 + 1..=by2 - h - 1);
        let (x2, y2) = (x1 + w - 1, y1 + h - 1);

        let clear = (y1 - 1..=y2 + 1).all(|y| {
            (x1 - 1..=x2 + 1).all(|x| {
                is_land(map, x, y)
                    && !existing.iter().any(|b| {
                        x >= b.x1 - 1 && x <= b.x2 + 1 && y >= b.y1 - 1 && y <= b.y2 + 1
                    })
            })
        });
        if !clear {
            continue;
        }

        for y in y1..=y2 {
            for x in x1..=x2 {
                let edge = x == x1 || x == x2 || y == y1 || y == y2;
                let tile_type = if edge { TileType::Wall } else { TileType::Floor };
                map.set_tile(x, y, tile_type);
            }
        }

        // One door, on a random side, never in a corner.
        let door = match rng.gen_range(0..4) {
            0 => Position::new(rng.gen_range(x1 + 1..x2), y1),
            1 => Position::new(rng.gen_range(x1 + 1..x2), y2),
            2 => Position::new(x1, rng.gen_range(y1 + 1..y2)),
            _ => Position::new(x2, rng.gen_range(y1 + 1..y2)),
        };
        map.set_tile(door.x, door.y, TileType::door());

        return Some(Building {
            kind,
            x1,
            y1,
            x2,
            y2,
            door,
        });
    }

    log::debug!("no room for another {kind:?} in town");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::generation::wilderness;
    use rand::SeedableRng;

    fn town_fixture(seed: u64) -> (Map, Town) {
        let mut cfg = WorldConfig::default();
        cfg.wilderness_size = 129;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut map = wilderness::generate(&mut rng, &cfg);
        let valleys = wilderness::find_valleys(&map);
        let valley = valleys
            .iter()
            .max_by_key(|v| v.len())
            .expect("wilderness always has land")
            .clone();
        let mut facts = FactDb::default();
        let town = create_town(&mut map, &mut rng, &valley, &mut facts, &cfg);
        (map, town)
    }

    #[test]
    fn buildings_stay_inside_the_boundary() {
        let (_, town) = town_fixture(21);
        let (x1, y1, x2, y2) = town.boundary;
        for b in &town.buildings {
            assert!(b.x1 > x1 && b.x2 < x2 && b.y1 > y1 && b.y2 < y2);
        }
    }

    #[test]
    fn every_building_door_opens_through_its_wall() {
        let (map, town) = town_fixture(22);
        for b in &town.buildings {
            assert_eq!(map.kind_at(b.door.x, b.door.y), Some(TileKind::Door));
            let on_edge = b.door.x == b.x1
                || b.door.x == b.x2
                || b.door.y == b.y1
                || b.door.y == b.y2;
            assert!(on_edge, "door {:?} not in the building shell", b.door);
        }
    }

    #[test]
    fn town_records_its_founding() {
        let mut cfg = WorldConfig::default();
        cfg.wilderness_size = 129;
        let mut rng = StdRng::seed_from_u64(23);
        let mut map = wilderness::generate(&mut rng, &cfg);
        let valleys = wilderness::find_valleys(&map);
        let valley = valleys.iter().max_by_key(|v| v.len()).unwrap().clone();
        let mut facts = FactDb::default();
        let town = create_town(&mut map, &mut rng, &valley, &mut facts, &cfg);
        assert!(facts
            .facts()
            .iter()
            .any(|f| f.detail.contains(&town.name)));
    }
}
