//! Object and actor database
//!
//! A thin placement surface over a `hecs` world. Generation reserves ids and
//! drops externally defined actors and items at coordinates; stats, traits
//! and behavior live with the item/monster factories outside this crate.

use hecs::World;
use serde::{Deserialize, Serialize};

use crate::world::map::Position;

/// Stable identity handed out by [`ObjectDb::reserve_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameId(pub u64);

/// A world location: which dungeon, which level, which cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Loc {
    pub dungeon_id: u32,
    pub level: usize,
    pub pos: Position,
}

impl Loc {
    pub fn new(dungeon_id: u32, level: usize, pos: Position) -> Self {
        Self {
            dungeon_id,
            level,
            pos,
        }
    }
}

/// What the external monster factory gives us to place.
#[derive(Debug, Clone)]
pub struct ActorSpec {
    pub name: String,
    pub glyph: char,
}

/// What the external item factory gives us to place.
#[derive(Debug, Clone)]
pub struct ItemSpec {
    pub name: String,
    pub glyph: char,
}

impl ItemSpec {
    pub fn new(name: impl Into<String>, glyph: char) -> Self {
        Self {
            name: name.into(),
            glyph,
        }
    }
}

impl ActorSpec {
    pub fn new(name: impl Into<String>, glyph: char) -> Self {
        Self {
            name: name.into(),
            glyph,
        }
    }
}

// hecs components
struct Name(String);
struct Glyph(#[allow(dead_code)] char);
struct ActorTag;
struct ItemTag;

/// The placement database generation writes into.
pub struct ObjectDb {
    world: World,
    next_id: u64,
}

impl ObjectDb {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            // Low ids are reserved for the player and other fixed entities.
            next_id: 1000,
        }
    }

    pub fn reserve_id(&mut self) -> GameId {
        let id = GameId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Place an actor at a location. Returns its reserved id.
    pub fn add_actor(&mut self, spec: ActorSpec, loc: Loc) -> GameId {
        let id = self.reserve_id();
        self.world
            .spawn((id, Name(spec.name), Glyph(spec.glyph), loc, ActorTag));
        id
    }

    /// Place an item at a location. Returns its reserved id.
    pub fn set_item_at(&mut self, spec: ItemSpec, loc: Loc) -> GameId {
        let id = self.reserve_id();
        self.world
            .spawn((id, Name(spec.name), Glyph(spec.glyph), loc, ItemTag));
        id
    }

    /// Names of items at a location, in spawn order.
    pub fn items_at(&self, loc: Loc) -> Vec<(GameId, String)> {
        let mut out: Vec<(GameId, String)> = self
            .world
            .query::<(&GameId, &Name, &Loc)>()
            .with::<&ItemTag>()
            .iter()
            .filter(|(_, (_, _, l))| **l == loc)
            .map(|(_, (id, name, _))| (*id, name.0.clone()))
            .collect();
        out.sort_by_key(|(id, _)| id.0);
        out
    }

    pub fn actor_count(&self) -> usize {
        self.world.query::<&ActorTag>().iter().count()
    }

    pub fn item_count(&self) -> usize {
        self.world.query::<&ItemTag>().iter().count()
    }

    /// All item placements, ordered by id. Lets tests audit what generation
    /// placed without reaching into the ECS.
    pub fn all_items(&self) -> Vec<(GameId, String, Loc)> {
        let mut out: Vec<(GameId, String, Loc)> = self
            .world
            .query::<(&GameId, &Name, &Loc)>()
            .with::<&ItemTag>()
            .iter()
            .map(|(_, (id, name, loc))| (*id, name.0.clone(), *loc))
            .collect();
        out.sort_by_key(|(id, _, _)| id.0);
        out
    }
}

impl Default for ObjectDb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_monotonic() {
        let mut db = ObjectDb::new();
        let a = db.reserve_id();
        let b = db.add_actor(
            ActorSpec::new("kobold", 'k'),
            Loc::new(1, 0, Position::new(4, 4)),
        );
        let c = db.set_item_at(
            ItemSpec::new("iron key", ';'),
            Loc::new(1, 0, Position::new(5, 4)),
        );
        assert!(a.0 < b.0 && b.0 < c.0);
    }

    #[test]
    fn items_found_by_location() {
        let mut db = ObjectDb::new();
        let loc = Loc::new(1, 2, Position::new(7, 3));
        db.set_item_at(ItemSpec::new("bronze key", ';'), loc);
        db.set_item_at(ItemSpec::new("old journal", '?'), loc);
        db.set_item_at(
            ItemSpec::new("elsewhere", '*'),
            Loc::new(1, 2, Position::new(8, 3)),
        );
        let found = db.items_at(loc);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].1, "bronze key");
        assert_eq!(found[1].1, "old journal");
    }
}
