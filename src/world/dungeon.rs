//! Dungeons and the campaign aggregate
//!
//! A `Dungeon` is an ordered stack of level maps sharing an identity. The
//! `Campaign` owns everything generation produces: the overworld, the town,
//! the dungeons and the world's recorded history.

use serde::{Deserialize, Serialize};

use crate::game::history::FactDb;
use crate::world::generation::town::Town;
use crate::world::map::{Map, Position};

/// Dungeon id reserved for the overworld/wilderness.
pub const OVERWORLD_ID: u32 = 0;

/// Id of the main dungeon of a campaign.
pub const MAIN_DUNGEON_ID: u32 = 1;

/// An ordered collection of levels sharing an identity, plus the
/// level-scoped metadata the surrounding game consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dungeon {
    pub id: u32,
    pub name: String,
    pub levels: Vec<Map>,
    /// Message shown the first time the player arrives on each level.
    pub arrival_messages: Vec<String>,
    /// Name of the monster spawn deck for each level. The deck contents are
    /// the monster factory's concern, not ours.
    pub spawn_decks: Vec<String>,
}

impl Dungeon {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            levels: Vec::new(),
            arrival_messages: Vec::new(),
            spawn_decks: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, ix: usize) -> Option<&Map> {
        self.levels.get(ix)
    }
}

/// Everything one seed generates. Created once per game and kept for the
/// game's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub seed: u64,
    pub wilderness: Map,
    pub town: Town,
    pub dungeons: Vec<Dungeon>,
    pub facts: FactDb,
    /// Where the main dungeon's portal sits on the overworld.
    pub dungeon_entrance: Position,
}

impl Campaign {
    pub fn main_dungeon(&self) -> &Dungeon {
        self.dungeons
            .iter()
            .find(|d| d.id == MAIN_DUNGEON_ID)
            .expect("campaign always has a main dungeon")
    }
}
