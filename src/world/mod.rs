//! World module
//!
//! Map data structures, tiles, spatial utilities and procedural generation.

pub mod dungeon;
pub mod generation;
pub mod map;
pub mod pathfinding;
pub mod region;
pub mod tile;

pub use dungeon::{Campaign, Dungeon};
pub use map::{Map, Position};
pub use tile::{Tile, TileKind, TileType};

use thiserror::Error;

/// Errors from campaign generation. Everything recoverable is handled
/// inside the generators; what escapes here means the caller asked for
/// something impossible.
#[derive(Debug, Error)]
pub enum WorldGenError {
    #[error("invalid world configuration: {0}")]
    InvalidConfig(String),
    #[error("no viable overworld after {0} attempts")]
    ExhaustedRetries(u32),
}
