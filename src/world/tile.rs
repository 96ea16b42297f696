//! Tile definitions
//!
//! Terrain variants and their properties. Stateful tiles (doors, vault
//! mechanisms, gate triggers) carry their state directly in the enum payload
//! and are dispatched by pattern matching.

use serde::{Deserialize, Serialize};

use super::map::Position;

/// A single tile in a map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub tile_type: TileType,
    pub explored: bool,
    pub visible: bool,
}

impl Tile {
    /// The tile factory. All generation code materializes tiles through here.
    pub fn of(tile_type: TileType) -> Self {
        Self {
            tile_type,
            explored: false,
            visible: false,
        }
    }

    pub fn kind(&self) -> TileKind {
        self.tile_type.kind()
    }

    pub fn is_passable(&self) -> bool {
        self.tile_type.is_passable()
    }

    pub fn is_transparent(&self) -> bool {
        self.tile_type.is_transparent()
    }

    pub fn glyph(&self) -> char {
        self.tile_type.glyph()
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::of(TileType::Wall)
    }
}

/// Material of a vault door. Purely descriptive, but persisted so the
/// item system can match keys to doors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VaultMaterial {
    Iron,
    Bronze,
    Stone,
}

/// Types of tiles in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TileType {
    // Basic terrain
    Wall,
    Floor,
    StoneFloor,

    // Doors and vault mechanisms
    Door { open: bool, locked: bool },
    SecretDoor,
    VaultDoor { material: VaultMaterial },
    Portcullis { lowered: bool },
    GateTrigger { target: Position },

    // Level transitions
    StairsUp,
    StairsDown,
    Portal,

    // Hazards
    Chasm,

    // Wilderness terrain
    DeepWater,
    Water,
    Sand,
    Grass,
    Tree,
    Dirt,
    Mountain,
    SnowPeak,
    WorldBorder,

    // Decorative
    Rubble,
    Bones,
    Gravestone,
    Statue,
    Fountain,
    Brazier,
}

/// Payload-free mirror of [`TileType`], used to key cost tables and
/// passability rules without caring about per-instance door state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileKind {
    Wall,
    Floor,
    StoneFloor,
    Door,
    SecretDoor,
    VaultDoor,
    Portcullis,
    GateTrigger,
    StairsUp,
    StairsDown,
    Portal,
    Chasm,
    DeepWater,
    Water,
    Sand,
    Grass,
    Tree,
    Dirt,
    Mountain,
    SnowPeak,
    WorldBorder,
    Rubble,
    Bones,
    Gravestone,
    Statue,
    Fountain,
    Brazier,
}

impl TileType {
    /// A closed, unlocked door.
    pub fn door() -> Self {
        TileType::Door {
            open: false,
            locked: false,
        }
    }

    /// A closed, locked door.
    pub fn locked_door() -> Self {
        TileType::Door {
            open: false,
            locked: true,
        }
    }

    pub fn kind(&self) -> TileKind {
        match self {
            TileType::Wall => TileKind::Wall,
            TileType::Floor => TileKind::Floor,
            TileType::StoneFloor => TileKind::StoneFloor,
            TileType::Door { .. } => TileKind::Door,
            TileType::SecretDoor => TileKind::SecretDoor,
            TileType::VaultDoor { .. } => TileKind::VaultDoor,
            TileType::Portcullis { .. } => TileKind::Portcullis,
            TileType::GateTrigger { .. } => TileKind::GateTrigger,
            TileType::StairsUp => TileKind::StairsUp,
            TileType::StairsDown => TileKind::StairsDown,
            TileType::Portal => TileKind::Portal,
            TileType::Chasm => TileKind::Chasm,
            TileType::DeepWater => TileKind::DeepWater,
            TileType::Water => TileKind::Water,
            TileType::Sand => TileKind::Sand,
            TileType::Grass => TileKind::Grass,
            TileType::Tree => TileKind::Tree,
            TileType::Dirt => TileKind::Dirt,
            TileType::Mountain => TileKind::Mountain,
            TileType::SnowPeak => TileKind::SnowPeak,
            TileType::WorldBorder => TileKind::WorldBorder,
            TileType::Rubble => TileKind::Rubble,
            TileType::Bones => TileKind::Bones,
            TileType::Gravestone => TileKind::Gravestone,
            TileType::Statue => TileKind::Statue,
            TileType::Fountain => TileKind::Fountain,
            TileType::Brazier => TileKind::Brazier,
        }
    }

    /// Default walkability for an unencumbered walker. Purpose-specific
    /// passability goes through predicates and cost tables instead.
    pub fn is_passable(&self) -> bool {
        match self {
            TileType::Wall
            | TileType::SecretDoor
            | TileType::VaultDoor { .. }
            | TileType::Chasm
            | TileType::DeepWater
            | TileType::Mountain
            | TileType::SnowPeak
            | TileType::WorldBorder
            | TileType::Statue => false,
            TileType::Door { open, locked } => *open || !*locked,
            TileType::Portcullis { lowered } => !*lowered,
            _ => true,
        }
    }

    pub fn is_transparent(&self) -> bool {
        match self {
            TileType::Wall
            | TileType::SecretDoor
            | TileType::VaultDoor { .. }
            | TileType::Mountain
            | TileType::SnowPeak
            | TileType::WorldBorder => false,
            TileType::Door { open, .. } => *open,
            _ => true,
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            TileType::Wall => '#',
            TileType::Floor => '.',
            TileType::StoneFloor => '.',
            TileType::Door { open: true, .. } => '/',
            TileType::Door { open: false, .. } => '+',
            // Secret doors render as the wall they hide in
            TileType::SecretDoor => '#',
            TileType::VaultDoor { .. } => '+',
            TileType::Portcullis { lowered: true } => '≠',
            TileType::Portcullis { lowered: false } => '|',
            TileType::GateTrigger { .. } => '.',
            TileType::StairsUp => '<',
            TileType::StairsDown => '>',
            TileType::Portal => 'Ω',
            TileType::Chasm => ' ',
            TileType::DeepWater => '≈',
            TileType::Water => '~',
            TileType::Sand => ',',
            TileType::Grass => '"',
            TileType::Tree => '♠',
            TileType::Dirt => '.',
            TileType::Mountain => '^',
            TileType::SnowPeak => '^',
            TileType::WorldBorder => '≈',
            TileType::Rubble => ',',
            TileType::Bones => '%',
            TileType::Gravestone => '┼',
            TileType::Statue => '&',
            TileType::Fountain => '¶',
            TileType::Brazier => '♨',
        }
    }

    pub fn fg_color(&self) -> (u8, u8, u8) {
        match self {
            TileType::Wall => (130, 110, 90),
            TileType::Floor => (80, 80, 80),
            TileType::StoneFloor => (110, 105, 95),
            TileType::Door { .. } => (139, 90, 43),
            TileType::SecretDoor => (130, 110, 90),
            TileType::VaultDoor { material } => match material {
                VaultMaterial::Iron => (160, 160, 170),
                VaultMaterial::Bronze => (180, 130, 60),
                VaultMaterial::Stone => (120, 120, 110),
            },
            TileType::Portcullis { .. } => (150, 150, 160),
            TileType::GateTrigger { .. } => (80, 80, 80),
            TileType::StairsUp => (200, 200, 200),
            TileType::StairsDown => (200, 200, 200),
            TileType::Portal => (180, 100, 255),
            TileType::Chasm => (20, 20, 20),
            TileType::DeepWater => (30, 60, 170),
            TileType::Water => (60, 110, 220),
            TileType::Sand => (210, 190, 120),
            TileType::Grass => (60, 140, 50),
            TileType::Tree => (30, 100, 40),
            TileType::Dirt => (120, 90, 60),
            TileType::Mountain => (140, 130, 120),
            TileType::SnowPeak => (235, 235, 245),
            TileType::WorldBorder => (20, 40, 120),
            TileType::Rubble => (100, 90, 80),
            TileType::Bones => (200, 200, 180),
            TileType::Gravestone => (150, 150, 150),
            TileType::Statue => (170, 170, 160),
            TileType::Fountain => (100, 160, 230),
            TileType::Brazier => (255, 150, 50),
        }
    }

    pub fn bg_color(&self) -> (u8, u8, u8) {
        match self {
            TileType::Wall | TileType::SecretDoor => (40, 35, 30),
            TileType::Chasm => (5, 5, 5),
            TileType::DeepWater | TileType::WorldBorder => (10, 20, 60),
            TileType::Water => (20, 40, 90),
            TileType::Sand => (60, 55, 35),
            TileType::Grass | TileType::Tree => (15, 30, 15),
            TileType::Mountain | TileType::SnowPeak => (35, 32, 30),
            _ => (20, 18, 15),
        }
    }
}
