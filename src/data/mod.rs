//! Generation parameters
//!
//! Loaded from an external RON file when present, with hardcoded defaults
//! as fallback so the game always starts.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tunable knobs for campaign generation. Retry budgets and caps here are
/// what keeps every generator loop bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Wilderness side length, must be 2^n + 1.
    pub wilderness_size: usize,
    /// Corner seeding for the heightmap: the sea side rolls below this.
    pub sea_corner_max: f32,
    pub peak_corner_min: f32,
    pub peak_corner_max: f32,
    /// Initial midpoint-displacement fuzz amplitude. Halves per subdivision.
    pub fuzz_scale: f32,
    /// Height thresholds of the biome table.
    pub deep_water_below: f32,
    pub sand_below: f32,
    pub grass_below: f32,
    pub snow_above: f32,
    pub vegetation_generations: u32,
    pub extra_rivers_per_third: u32,

    /// Dungeon level dimensions; odd numbers keep rooms on the maze lattice.
    pub level_width: i32,
    pub level_height: i32,
    pub dungeon_depth: usize,
    /// Room placement proposals per level.
    pub room_attempts: u32,

    pub cave_fill: f64,
    pub cave_generations: u32,

    pub tower_min_room: i32,
    pub tower_erase_chance: f64,
    pub tower_merge_chance: f64,
    pub tower_max_doors: usize,
    pub tower_locked_chance: f64,

    pub vault_chance: f64,
    pub vault_cap: usize,
    pub trigger_radius: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            wilderness_size: 257,
            sea_corner_max: 25.0,
            peak_corner_min: 250.0,
            peak_corner_max: 300.0,
            fuzz_scale: 80.0,
            deep_water_below: 50.0,
            sand_below: 55.0,
            grass_below: 200.0,
            snow_above: 250.0,
            vegetation_generations: 2,
            extra_rivers_per_third: 1,
            level_width: 79,
            level_height: 45,
            dungeon_depth: 5,
            room_attempts: 75,
            cave_fill: 0.45,
            cave_generations: 5,
            tower_min_room: 4,
            tower_erase_chance: 0.35,
            tower_merge_chance: 0.25,
            tower_max_doors: 2,
            tower_locked_chance: 0.15,
            vault_chance: 0.25,
            vault_cap: 2,
            trigger_radius: 12,
        }
    }
}

impl WorldConfig {
    /// Load from the given path, or the default location, or fall back to
    /// the built-in defaults. A missing file is normal; a broken one is
    /// worth a warning.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new("assets/data/worldgen.ron"));
        match fs::read_to_string(path) {
            Ok(content) => match ron::from_str(&content) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("failed to parse {}: {e}. Using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!("no config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Reject configurations the generators cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.wilderness_size < 17 || !(self.wilderness_size - 1).is_power_of_two() {
            return Err(format!(
                "wilderness_size must be 2^n + 1 and at least 17, got {}",
                self.wilderness_size
            ));
        }
        if self.level_width < 21 || self.level_height < 21 {
            return Err("dungeon levels must be at least 21x21".to_string());
        }
        if self.level_width % 2 == 0 || self.level_height % 2 == 0 {
            return Err("dungeon level dimensions must be odd".to_string());
        }
        if self.dungeon_depth == 0 {
            return Err("dungeon_depth must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.vault_chance) {
            return Err("vault_chance must be a probability".to_string());
        }
        if self.tower_min_room < 2 {
            return Err("tower_min_room must be at least 2".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_sizes_are_rejected() {
        let mut cfg = WorldConfig::default();
        cfg.wilderness_size = 100;
        assert!(cfg.validate().is_err());

        let mut cfg = WorldConfig::default();
        cfg.level_width = 80;
        assert!(cfg.validate().is_err());

        let mut cfg = WorldConfig::default();
        cfg.vault_chance = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = WorldConfig::load(Some(Path::new("/nonexistent/worldgen.ron")));
        assert_eq!(cfg.wilderness_size, WorldConfig::default().wilderness_size);
    }
}
