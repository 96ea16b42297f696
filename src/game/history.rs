//! World history
//!
//! A small fact database seeded at campaign start. The decoration pass
//! queries it to decide what a discovered statue or journal refers to; the
//! richer narrative surface lives outside this crate.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::objects::Loc;

const RULER_NAMES: [&str; 10] = [
    "Maelis", "Corvin", "Ysolt", "Branoc", "Teyra", "Aldous", "Sereth", "Ondric", "Vessa",
    "Halric",
];

const RULER_TITLES: [&str; 5] = ["the Grim", "the Builder", "the Unready", "the Pale", "the Old"];

/// How a ruler's reign ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RulerFate {
    DiedInBed,
    Deposed,
    Vanished,
    SlainByBeast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ruler {
    pub name: String,
    pub title: String,
    pub reign_start: i32,
    pub reign_end: i32,
    pub fate: RulerFate,
}

/// One recorded world fact, optionally pinned to a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub detail: String,
    pub timestamp: i32,
    pub loc: Option<Loc>,
}

/// Read-mostly store of world facts and the founding dynasty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactDb {
    facts: Vec<Fact>,
    dynasty: Vec<Ruler>,
}

impl FactDb {
    /// Generate a short dynasty so decorations have something to refer to.
    pub fn seeded(rng: &mut StdRng) -> Self {
        let mut db = FactDb::default();
        let count = rng.gen_range(3..=5);
        let mut year = -(rng.gen_range(150..300));
        for _ in 0..count {
            let reign = rng.gen_range(8..40);
            let fate = match rng.gen_range(0..4) {
                0 => RulerFate::DiedInBed,
                1 => RulerFate::Deposed,
                2 => RulerFate::Vanished,
                _ => RulerFate::SlainByBeast,
            };
            let ruler = Ruler {
                name: (*RULER_NAMES.choose(rng).unwrap()).to_string(),
                title: (*RULER_TITLES.choose(rng).unwrap()).to_string(),
                reign_start: year,
                reign_end: year + reign,
                fate,
            };
            db.facts.push(Fact {
                detail: format!("{} {} took the throne", ruler.name, ruler.title),
                timestamp: year,
                loc: None,
            });
            year += reign;
            db.dynasty.push(ruler);
        }
        db
    }

    pub fn record(&mut self, detail: impl Into<String>, timestamp: i32, loc: Option<Loc>) {
        self.facts.push(Fact {
            detail: detail.into(),
            timestamp,
            loc,
        });
    }

    /// The most recent ruler, if history was seeded.
    pub fn latest_ruler(&self) -> Option<&Ruler> {
        self.dynasty.last()
    }

    pub fn rulers(&self) -> &[Ruler] {
        &self.dynasty
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// A random fact for flavor text. Draws from the RNG so repeated calls
    /// vary, deterministically for a fixed seed.
    pub fn random_fact(&self, rng: &mut StdRng) -> Option<&Fact> {
        if self.facts.is_empty() {
            return None;
        }
        let ix = rng.gen_range(0..self.facts.len());
        Some(&self.facts[ix])
    }

    /// Facts recorded on the same dungeon level within a radius. The
    /// decoration pass uses this to keep inscriptions local.
    pub fn events_near(&self, loc: Loc, radius: i32) -> Vec<&Fact> {
        self.facts
            .iter()
            .filter(|f| match f.loc {
                Some(l) => {
                    l.dungeon_id == loc.dungeon_id
                        && l.level == loc.level
                        && l.pos.chebyshev(&loc.pos) <= radius
                }
                None => false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn seeded_dynasty_is_reproducible() {
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        let da = FactDb::seeded(&mut a);
        let db = FactDb::seeded(&mut b);
        assert_eq!(da.rulers().len(), db.rulers().len());
        for (x, y) in da.rulers().iter().zip(db.rulers()) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.reign_start, y.reign_start);
        }
    }

    #[test]
    fn events_near_filters_by_level_and_radius() {
        use crate::world::map::Position;

        let mut db = FactDb::default();
        let here = Loc::new(1, 2, Position::new(10, 10));
        db.record("close by", 0, Some(Loc::new(1, 2, Position::new(12, 9))));
        db.record("too far", 0, Some(Loc::new(1, 2, Position::new(40, 10))));
        db.record("wrong level", 0, Some(Loc::new(1, 3, Position::new(10, 10))));
        db.record("nowhere", 0, None);
        let near = db.events_near(here, 5);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].detail, "close by");
    }

    #[test]
    fn reigns_are_contiguous() {
        let mut rng = StdRng::seed_from_u64(5);
        let db = FactDb::seeded(&mut rng);
        for pair in db.rulers().windows(2) {
            assert_eq!(pair[0].reign_end, pair[1].reign_start);
        }
    }
}
