//! Game-side boundary surfaces
//!
//! The generation core places actors and items and consults world history,
//! but defines none of their behavior. These modules are that boundary.

pub mod history;
pub mod objects;

pub use history::{Fact, FactDb, Ruler};
pub use objects::{ActorSpec, GameId, ItemSpec, Loc, ObjectDb};
