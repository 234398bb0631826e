pub mod challenge;
pub mod errors;
pub mod game;

// Re-export all types
pub use challenge::*;
pub use errors::*;
pub use game::*;

use uuid::Uuid;

pub type GameId = Uuid;
pub type PlayerId = Uuid;
