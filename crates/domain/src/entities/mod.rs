//! Domain entities - Core business objects with identity

mod leader;
mod player_state;

pub use leader::Leader;
pub use player_state::{Flags, PlayerState};
