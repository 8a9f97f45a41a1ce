//! Ghostplay domain: account-free player progression.
//!
//! Pure types and rules with no I/O. Storage and orchestration live in
//! `ghostplay-engine`.

pub mod entities;
pub mod error;
pub mod ids;
pub mod progression;

pub use entities::{Flags, Leader, PlayerState};
pub use error::DomainError;
pub use ids::PlayerId;
pub use progression::{add_xp, level_threshold, next_level, STARTING_LEVEL, XP_PER_LEVEL};
