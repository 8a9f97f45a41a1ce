//! Ghostplay Engine library.
//!
//! Account-free player progression on top of a pluggable storage backend.
//!
//! ## Structure
//!
//! - `infrastructure/` - Storage contract (ports) and its adapters
//! - `use_cases/` - The progression engine
//! - `config` - Environment configuration
//! - `app` - Application composition

pub mod app;
pub mod config;
pub mod infrastructure;
pub mod use_cases;

/// Shared helpers for unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
pub use config::{ConfigError, GhostplayConfig};
pub use infrastructure::ports::{ErrorKind, PlayerStateRepo, RepoError, StoredPlayerState};
pub use use_cases::{ProgressOutcome, Progression, ProgressionError};
