//! Level-up rules.
//!
//! A player at level `L` needs `L * 200` cumulative XP to reach `L + 1`.
//! At most one level is gained per progress event, so a large XP jump past
//! several thresholds still advances a single level.

use crate::error::DomainError;

/// XP required per level when computing the next threshold.
pub const XP_PER_LEVEL: u64 = 200;

/// Level assigned to every newly created player.
pub const STARTING_LEVEL: u32 = 1;

/// Cumulative XP at which a player at `level` advances to `level + 1`.
pub fn level_threshold(level: u32) -> u64 {
    u64::from(level) * XP_PER_LEVEL
}

/// Level after an update that brings the player's XP to `xp`.
pub fn next_level(level: u32, xp: u64) -> u32 {
    if xp >= level_threshold(level) {
        level.saturating_add(1)
    } else {
        level
    }
}

/// Add an XP delta to a stored total.
pub fn add_xp(current: u64, delta: u64) -> Result<u64, DomainError> {
    current
        .checked_add(delta)
        .ok_or_else(|| DomainError::overflow(format!("xp {current} + {delta} exceeds u64")))
}
