//! Leaderboard projection.

use serde::{Deserialize, Serialize};

use super::player_state::PlayerState;

/// One row of the leaderboard. Produced by storage queries, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub user_name: String,
    pub level: u32,
    pub xp: u64,
}

impl<T> From<&PlayerState<T>> for Leader {
    fn from(state: &PlayerState<T>) -> Self {
        Self {
            user_name: state.user_name.clone(),
            level: state.level,
            xp: state.xp,
        }
    }
}
