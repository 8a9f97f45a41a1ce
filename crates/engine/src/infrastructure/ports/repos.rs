//! Repository port traits for database access.

use async_trait::async_trait;
use ghostplay_domain::{Leader, PlayerId, PlayerState};

use super::error::RepoError;

/// A player state with its payload held as an opaque JSON document.
///
/// Backends only ever see this form. The progression engine converts to and
/// from the caller's `ExtraData` type at its boundary.
pub type StoredPlayerState = PlayerState<serde_json::Value>;

// =============================================================================
// Player State Storage
// =============================================================================

/// Storage contract for player progression.
///
/// Implementations must be safe for concurrent use and must give
/// read-after-write consistency within one process. They do not have to
/// serialize concurrent saves for the same player.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerStateRepo: Send + Sync {
    /// Fetch by identifier. `Ok(None)` when no such player exists.
    async fn get(&self, id: PlayerId) -> Result<Option<StoredPlayerState>, RepoError>;

    /// Fetch by recovery phrase. `Ok(None)` when no player owns it.
    async fn get_by_phrase(&self, phrase: &str) -> Result<Option<StoredPlayerState>, RepoError>;

    /// Insert a new player and never overwrite. The id must be set, and an id
    /// or phrase that is already stored is `InvalidData`.
    async fn create(&self, state: &StoredPlayerState) -> Result<(), RepoError>;

    /// Insert or update. A nil id is replaced with a fresh one; the persisted
    /// id is returned.
    async fn save(&self, state: &StoredPlayerState) -> Result<PlayerId, RepoError>;

    /// Top `limit` players by XP, highest first.
    async fn leaderboard(&self, limit: i64) -> Result<Vec<Leader>, RepoError>;
}

// =============================================================================
// Shared contract checks
// =============================================================================

pub fn ensure_lookup_id(id: PlayerId) -> Result<(), RepoError> {
    if id.is_nil() {
        return Err(RepoError::invalid("player ID cannot be nil"));
    }
    Ok(())
}

pub fn ensure_lookup_phrase(phrase: &str) -> Result<(), RepoError> {
    if phrase.is_empty() {
        return Err(RepoError::invalid("phrase cannot be empty"));
    }
    Ok(())
}

/// Required fields for any save.
pub fn ensure_persistable(state: &StoredPlayerState) -> Result<(), RepoError> {
    if state.user_name.is_empty() || state.phrase.is_empty() {
        return Err(RepoError::invalid("username and phrase cannot be empty"));
    }
    Ok(())
}

/// Required fields for an insert-only create.
pub fn ensure_creatable(state: &StoredPlayerState) -> Result<(), RepoError> {
    ensure_lookup_id(state.id)?;
    ensure_persistable(state)
}

pub fn ensure_leaderboard_limit(limit: i64) -> Result<(), RepoError> {
    if limit <= 0 {
        return Err(RepoError::invalid(
            "leaderboard limit must be greater than zero",
        ));
    }
    Ok(())
}
