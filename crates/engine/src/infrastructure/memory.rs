//! In-memory player state storage for development and testing
//!
//! Keeps every player in a `HashMap` behind one lock, so the phrase uniqueness
//! check and the write happen atomically. Nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ghostplay_domain::{Leader, PlayerId};
use tokio::sync::RwLock;

use crate::infrastructure::ports::{
    ensure_creatable, ensure_leaderboard_limit, ensure_lookup_id, ensure_lookup_phrase,
    ensure_persistable, PlayerStateRepo, RepoError, StoredPlayerState,
};

/// In-memory implementation of the player state storage contract.
#[derive(Clone, Default)]
pub struct InMemoryPlayerStateRepo {
    players: Arc<RwLock<HashMap<PlayerId, StoredPlayerState>>>,
}

impl InMemoryPlayerStateRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored players.
    pub async fn len(&self) -> usize {
        self.players.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.players.read().await.is_empty()
    }
}

#[async_trait]
impl PlayerStateRepo for InMemoryPlayerStateRepo {
    async fn get(&self, id: PlayerId) -> Result<Option<StoredPlayerState>, RepoError> {
        ensure_lookup_id(id)?;
        Ok(self.players.read().await.get(&id).cloned())
    }

    async fn get_by_phrase(&self, phrase: &str) -> Result<Option<StoredPlayerState>, RepoError> {
        ensure_lookup_phrase(phrase)?;
        let players = self.players.read().await;
        Ok(players.values().find(|p| p.phrase == phrase).cloned())
    }

    async fn create(&self, state: &StoredPlayerState) -> Result<(), RepoError> {
        ensure_creatable(state)?;

        let mut players = self.players.write().await;
        if players.contains_key(&state.id) {
            return Err(RepoError::invalid(format!(
                "player {} already exists",
                state.id
            )));
        }
        if players.values().any(|p| p.phrase == state.phrase) {
            return Err(RepoError::invalid("phrase already in use"));
        }

        players.insert(state.id, state.clone());
        Ok(())
    }

    async fn save(&self, state: &StoredPlayerState) -> Result<PlayerId, RepoError> {
        ensure_persistable(state)?;

        let mut players = self.players.write().await;
        let id = if state.id.is_nil() {
            PlayerId::new()
        } else {
            state.id
        };

        if players
            .values()
            .any(|p| p.phrase == state.phrase && p.id != id)
        {
            return Err(RepoError::invalid("phrase already in use"));
        }

        let mut stored = state.clone();
        stored.id = id;
        players.insert(id, stored);
        Ok(id)
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<Leader>, RepoError> {
        ensure_leaderboard_limit(limit)?;

        let players = self.players.read().await;
        let mut leaders: Vec<Leader> = players.values().map(Leader::from).collect();
        leaders.sort_by(|a, b| b.xp.cmp(&a.xp));
        leaders.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(leaders)
    }
}
