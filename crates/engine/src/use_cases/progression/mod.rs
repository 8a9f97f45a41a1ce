//! Progression use case.
//!
//! Turns a trusted XP delta into a new XP total and level, creating the player
//! on first contact, and persists the result through [`PlayerStateRepo`].
//!
//! The engine holds no state between calls. It does not serialize concurrent
//! updates to the same player: two overlapping `apply_progress` calls can both
//! read the same stored XP, and the later save wins. Backends or callers that
//! need stronger guarantees must provide them.
//!
//! Every operation is a future that awaits the storage port directly. Dropping
//! it, or wrapping it in `tokio::time::timeout`, abandons the in-flight storage
//! call; the engine applies no timeout of its own.

mod error;

use std::marker::PhantomData;
use std::sync::Arc;

use ghostplay_domain::{add_xp, next_level, Leader, PlayerId, PlayerState, STARTING_LEVEL};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::infrastructure::ports::{ClockPort, PlayerStateRepo, RandomPort, StoredPlayerState};

pub use error::ProgressionError;

/// What a successful [`Progression::apply_progress`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressOutcome {
    pub player_id: PlayerId,
    /// The player did not exist before this call.
    pub created: bool,
    /// The level went up by one during this call.
    pub leveled_up: bool,
    pub level: u32,
    pub xp: u64,
}

/// Progression engine over players carrying `T` as extra data.
pub struct Progression<T> {
    repo: Arc<dyn PlayerStateRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    _extra: PhantomData<fn() -> T>,
}

impl<T> Clone for Progression<T> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            clock: self.clock.clone(),
            random: self.random.clone(),
            _extra: PhantomData,
        }
    }
}

impl<T> Progression<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(
        repo: Arc<dyn PlayerStateRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            repo,
            clock,
            random,
            _extra: PhantomData,
        }
    }

    /// Load a player by identifier.
    ///
    /// # Returns
    /// * `Ok(PlayerState)` - Player found and decoded
    /// * `Err(ProgressionError::PlayerNotFound)` - No such player
    pub async fn load_by_id(&self, id: PlayerId) -> Result<PlayerState<T>, ProgressionError> {
        let stored = self
            .repo
            .get(id)
            .await
            .map_err(ProgressionError::repo("fetch player state"))?
            .ok_or_else(|| ProgressionError::player_not_found(id))?;
        decode(stored)
    }

    /// Load a player by recovery phrase.
    pub async fn load_by_phrase(&self, phrase: &str) -> Result<PlayerState<T>, ProgressionError> {
        let stored = self
            .repo
            .get_by_phrase(phrase)
            .await
            .map_err(ProgressionError::repo("fetch player state by phrase"))?
            .ok_or_else(|| ProgressionError::player_not_found("no player for phrase"))?;
        decode(stored)
    }

    /// Top `limit` players by XP, highest first.
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<Leader>, ProgressionError> {
        self.repo
            .leaderboard(limit)
            .await
            .map_err(ProgressionError::repo("query leaderboard"))
    }

    /// Register a new player without touching any existing record.
    ///
    /// The player starts at level 1 with no XP; the caller's name, phrase,
    /// flags and extra data are stored. A nil id is replaced by a fresh one.
    /// An id or phrase that already exists is `InvalidData`.
    ///
    /// On success `state` carries the persisted id, level, XP and timestamp.
    pub async fn register(&self, state: &mut PlayerState<T>) -> Result<PlayerId, ProgressionError> {
        state.validate()?;

        let extra_data = serde_json::to_value(&state.extra_data)
            .map_err(|e| ProgressionError::serialization("marshal extra data", e))?;
        let id = if state.has_id() {
            state.id
        } else {
            PlayerId::from_uuid(self.random.gen_uuid())
        };
        let now = self.clock.now();

        let record = StoredPlayerState {
            extra_data,
            xp: 0,
            level: STARTING_LEVEL,
            last_updated: now,
            id,
            user_name: state.user_name.clone(),
            phrase: state.phrase.clone(),
            flags: state.flags.clone(),
        };

        self.repo
            .create(&record)
            .await
            .map_err(ProgressionError::repo("register player"))?;

        tracing::info!(player_id = %id, user_name = %record.user_name, "Registered new player");

        state.id = id;
        state.xp = 0;
        state.level = STARTING_LEVEL;
        state.last_updated = now;
        Ok(id)
    }

    /// Apply an XP delta to a player and persist the result.
    ///
    /// An unknown player is created at level 1 with `xp_delta` XP, however large
    /// the delta. A known player gains the delta on top of the stored XP and
    /// advances at most one level, when the new total reaches
    /// `stored level * 200`.
    ///
    /// On success `state` is updated in place with the persisted id, XP, level
    /// and timestamp. On failure `state` is left untouched.
    pub async fn apply_progress(
        &self,
        state: &mut PlayerState<T>,
        xp_delta: u64,
    ) -> Result<ProgressOutcome, ProgressionError> {
        state.validate()?;

        let existing = if state.has_id() {
            match self.repo.get(state.id).await {
                Ok(found) => found,
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(ProgressionError::repo("fetch player state")(e)),
            }
        } else {
            None
        };

        let extra_data = serde_json::to_value(&state.extra_data)
            .map_err(|e| ProgressionError::serialization("marshal extra data", e))?;

        let now = self.clock.now();
        let mut record = StoredPlayerState {
            extra_data,
            xp: 0,
            level: STARTING_LEVEL,
            last_updated: now,
            id: state.id,
            user_name: state.user_name.clone(),
            phrase: state.phrase.clone(),
            flags: state.flags.clone(),
        };

        let created = existing.is_none();
        let leveled_up = match existing {
            None => {
                if record.id.is_nil() {
                    record.id = PlayerId::from_uuid(self.random.gen_uuid());
                }
                record.xp = xp_delta;
                tracing::info!(
                    player_id = %record.id,
                    user_name = %record.user_name,
                    xp = record.xp,
                    "Creating new player"
                );
                false
            }
            Some(stored) => {
                record.xp = add_xp(stored.xp, xp_delta)?;
                record.level = next_level(stored.level, record.xp);
                record.level > stored.level
            }
        };

        let player_id = self.repo.save(&record).await.map_err(|e| {
            tracing::warn!(player_id = %record.id, error = %e, "Failed to save player state");
            ProgressionError::repo("save player state")(e)
        })?;

        if leveled_up {
            tracing::info!(
                player_id = %player_id,
                level = record.level,
                xp = record.xp,
                "Player levelled up"
            );
        } else {
            tracing::debug!(
                player_id = %player_id,
                level = record.level,
                xp = record.xp,
                "Player state saved"
            );
        }

        state.id = player_id;
        state.xp = record.xp;
        state.level = record.level;
        state.last_updated = now;

        Ok(ProgressOutcome {
            player_id,
            created,
            leveled_up,
            level: record.level,
            xp: record.xp,
        })
    }
}

fn decode<T: DeserializeOwned>(
    stored: StoredPlayerState,
) -> Result<PlayerState<T>, ProgressionError> {
    stored
        .map_extra_data(serde_json::from_value)
        .map_err(|e| ProgressionError::serialization("unmarshal extra data", e))
}
