//! Player State entity - an account-free player's progression record
//!
//! A player is identified by a [`PlayerId`] and a secret recovery phrase that
//! stands in for an account credential. Progression is tracked as cumulative XP
//! and a level derived from it (see [`crate::progression`]).
//!
//! ## Payload
//!
//! `PlayerState` is generic over the caller's `ExtraData` type `T`. The domain
//! never looks inside it; storage adapters carry it as an opaque JSON document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;
use crate::ids::PlayerId;

/// System-level toggles keyed by caller-defined names (e.g. `tutorial_completed`).
///
/// Absent keys read as `false`.
pub type Flags = BTreeMap<String, bool>;

/// A player's progression state.
///
/// Field order matches the serialized form:
/// `extra_data, xp, level, last_updated, id, user_name, phrase, flags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState<T> {
    pub extra_data: T,
    pub xp: u64,
    pub level: u32,
    /// Set by the progression engine on every successful save.
    pub last_updated: DateTime<Utc>,
    /// Nil until the first save assigns one.
    #[serde(default)]
    pub id: PlayerId,
    pub user_name: String,
    /// Secret recovery phrase, unique across all players.
    pub phrase: String,
    #[serde(default, deserialize_with = "flags_or_empty")]
    pub flags: Flags,
}

impl<T> PlayerState<T> {
    /// Create an unsaved player at level 1 with no XP and no flags.
    pub fn new(user_name: impl Into<String>, phrase: impl Into<String>, extra_data: T) -> Self {
        Self {
            extra_data,
            xp: 0,
            level: 1,
            last_updated: DateTime::<Utc>::default(),
            id: PlayerId::nil(),
            user_name: user_name.into(),
            phrase: phrase.into(),
            flags: Flags::new(),
        }
    }

    /// Builder: use a caller-chosen identifier instead of a generated one.
    pub fn with_id(mut self, id: PlayerId) -> Self {
        self.id = id;
        self
    }

    /// Builder: set a flag.
    pub fn with_flag(mut self, key: impl Into<String>, value: bool) -> Self {
        self.flags.insert(key.into(), value);
        self
    }

    /// Read a flag. Keys that were never set are `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.flags.insert(key.into(), value);
    }

    /// A player needs a user name and a recovery phrase before it can be saved.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.user_name.is_empty() || self.phrase.is_empty() {
            return Err(DomainError::validation(
                "username and phrase cannot be empty",
            ));
        }
        Ok(())
    }

    /// Whether storage has assigned this player an identifier yet.
    pub fn has_id(&self) -> bool {
        !self.id.is_nil()
    }

    /// Convert the payload, keeping every other field.
    ///
    /// Storage adapters use this to move between the caller's type and the
    /// JSON document they persist.
    pub fn map_extra_data<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<PlayerState<U>, E> {
        Ok(PlayerState {
            extra_data: f(self.extra_data)?,
            xp: self.xp,
            level: self.level,
            last_updated: self.last_updated,
            id: self.id,
            user_name: self.user_name,
            phrase: self.phrase,
            flags: self.flags,
        })
    }
}

/// Treat a JSON `null` flags object the same as a missing one.
fn flags_or_empty<'de, D>(deserializer: D) -> Result<Flags, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Flags>::deserialize(deserializer)?.unwrap_or_default())
}
