//! Engine configuration from environment variables.
//!
//! | Variable                   | Default                         |
//! |----------------------------|---------------------------------|
//! | `GHOSTPLAY_DATABASE_URL`   | `sqlite:ghostplay.db?mode=rwc`  |
//! | `GHOSTPLAY_TABLE`          | `player_states`                 |
//! | `GHOSTPLAY_CACHE_TTL_SECS` | unset (no cache); `0` disables  |

use std::time::Duration;

use crate::infrastructure::sqlite::{validate_table_name, DEFAULT_TABLE};

pub const DATABASE_URL_VAR: &str = "GHOSTPLAY_DATABASE_URL";
pub const TABLE_VAR: &str = "GHOSTPLAY_TABLE";
pub const CACHE_TTL_VAR: &str = "GHOSTPLAY_CACHE_TTL_SECS";

pub const DEFAULT_DATABASE_URL: &str = "sqlite:ghostplay.db?mode=rwc";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostplayConfig {
    pub database_url: String,
    pub table_name: String,
    /// `None` means reads always go to the database.
    pub cache_ttl: Option<Duration>,
}

impl Default for GhostplayConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            table_name: DEFAULT_TABLE.to_string(),
            cache_ttl: None,
        }
    }
}

impl GhostplayConfig {
    /// Read configuration from the process environment, loading `.env` first
    /// if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        let database_url = read(DATABASE_URL_VAR).unwrap_or(defaults.database_url);

        let table_name = read(TABLE_VAR).unwrap_or(defaults.table_name);
        validate_table_name(&table_name).map_err(|e| ConfigError::Invalid {
            var: TABLE_VAR,
            reason: e.to_string(),
        })?;

        let cache_ttl = match read(CACHE_TTL_VAR) {
            None => None,
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    var: CACHE_TTL_VAR,
                    reason: format!("expected whole seconds, got {raw:?}"),
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
        };

        Ok(Self {
            database_url,
            table_name,
            cache_ttl,
        })
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}
