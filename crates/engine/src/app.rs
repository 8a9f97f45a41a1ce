//! Application composition.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::GhostplayConfig;
use crate::infrastructure::{
    cache::CachedPlayerStateRepo,
    clock::{SystemClock, SystemRandom},
    memory::InMemoryPlayerStateRepo,
    ports::{ClockPort, PlayerStateRepo, RandomPort, RepoError},
    sqlite::SqlitePlayerStateRepo,
};
use crate::use_cases::Progression;

/// Main application state.
///
/// Holds the storage port and the testability ports, and hands out
/// progression engines for any extra-data type.
#[derive(Clone)]
pub struct App {
    pub repo: Arc<dyn PlayerStateRepo>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
}

impl App {
    pub fn new(
        repo: Arc<dyn PlayerStateRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            repo,
            clock,
            random,
        }
    }

    /// Open the configured SQLite database, layering the TTL cache on top when
    /// one is configured.
    pub async fn connect(config: &GhostplayConfig) -> Result<Self, RepoError> {
        let sqlite: Arc<dyn PlayerStateRepo> = Arc::new(
            SqlitePlayerStateRepo::connect(&config.database_url, &config.table_name).await?,
        );

        let repo: Arc<dyn PlayerStateRepo> = match config.cache_ttl {
            Some(ttl) => {
                tracing::info!(ttl_secs = ttl.as_secs(), "Player state cache enabled");
                Arc::new(CachedPlayerStateRepo::new(sqlite, ttl))
            }
            None => sqlite,
        };

        tracing::info!(table = %config.table_name, "Ghostplay storage ready");
        Ok(Self::new(
            repo,
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
        ))
    }

    /// Non-persistent application for development and tests.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryPlayerStateRepo::new()),
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
        )
    }

    pub fn progression<T>(&self) -> Progression<T>
    where
        T: Serialize + DeserializeOwned,
    {
        Progression::new(self.repo.clone(), self.clock.clone(), self.random.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::ErrorKind;
    use crate::test_fixtures::init_test_logging;
    use ghostplay_domain::PlayerState;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Arcade {
        high_score: u32,
        unlocked: Vec<String>,
    }

    fn sqlite_config(dir: &tempfile::TempDir) -> GhostplayConfig {
        let path = dir.path().join("ghostplay.db");
        GhostplayConfig::default()
            .with_database_url(format!("sqlite:{}?mode=rwc", path.to_string_lossy()))
    }

    #[tokio::test]
    async fn sqlite_app_runs_full_progression() -> anyhow::Result<()> {
        init_test_logging();
        let dir = tempfile::tempdir()?;
        let app = App::connect(&sqlite_config(&dir)).await?;
        let engine = app.progression::<Arcade>();

        let extra = Arcade {
            high_score: 9_000,
            unlocked: vec!["stage-2".into()],
        };
        let mut ghost = PlayerState::new("Ghost", "rune-7", extra.clone())
            .with_flag("tutorial_completed", true);

        let created = engine.apply_progress(&mut ghost, 50).await?;
        assert!(created.created);
        assert_eq!((ghost.level, ghost.xp), (1, 50));

        engine.apply_progress(&mut ghost, 150).await?;
        assert_eq!((ghost.level, ghost.xp), (2, 200));

        let loaded = engine.load_by_phrase("rune-7").await?;
        assert_eq!(loaded.id, ghost.id);
        assert_eq!(loaded.extra_data, extra);
        assert!(loaded.flag("tutorial_completed"));
        assert!(!loaded.flag("is_premium"));

        let board = engine.leaderboard(5).await?;
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].user_name, "Ghost");
        assert_eq!(board[0].level, 2);
        Ok(())
    }

    #[tokio::test]
    async fn cached_app_reads_its_own_writes() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = sqlite_config(&dir).with_cache_ttl(Duration::from_secs(60));
        let app = App::connect(&config).await?;
        let engine = app.progression::<Arcade>();

        let mut player = PlayerState::new(
            "Wraith",
            "ember-2",
            Arcade {
                high_score: 1,
                unlocked: vec![],
            },
        );
        engine.apply_progress(&mut player, 10).await?;
        player.extra_data.high_score = 2;
        engine.apply_progress(&mut player, 10).await?;

        let loaded = engine.load_by_id(player.id).await?;
        assert_eq!(loaded.xp, 20);
        assert_eq!(loaded.extra_data.high_score, 2);
        Ok(())
    }

    #[tokio::test]
    async fn in_memory_app_reports_missing_players() {
        let app = App::in_memory();
        let engine = app.progression::<serde_json::Value>();

        let err = engine
            .load_by_phrase("nobody")
            .await
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::PlayerNotFound);
    }
}
