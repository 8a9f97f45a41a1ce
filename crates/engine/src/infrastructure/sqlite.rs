//! SQLite-backed player state storage.
//!
//! One table per configured name:
//!
//! ```sql
//! id TEXT PRIMARY KEY, phrase TEXT UNIQUE NOT NULL, user_name TEXT NOT NULL,
//! level INTEGER NOT NULL DEFAULT 1, xp INTEGER NOT NULL DEFAULT 0,
//! last_updated TEXT NOT NULL, flags TEXT NOT NULL DEFAULT '{}',
//! extra_data TEXT NOT NULL DEFAULT '{}'
//! ```
//!
//! The table name is the only identifier spliced into SQL, and it is checked
//! against a plain identifier grammar first. Every value is a bound parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ghostplay_domain::{Flags, Leader, PlayerId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::infrastructure::ports::{
    ensure_creatable, ensure_leaderboard_limit, ensure_lookup_id, ensure_lookup_phrase,
    ensure_persistable, PlayerStateRepo, RepoError, StoredPlayerState,
};

/// Default table name when none is configured.
pub const DEFAULT_TABLE: &str = "player_states";

/// SQL statements bound to one validated table name.
struct Statements {
    create_table: String,
    select_by_id: String,
    select_by_phrase: String,
    insert: String,
    upsert: String,
    leaderboard: String,
}

impl Statements {
    fn for_table(table: &str) -> Self {
        let columns = "id, phrase, user_name, level, xp, last_updated, flags, extra_data";
        Self {
            create_table: format!(
                r#"
                CREATE TABLE IF NOT EXISTS "{table}" (
                    id TEXT PRIMARY KEY,
                    phrase TEXT UNIQUE NOT NULL,
                    user_name TEXT NOT NULL,
                    level INTEGER NOT NULL DEFAULT 1,
                    xp INTEGER NOT NULL DEFAULT 0,
                    last_updated TEXT NOT NULL,
                    flags TEXT NOT NULL DEFAULT '{{}}',
                    extra_data TEXT NOT NULL DEFAULT '{{}}'
                )
                "#
            ),
            select_by_id: format!(r#"SELECT {columns} FROM "{table}" WHERE id = ?"#),
            select_by_phrase: format!(r#"SELECT {columns} FROM "{table}" WHERE phrase = ?"#),
            insert: format!(
                r#"INSERT INTO "{table}" ({columns}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#
            ),
            upsert: format!(
                r#"
                INSERT INTO "{table}" ({columns})
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    phrase = excluded.phrase,
                    user_name = excluded.user_name,
                    level = excluded.level,
                    xp = excluded.xp,
                    last_updated = excluded.last_updated,
                    flags = excluded.flags,
                    extra_data = excluded.extra_data
                "#
            ),
            leaderboard: format!(
                r#"SELECT user_name, level, xp FROM "{table}" ORDER BY xp DESC LIMIT ?"#
            ),
        }
    }
}

/// SQLite implementation of the player state storage contract.
pub struct SqlitePlayerStateRepo {
    pool: SqlitePool,
    table: String,
    sql: Statements,
}

impl SqlitePlayerStateRepo {
    /// Connect to `database_url` (e.g. `sqlite:ghostplay.db?mode=rwc`) and
    /// create the table if needed.
    pub async fn connect(database_url: &str, table: &str) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| RepoError::database("connect", e))?;
        Self::from_pool(pool, table).await
    }

    /// Use an existing pool and create the table if needed.
    pub async fn from_pool(pool: SqlitePool, table: &str) -> Result<Self, RepoError> {
        validate_table_name(table)?;
        let sql = Statements::for_table(table);

        sqlx::query(&sql.create_table)
            .execute(&pool)
            .await
            .map_err(|e| RepoError::database("create_table", e))?;

        tracing::debug!(table, "Player state table ready");

        Ok(Self {
            pool,
            table: table.to_string(),
            sql,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_one(
        &self,
        operation: &'static str,
        query: &str,
        key: String,
    ) -> Result<Option<StoredPlayerState>, RepoError> {
        let row = sqlx::query(query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        row.map(|row| row_to_state(&row)).transpose()
    }

    /// Run `query` (insert or upsert) with every column of `state` bound, under `id`.
    async fn write(
        &self,
        operation: &'static str,
        query: &str,
        id: PlayerId,
        state: &StoredPlayerState,
    ) -> Result<(), RepoError> {
        let xp = i64::try_from(state.xp)
            .map_err(|_| RepoError::invalid(format!("xp {} exceeds storage range", state.xp)))?;
        let flags = serde_json::to_string(&state.flags)?;
        let extra_data = serde_json::to_string(&state.extra_data)?;

        sqlx::query(query)
            .bind(id.to_string())
            .bind(state.phrase.as_str())
            .bind(state.user_name.as_str())
            .bind(i64::from(state.level))
            .bind(xp)
            .bind(state.last_updated.to_rfc3339())
            .bind(flags)
            .bind(extra_data)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        Ok(())
    }
}

#[async_trait]
impl PlayerStateRepo for SqlitePlayerStateRepo {
    async fn get(&self, id: PlayerId) -> Result<Option<StoredPlayerState>, RepoError> {
        ensure_lookup_id(id)?;
        self.fetch_one("get", &self.sql.select_by_id, id.to_string())
            .await
    }

    async fn get_by_phrase(&self, phrase: &str) -> Result<Option<StoredPlayerState>, RepoError> {
        ensure_lookup_phrase(phrase)?;
        self.fetch_one("get_by_phrase", &self.sql.select_by_phrase, phrase.to_string())
            .await
    }

    async fn create(&self, state: &StoredPlayerState) -> Result<(), RepoError> {
        ensure_creatable(state)?;
        self.write("create", &self.sql.insert, state.id, state).await
    }

    async fn save(&self, state: &StoredPlayerState) -> Result<PlayerId, RepoError> {
        ensure_persistable(state)?;

        let id = if state.id.is_nil() {
            PlayerId::new()
        } else {
            state.id
        };
        self.write("save", &self.sql.upsert, id, state).await?;
        Ok(id)
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<Leader>, RepoError> {
        ensure_leaderboard_limit(limit)?;

        let rows = sqlx::query(&self.sql.leaderboard)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("leaderboard", e))?;

        rows.iter()
            .map(|row| -> Result<Leader, RepoError> {
                Ok(Leader {
                    user_name: column(row, "user_name")?,
                    level: unsigned(column::<i64>(row, "level")?, "level")?,
                    xp: unsigned(column::<i64>(row, "xp")?, "xp")?,
                })
            })
            .collect()
    }
}

// =============================================================================
// Row mapping
// =============================================================================

fn row_to_state(row: &SqliteRow) -> Result<StoredPlayerState, RepoError> {
    let id: String = column(row, "id")?;
    let last_updated: String = column(row, "last_updated")?;
    let flags: Option<String> = column(row, "flags")?;
    let extra_data: Option<String> = column(row, "extra_data")?;

    let flags: Flags = match flags {
        Some(json) => serde_json::from_str::<Option<Flags>>(&json)
            .map_err(|e| RepoError::serialization(format!("failed to unmarshal flags: {e}")))?
            .unwrap_or_default(),
        None => Flags::new(),
    };
    let extra_data = match extra_data {
        Some(json) => serde_json::from_str(&json).map_err(|e| {
            RepoError::serialization(format!("failed to unmarshal extra data: {e}"))
        })?,
        None => serde_json::Value::Null,
    };

    Ok(StoredPlayerState {
        extra_data,
        xp: unsigned(column::<i64>(row, "xp")?, "xp")?,
        level: unsigned(column::<i64>(row, "level")?, "level")?,
        last_updated: DateTime::parse_from_rfc3339(&last_updated)
            .map_err(|e| RepoError::serialization(format!("last_updated: {e}")))?
            .with_timezone(&Utc),
        id: id
            .parse()
            .map_err(|e| RepoError::serialization(format!("stored id: {e}")))?,
        user_name: column(row, "user_name")?,
        phrase: column(row, "phrase")?,
        flags,
    })
}

fn column<'r, T>(row: &'r SqliteRow, name: &'static str) -> Result<T, RepoError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepoError::serialization(format!("failed to decode column {name}: {e}")))
}

fn unsigned<U: TryFrom<i64>>(value: i64, name: &'static str) -> Result<U, RepoError> {
    U::try_from(value)
        .map_err(|_| RepoError::serialization(format!("{name} out of range: {value}")))
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::invalid(format!("player id or phrase already in use ({})", db.message()))
        }
        _ => RepoError::database(operation, &err),
    }
}

/// Table names are spliced into SQL, so only `[A-Za-z_][A-Za-z0-9_]*` is allowed.
pub fn validate_table_name(table: &str) -> Result<(), RepoError> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(RepoError::invalid(format!("invalid table name: {table:?}")));
    }
    Ok(())
}
