use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
use tracing::info;

use super::{StateStore, StoreError, Version, VersionedState};
use crate::workflow::{CommentId, CommentState};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// SQLite-backed store; the version column carries the compare-and-swap
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Connect, creating the database and running migrations if asked to
    pub async fn connect(database_url: &str, max_connections: u32, auto_migrate: bool) -> Result<Self> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    async fn current_version(&self, id: CommentId) -> Result<Option<Version>, StoreError> {
        let row = sqlx::query("SELECT version FROM comment_states WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Version(row.get::<i64, _>("version") as u64)))
    }

    /// Close database connections gracefully
    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
        info!("Database connections closed");
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get(&self, id: CommentId) -> Result<VersionedState, StoreError> {
        let row = sqlx::query("SELECT version, state FROM comment_states WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(StoreError::NotFound);
        };

        let version: i64 = row.get("version");
        let state: String = row.get("state");

        Ok(VersionedState {
            version: Version(version as u64),
            state: serde_json::from_str(&state)?,
        })
    }

    async fn put(
        &self,
        id: CommentId,
        state: &CommentState,
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        let serialized = serde_json::to_string(state)?;

        let result = match expected {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO comment_states (id, version, state, updated_at)
                    VALUES (?1, 1, ?2, datetime('now'))
                    ON CONFLICT(id) DO NOTHING
                    "#,
                )
                .bind(id.to_string())
                .bind(&serialized)
                .execute(&self.pool)
                .await?
            }
            Some(version) => {
                sqlx::query(
                    r#"
                    UPDATE comment_states
                    SET version = version + 1, state = ?1, updated_at = datetime('now')
                    WHERE id = ?2 AND version = ?3
                    "#,
                )
                .bind(&serialized)
                .bind(id.to_string())
                .bind(version.0 as i64)
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            let found = self.current_version(id).await?;
            return Err(StoreError::Conflict { expected, found });
        }

        Ok(expected.map(Version::next).unwrap_or(Version::FIRST))
    }
}
