use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{fs, path::Path, str::FromStr};
use tokio::sync::Mutex;
use tracing::debug;

use shared::domain::{Session, SessionToken, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub session: Session,
    pub persisted_at: DateTime<Utc>,
}

/// Durable slot for the signed-in user's id and token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: &Session) -> Result<()>;
    async fn load(&self) -> Result<Option<StoredSession>>;
    async fn clear(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: Pool<Sqlite>,
}

impl SqliteSessionStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open session database '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn save(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO session_state (slot, user_id, token, email_verified, persisted_at) VALUES (1, ?, ?, ?, ?)
             ON CONFLICT(slot) DO UPDATE SET user_id = excluded.user_id, token = excluded.token,
             email_verified = excluded.email_verified, persisted_at = excluded.persisted_at",
        )
        .bind(session.user_id.as_str())
        .bind(session.token.as_str())
        .bind(session.email_verified)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("failed to persist session")?;
        debug!(user_id = %session.user_id, "session persisted");
        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredSession>> {
        let row = sqlx::query(
            "SELECT user_id, token, email_verified, persisted_at FROM session_state WHERE slot = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("failed to load session")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let persisted_at: String = row.try_get("persisted_at")?;
        let persisted_at = DateTime::parse_from_rfc3339(&persisted_at)
            .with_context(|| format!("invalid persisted_at timestamp '{persisted_at}'"))?
            .with_timezone(&Utc);

        Ok(Some(StoredSession {
            session: Session::new(
                UserId(row.try_get("user_id")?),
                SessionToken(row.try_get("token")?),
                row.try_get("email_verified")?,
            ),
            persisted_at,
        }))
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM session_state")
            .execute(&self.pool)
            .await
            .context("failed to clear session")?;
        debug!("session cleared");
        Ok(())
    }
}

/// Process-local store, used when no database is configured and in tests.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: &Session) -> Result<()> {
        *self.slot.lock().await = Some(StoredSession {
            session: session.clone(),
            persisted_at: Utc::now(),
        });
        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn clear(&self) -> Result<()> {
        self.slot.lock().await.take();
        Ok(())
    }
}

/// Turns a bare path into a sqlite URL and creates its parent directory.
pub fn prepare_database_url(raw_database_url: &str) -> Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return "sqlite::memory:".to_string();
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.replace('\\', "/");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

/// Creates the directory holding a file-backed sqlite database. Memory and non-sqlite URLs are left alone.
fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    if database_url == "sqlite::memory:" {
        return Ok(());
    }
    let Some(rest) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    let file = rest.split_once('?').map_or(rest, |(file, _)| file);

    match Path::new(file).parent() {
        Some(parent) if !file.is_empty() && !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create directory '{}' for session database '{database_url}'",
                    parent.display()
                )
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
