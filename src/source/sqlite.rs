// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQLite cache store.
//!
//! The persistent local cache behind the reconciliation engine. One row per
//! event:
//!
//! ```sql
//! CREATE TABLE events (
//!   id TEXT PRIMARY KEY,
//!   title TEXT NOT NULL,
//!   month INTEGER NOT NULL,          -- 1-12
//!   day_of_month INTEGER NOT NULL,   -- 1-31
//!   article_url TEXT,
//!   article_intro TEXT,
//!   inception_date TEXT,             -- ISO date
//!   founder TEXT,
//!   details_fetched INTEGER NOT NULL DEFAULT 0,
//!   user_favorite INTEGER NOT NULL DEFAULT 0
//! )
//! ```
//!
//! `details_fetched` records whether the detail columns were populated by a
//! detailed fetch; `user_favorite` is local-only state that reconciliation
//! writes never touch. Updates are atomic UPSERTs rewriting every event
//! column except `user_favorite`, so there is no window where the row is
//! absent and favorite marks survive basic/detailed overwrites.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::Row;
use tracing::debug;

use super::{FavoriteSource, ReadableSource, SourceError, WritableSource};
use crate::event::{Event, EventDetails, MonthDay};

const BASIC_COLUMNS: &str = "id, title, month, day_of_month";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url`, e.g.
    /// `sqlite:observances.db`. WAL journaling is enabled for concurrent
    /// reads during writes.
    pub async fn open(url: &str) -> Result<Self, SourceError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| SourceError::Backend(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;

        let store = Self { pool };
        store.init_schema().await?;
        debug!(url, "sqlite store opened");
        Ok(store)
    }

    /// An ephemeral in-memory database, for tests and throwaway caches.
    /// Single connection: each SQLite memory database is private to its
    /// connection.
    pub async fn open_in_memory() -> Result<Self, SourceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), SourceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                month INTEGER NOT NULL,
                day_of_month INTEGER NOT NULL,
                article_url TEXT,
                article_intro TEXT,
                inception_date TEXT,
                founder TEXT,
                details_fetched INTEGER NOT NULL DEFAULT 0,
                user_favorite INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SourceError::Backend(e.to_string()))?;
        Ok(())
    }

    fn month_day_from_row(row: &SqliteRow) -> Result<MonthDay, SourceError> {
        let month: i64 = row
            .try_get("month")
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        let day: i64 = row
            .try_get("day_of_month")
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        let month = u8::try_from(month)
            .map_err(|_| SourceError::Malformed(format!("month out of range: {month}")))?;
        let day = u8::try_from(day)
            .map_err(|_| SourceError::Malformed(format!("day out of range: {day}")))?;
        MonthDay::new(month, day).map_err(|e| SourceError::Malformed(e.to_string()))
    }

    fn basic_from_row(row: &SqliteRow) -> Result<Event, SourceError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        let title: String = row
            .try_get("title")
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        Ok(Event::basic(id, title, Self::month_day_from_row(row)?))
    }

    fn detailed_from_row(row: &SqliteRow) -> Result<Event, SourceError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        let title: String = row
            .try_get("title")
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        let article_url: Option<String> = row
            .try_get("article_url")
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        let article_intro: Option<String> = row
            .try_get("article_intro")
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        let inception_date: Option<String> = row
            .try_get("inception_date")
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        let founder: Option<String> = row
            .try_get("founder")
            .map_err(|e| SourceError::Backend(e.to_string()))?;

        let inception = inception_date
            .map(|s| {
                chrono::NaiveDate::from_str(&s)
                    .map_err(|e| SourceError::Malformed(format!("bad inception_date '{s}': {e}")))
            })
            .transpose()?;

        Ok(Event::detailed(
            id,
            title,
            Self::month_day_from_row(row)?,
            EventDetails {
                article_url,
                article_intro,
                inception,
                founder,
            },
        ))
    }

    async fn fetch_basic_list(
        &self,
        sql: &str,
        bind: Option<BasicBind<'_>>,
    ) -> Result<Vec<Event>, SourceError> {
        let mut query = sqlx::query(sql);
        match bind {
            Some(BasicBind::Text(text)) => query = query.bind(text),
            Some(BasicBind::Int(n)) => query = query.bind(n),
            None => {}
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        rows.iter().map(Self::basic_from_row).collect()
    }
}

enum BasicBind<'a> {
    Text(&'a str),
    Int(i64),
}

#[async_trait]
impl ReadableSource for SqliteStore {
    async fn get_by_id(
        &self,
        id: &str,
        with_details: bool,
    ) -> Result<Option<Event>, SourceError> {
        let row = sqlx::query(
            "SELECT id, title, month, day_of_month, article_url, article_intro, \
             inception_date, founder, details_fetched \
             FROM events WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SourceError::Backend(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        if with_details {
            let details_fetched: bool = row
                .try_get("details_fetched")
                .map_err(|e| SourceError::Backend(e.to_string()))?;
            // A basic-only row is "not found" for a detailed read.
            if !details_fetched {
                return Ok(None);
            }
            Ok(Some(Self::detailed_from_row(&row)?))
        } else {
            Ok(Some(Self::basic_from_row(&row)?))
        }
    }

    async fn get_all(&self) -> Result<Vec<Event>, SourceError> {
        self.fetch_basic_list(
            &format!("SELECT {BASIC_COLUMNS} FROM events ORDER BY month, day_of_month"),
            None,
        )
        .await
    }

    async fn get_by_title(&self, needle: &str) -> Result<Vec<Event>, SourceError> {
        // SQLite LIKE is case-insensitive for ASCII.
        self.fetch_basic_list(
            &format!(
                "SELECT {BASIC_COLUMNS} FROM events \
                 WHERE title LIKE '%' || ?1 || '%' ORDER BY month, day_of_month"
            ),
            Some(BasicBind::Text(needle)),
        )
        .await
    }

    async fn get_by_month(&self, month: u8) -> Result<Vec<Event>, SourceError> {
        self.fetch_basic_list(
            &format!(
                "SELECT {BASIC_COLUMNS} FROM events \
                 WHERE month = ?1 ORDER BY month, day_of_month"
            ),
            Some(BasicBind::Int(i64::from(month))),
        )
        .await
    }
}

#[async_trait]
impl WritableSource for SqliteStore {
    async fn insert(&self, event: &Event) -> Result<(), SourceError> {
        let details = event.details();
        sqlx::query(
            "INSERT INTO events \
             (id, title, month, day_of_month, article_url, article_intro, \
              inception_date, founder, details_fetched) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(event.id())
        .bind(event.title())
        .bind(i64::from(event.month_day().month()))
        .bind(i64::from(event.month_day().day()))
        .bind(details.and_then(|d| d.article_url.as_deref()))
        .bind(details.and_then(|d| d.article_intro.as_deref()))
        .bind(details.and_then(|d| d.inception.map(|date| date.to_string())))
        .bind(details.and_then(|d| d.founder.as_deref()))
        .bind(event.is_detailed())
        .execute(&self.pool)
        .await
        .map_err(|e| SourceError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<(), SourceError> {
        let details = event.details();
        // user_favorite is deliberately absent from the UPDATE SET list.
        sqlx::query(
            "INSERT INTO events \
             (id, title, month, day_of_month, article_url, article_intro, \
              inception_date, founder, details_fetched) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(id) DO UPDATE SET \
                title = excluded.title, \
                month = excluded.month, \
                day_of_month = excluded.day_of_month, \
                article_url = excluded.article_url, \
                article_intro = excluded.article_intro, \
                inception_date = excluded.inception_date, \
                founder = excluded.founder, \
                details_fetched = excluded.details_fetched",
        )
        .bind(event.id())
        .bind(event.title())
        .bind(i64::from(event.month_day().month()))
        .bind(i64::from(event.month_day().day()))
        .bind(details.and_then(|d| d.article_url.as_deref()))
        .bind(details.and_then(|d| d.article_intro.as_deref()))
        .bind(details.and_then(|d| d.inception.map(|date| date.to_string())))
        .bind(details.and_then(|d| d.founder.as_deref()))
        .bind(event.is_detailed())
        .execute(&self.pool)
        .await
        .map_err(|e| SourceError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), SourceError> {
        sqlx::query("DELETE FROM events WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), SourceError> {
        sqlx::query("DELETE FROM events")
            .execute(&self.pool)
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl FavoriteSource for SqliteStore {
    async fn favorites(&self) -> Result<Vec<Event>, SourceError> {
        self.fetch_basic_list(
            &format!(
                "SELECT {BASIC_COLUMNS} FROM events \
                 WHERE user_favorite = 1 ORDER BY month, day_of_month"
            ),
            None,
        )
        .await
    }

    async fn is_favorite(&self, id: &str) -> Result<bool, SourceError> {
        let row = sqlx::query("SELECT 1 FROM events WHERE id = ?1 AND user_favorite = 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn star(&self, id: &str) -> Result<(), SourceError> {
        sqlx::query("UPDATE events SET user_favorite = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn unstar(&self, id: &str) -> Result<(), SourceError> {
        sqlx::query("UPDATE events SET user_favorite = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn unstar_all(&self) -> Result<(), SourceError> {
        sqlx::query("UPDATE events SET user_favorite = 0")
            .execute(&self.pool)
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;
        Ok(())
    }
}
