//! Event source capability contracts.
//!
//! Three independent capabilities: read-only queries ([`ReadableSource`]),
//! mutations ([`WritableSource`]), and favorite marking
//! ([`FavoriteSource`]). Concrete sources compose what they support: the
//! local stores implement all three (and are therefore [`CacheSource`]s),
//! the remote query client implements only [`ReadableSource`].
//!
//! Sources report raw faults and build in no fallback behavior; graceful
//! degradation is the reconciliation engine's job.

pub mod memory;
pub mod sqlite;
pub mod wikidata;
pub mod wikipedia;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::Event;

/// A source-level fault.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Storage backend failure (pool, statement, constraint).
    #[error("storage backend error: {0}")]
    Backend(String),
    /// HTTP transport failure (connect, timeout, body read).
    #[error("http transport error: {0}")]
    Http(String),
    /// The remote service answered with a non-2xx status. An empty result
    /// set is not an error and never takes this path.
    #[error("remote service returned {status}: {body}")]
    Status { status: u16, body: String },
    /// A response or stored row that could not be interpreted.
    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Read-only event queries.
#[async_trait]
pub trait ReadableSource: Send + Sync {
    /// Look up a single event by id. With `with_details`, only an event
    /// whose detail fields were populated counts; a basic-only record is
    /// reported as absent.
    async fn get_by_id(&self, id: &str, with_details: bool)
        -> Result<Option<Event>, SourceError>;

    /// Every event, ordered by (month, day).
    async fn get_all(&self) -> Result<Vec<Event>, SourceError>;

    /// Events whose title contains `needle`, case-insensitively.
    async fn get_by_title(&self, needle: &str) -> Result<Vec<Event>, SourceError>;

    /// Events recurring in the given month (1-12).
    async fn get_by_month(&self, month: u8) -> Result<Vec<Event>, SourceError>;
}

/// Event mutations. All operations fail fast: a failed write aborts the
/// remainder of a batch, already-written rows stand.
#[async_trait]
pub trait WritableSource: Send + Sync {
    /// Insert a new event. Fails on a duplicate id.
    async fn insert(&self, event: &Event) -> Result<(), SourceError>;

    /// Insert events one by one, aborting on the first failure.
    async fn insert_all(&self, events: &[Event]) -> Result<(), SourceError> {
        for event in events {
            self.insert(event).await?;
        }
        Ok(())
    }

    /// Replace the event with the same id, atomically. Favorite marking on
    /// the row is left untouched.
    async fn update(&self, event: &Event) -> Result<(), SourceError>;

    /// Delete by id. Deleting an absent id is not an error.
    async fn delete(&self, id: &str) -> Result<(), SourceError>;

    /// Delete every event.
    async fn delete_all(&self) -> Result<(), SourceError>;
}

/// Favorite marking, keyed by event id. Local-only: favorite state never
/// leaves the cache and survives overwrites of the underlying event row.
#[async_trait]
pub trait FavoriteSource: Send + Sync {
    /// Every favorited event, ordered by (month, day).
    async fn favorites(&self) -> Result<Vec<Event>, SourceError>;

    async fn is_favorite(&self, id: &str) -> Result<bool, SourceError>;

    /// Mark as favorite. No-op when the id is not cached.
    async fn star(&self, id: &str) -> Result<(), SourceError>;

    /// Clear the favorite mark. No-op when the id is not cached.
    async fn unstar(&self, id: &str) -> Result<(), SourceError>;

    async fn unstar_all(&self) -> Result<(), SourceError>;
}

/// The full local-cache contract: everything a store needs so the engine
/// can read, reconcile and track favorites against it.
pub trait CacheSource: ReadableSource + WritableSource + FavoriteSource {}

impl<T: ReadableSource + WritableSource + FavoriteSource> CacheSource for T {}
