// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Event reconciliation engine.
//!
//! The [`EventEngine`] is the orchestrator that ties the sources together:
//! the local cache (read first, always), the remote query service
//! (consulted on refresh or cache miss) and the article-intro enrichment
//! (attached to detailed remote results, best effort).
//!
//! ```text
//! caller ──▶ engine ──▶ local cache ──▶ [remote query] ──▶ [enrichment]
//!                             ▲                │
//!                             └── diff merge ──┘
//! ```
//!
//! Failure policy, uniformly expressed through [`Outcome`]:
//! - local cache faults are fatal for the call, no fallback, no remote
//!   attempt;
//! - remote faults degrade to the cached data as the outcome's fallback;
//! - enrichment faults are logged and swallowed;
//! - "not found" is an absent option, never an error.
//!
//! The engine holds no state between calls and never retries; overlapping
//! refreshes for the same key are not coalesced, the cache sees last write
//! wins.
//!
//! # Example
//!
//! ```rust,no_run
//! use observance_engine::{EngineConfig, EventEngine};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = EngineConfig::default();
//! let engine = EventEngine::connect(&config).await.expect("connect failed");
//!
//! // Cache-first; the empty cache triggers a remote fetch.
//! let events = engine.all(false).await.unwrap_or(vec![]);
//! println!("{} observance days", events.len());
//! # }
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::event::Event;
use crate::outcome::Outcome;
use crate::source::memory::MemoryStore;
use crate::source::sqlite::SqliteStore;
use crate::source::wikidata::WikidataSource;
use crate::source::wikipedia::{IntroSource, WikipediaIntroSource};
use crate::source::{CacheSource, ReadableSource, SourceError};

/// A failed engine operation, classified by which collaborator faulted.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The local cache faulted. Fatal: no fallback accompanies it.
    #[error("local store failure: {0}")]
    Storage(#[source] SourceError),
    /// The remote query faulted. The outcome carries whatever the cache
    /// held as fallback.
    #[error("remote query failure: {0}")]
    Remote(#[source] SourceError),
}

enum ListQuery<'a> {
    All,
    Title(&'a str),
    Month(u8),
}

/// Cache-first reconciling reader over a local cache and a remote source.
pub struct EventEngine {
    local: Arc<dyn CacheSource>,
    remote: Arc<dyn ReadableSource>,
    intro: Arc<dyn IntroSource>,
}

impl EventEngine {
    pub fn new(
        local: Arc<dyn CacheSource>,
        remote: Arc<dyn ReadableSource>,
        intro: Arc<dyn IntroSource>,
    ) -> Self {
        Self {
            local,
            remote,
            intro,
        }
    }

    /// Wire up the production sources from config: SQLite cache (in-process
    /// memory store when no database URL is configured), Wikidata query
    /// service, Wikipedia intro enrichment.
    pub async fn connect(config: &EngineConfig) -> Result<Self, SourceError> {
        let local: Arc<dyn CacheSource> = match &config.database_url {
            Some(url) => Arc::new(SqliteStore::open(url).await?),
            None => Arc::new(MemoryStore::new()),
        };
        let remote = Arc::new(WikidataSource::new(config)?);
        let intro = Arc::new(WikipediaIntroSource::new(config)?);
        Ok(Self::new(local, remote, intro))
    }

    /// Look up one event. With `refresh` (or on a cache miss) the remote
    /// source is consulted, a detailed result is enriched with its article
    /// intro, and the result is merged back into the cache.
    pub async fn event(
        &self,
        id: &str,
        with_details: bool,
        refresh: bool,
    ) -> Outcome<Option<Event>> {
        let cached = match self.local.get_by_id(id, with_details).await {
            Ok(found) => found,
            Err(e) => return Outcome::failure(EngineError::Storage(e)),
        };

        if !refresh && cached.is_some() {
            debug!(id, "serving event from cache");
            return Outcome::success(cached);
        }

        let fetched = match self.remote.get_by_id(id, with_details).await {
            Ok(found) => found,
            Err(e) => {
                warn!(id, error = %e, "remote event fetch failed, falling back to cache");
                return Outcome::failure_with(EngineError::Remote(e), cached);
            }
        };

        let fetched = match (with_details, fetched) {
            (true, Some(event)) => Some(self.enrich(event).await),
            (_, fetched) => fetched,
        };

        if let Err(e) = self.merge_one(fetched.as_ref(), cached.as_ref()).await {
            return Outcome::failure(EngineError::Storage(e));
        }
        Outcome::success(fetched)
    }

    /// Every event. Refreshes from remote when asked to, or when the cache
    /// is empty.
    pub async fn all(&self, refresh: bool) -> Outcome<Vec<Event>> {
        self.list(ListQuery::All, refresh).await
    }

    /// Events whose title contains `needle`, case-insensitively.
    pub async fn by_title(&self, needle: &str, refresh: bool) -> Outcome<Vec<Event>> {
        self.list(ListQuery::Title(needle), refresh).await
    }

    /// Events recurring in the given month (1-12).
    pub async fn by_month(&self, month: u8, refresh: bool) -> Outcome<Vec<Event>> {
        self.list(ListQuery::Month(month), refresh).await
    }

    async fn list(&self, query: ListQuery<'_>, refresh: bool) -> Outcome<Vec<Event>> {
        let cached = match self.local_list(&query).await {
            Ok(events) => events,
            Err(e) => return Outcome::failure(EngineError::Storage(e)),
        };

        if !refresh && !cached.is_empty() {
            debug!(count = cached.len(), "serving list from cache");
            return Outcome::success(cached);
        }

        let fetched = match self.remote_list(&query).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "remote list fetch failed, falling back to cache");
                return Outcome::failure_with(EngineError::Remote(e), cached);
            }
        };

        if let Err(e) = self.merge_list(&fetched, &cached).await {
            return Outcome::failure(EngineError::Storage(e));
        }
        Outcome::success(fetched)
    }

    async fn local_list(&self, query: &ListQuery<'_>) -> Result<Vec<Event>, SourceError> {
        match query {
            ListQuery::All => self.local.get_all().await,
            ListQuery::Title(needle) => self.local.get_by_title(needle).await,
            ListQuery::Month(month) => self.local.get_by_month(*month).await,
        }
    }

    async fn remote_list(&self, query: &ListQuery<'_>) -> Result<Vec<Event>, SourceError> {
        match query {
            ListQuery::All => self.remote.get_all().await,
            ListQuery::Title(needle) => self.remote.get_by_title(needle).await,
            ListQuery::Month(month) => self.remote.get_by_month(*month).await,
        }
    }

    /// Attach the article intro to a detailed remote event. Enrichment is
    /// best effort: failure leaves the event as fetched.
    async fn enrich(&self, event: Event) -> Event {
        let Some(url) = event.article_url().map(String::from) else {
            return event;
        };
        match self.intro.article_intro(&url).await {
            Ok(text) => event.with_article_intro(text),
            Err(e) => {
                warn!(id = event.id(), error = %e, "article intro fetch failed, continuing without");
                event
            }
        }
    }

    async fn merge_one(
        &self,
        fetched: Option<&Event>,
        cached: Option<&Event>,
    ) -> Result<(), SourceError> {
        match (fetched, cached) {
            // A single-fetch miss never deletes: absence from one lookup
            // does not mean the entity is gone remotely.
            (None, _) => Ok(()),
            // A detailed lookup reports basic-only rows as absent, so an
            // apparent cache miss may still have a row underneath: write
            // through the upsert path, not a plain insert.
            (Some(fetched), None) => self.local.update(fetched).await,
            (Some(fetched), Some(cached)) if fetched != cached => {
                debug!(id = fetched.id(), "cached event changed remotely, rewriting");
                self.local.update(fetched).await
            }
            _ => Ok(()),
        }
    }

    /// Three-way diff by id, written through sequentially. The passes
    /// target disjoint id sets; there is no cross-item atomicity, a failed
    /// write aborts the merge with prior writes standing.
    async fn merge_list(&self, fetched: &[Event], cached: &[Event]) -> Result<(), SourceError> {
        for stale in cached {
            if !fetched.iter().any(|f| f.same_entity(stale)) {
                debug!(id = stale.id(), "remote no longer reports event, deleting");
                self.local.delete(stale.id()).await?;
            }
        }
        for event in fetched {
            if cached.iter().any(|c| c.same_entity(event) && c != event) {
                self.local.update(event).await?;
            }
        }
        for event in fetched {
            if !cached.iter().any(|c| c.same_entity(event)) {
                self.local.insert(event).await?;
            }
        }
        Ok(())
    }

    // Favorite marking passes straight through to the local cache; the
    // remote source is never involved.

    pub async fn favorites(&self) -> Result<Vec<Event>, EngineError> {
        self.local.favorites().await.map_err(EngineError::Storage)
    }

    pub async fn is_favorite(&self, id: &str) -> Result<bool, EngineError> {
        self.local.is_favorite(id).await.map_err(EngineError::Storage)
    }

    pub async fn star(&self, id: &str) -> Result<(), EngineError> {
        self.local.star(id).await.map_err(EngineError::Storage)
    }

    pub async fn unstar(&self, id: &str) -> Result<(), EngineError> {
        self.local.unstar(id).await.map_err(EngineError::Storage)
    }

    pub async fn unstar_all(&self) -> Result<(), EngineError> {
        self.local.unstar_all().await.map_err(EngineError::Storage)
    }
}
