//! # Observance Engine
//!
//! A cache-first reconciliation engine for annually recurring observance
//! days (international days, awareness days and the like), backed by the
//! Wikidata query service.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       EventEngine                           │
//! │  • Cache-first reads, optional remote refresh              │
//! │  • Diff merge (insert / update / delete by id)             │
//! │  • Failure fallback to cached data via Outcome             │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//! ┌────────────────┐  ┌──────────────────┐  ┌──────────────────┐
//! │  Local cache   │  │  Wikidata SPARQL │  │ Wikipedia intro  │
//! │ SQLite/memory  │  │   (read-only)    │  │   (enrichment)   │
//! │ read+write+fav │  │                  │  │                  │
//! └────────────────┘  └──────────────────┘  └──────────────────┘
//! ```
//!
//! Every read consults the local cache first. A refresh (requested, or
//! forced by an empty cache) fetches the authoritative answer remotely,
//! reconciles the cache to it and returns the fresh data; when the remote
//! is unreachable the previously cached data rides along as the failure's
//! fallback instead of being discarded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use observance_engine::{EngineConfig, EventEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = EngineConfig {
//!         database_url: Some("sqlite:observances.db".into()),
//!         ..Default::default()
//!     };
//!     let engine = EventEngine::connect(&config).await.expect("connect failed");
//!
//!     // Cache-first list; refresh=false still fetches on an empty cache.
//!     for event in engine.all(false).await.unwrap_or(vec![]) {
//!         println!("{} ({}-{})", event.title(),
//!             event.month_day().month(), event.month_day().day());
//!     }
//!
//!     // Detailed lookup with a forced refresh and intro enrichment.
//!     let day = engine.event("Q5305947", true, true).await;
//!     if let Some(Some(event)) = day.ok() {
//!         println!("{:?}", event.details());
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`engine`]: the [`EventEngine`] orchestrating cache, remote and
//!   enrichment
//! - [`source`]: capability traits and the concrete sources (SQLite,
//!   memory, Wikidata, Wikipedia)
//! - [`event`]: the [`Event`] value object and its [`MonthDay`] recurrence
//! - [`outcome`]: the [`Outcome`] success/failure-with-fallback container
//! - [`config`]: engine configuration

pub mod config;
pub mod engine;
pub mod event;
pub mod outcome;
pub mod source;

pub use config::EngineConfig;
pub use engine::{EngineError, EventEngine};
pub use event::{Event, EventDetails, InvalidMonthDay, MonthDay};
pub use outcome::Outcome;
pub use source::memory::MemoryStore;
pub use source::sqlite::SqliteStore;
pub use source::wikidata::WikidataSource;
pub use source::wikipedia::{IntroSource, WikipediaIntroSource};
pub use source::{
    CacheSource, FavoriteSource, ReadableSource, SourceError, WritableSource,
};
