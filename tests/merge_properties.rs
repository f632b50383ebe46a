//! Property-based tests for the reconciliation merge.
//!
//! Random cache and remote states are generated and merged; the cache must
//! afterwards mirror the remote result set exactly, and re-merging an
//! identical remote state must be a no-op.
//!
//! Run with: `cargo test --test merge_properties`

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proptest::prelude::*;

use observance_engine::{
    Event, EventEngine, IntroSource, MemoryStore, MonthDay, ReadableSource, SourceError,
};

/// Remote source serving a swappable list.
struct ListRemote {
    events: Mutex<Vec<Event>>,
}

impl ListRemote {
    fn new(events: Vec<Event>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(events),
        })
    }

    fn set_events(&self, events: Vec<Event>) {
        *self.events.lock().unwrap() = events;
    }
}

#[async_trait]
impl ReadableSource for ListRemote {
    async fn get_by_id(
        &self,
        id: &str,
        _with_details: bool,
    ) -> Result<Option<Event>, SourceError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id() == id)
            .cloned())
    }

    async fn get_all(&self) -> Result<Vec<Event>, SourceError> {
        Ok(self.events.lock().unwrap().clone())
    }

    async fn get_by_title(&self, needle: &str) -> Result<Vec<Event>, SourceError> {
        let needle = needle.to_lowercase();
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.title().to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn get_by_month(&self, month: u8) -> Result<Vec<Event>, SourceError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.month_day().month() == month)
            .cloned()
            .collect())
    }
}

/// Enrichment source that is never reachable.
struct NoIntro;

#[async_trait]
impl IntroSource for NoIntro {
    async fn article_intro(&self, _article_url: &str) -> Result<String, SourceError> {
        Err(SourceError::Http("unreachable".into()))
    }
}

/// Generate up to `max` basic events with distinct ids.
fn event_set_strategy(max: usize) -> impl Strategy<Value = Vec<Event>> {
    prop::collection::hash_map(
        "Q[1-9][0-9]{0,3}",
        ("[A-Za-z][A-Za-z ]{0,14}", 1u8..=12, 1u8..=28),
        0..max,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, (title, month, day))| {
                Event::basic(id, title, MonthDay::new(month, day).unwrap())
            })
            .collect()
    })
}

/// The cache contents, ordered the way the store lists them.
async fn cache_contents(store: &MemoryStore) -> Vec<Event> {
    store.get_all().await.unwrap()
}

/// The expected cache after reconciling to `events`: the same set, in the
/// store's (month, day, id) listing order.
fn expected_contents(events: &[Event]) -> Vec<Event> {
    let mut expected: Vec<Event> = events.to_vec();
    expected.sort_by(|a, b| {
        a.month_day()
            .cmp(&b.month_day())
            .then_with(|| a.id().cmp(b.id()))
    });
    expected
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A refresh reconciles the cache to the remote set exactly, whatever
    /// the two previously held.
    #[test]
    fn prop_refresh_is_full_replacement(
        initial in event_set_strategy(12),
        replacement in event_set_strategy(12),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let remote = ListRemote::new(initial.clone());
            let engine = EventEngine::new(store.clone(), remote.clone(), Arc::new(NoIntro));

            assert!(engine.all(true).await.is_success());
            assert_eq!(cache_contents(&store).await, expected_contents(&initial));

            remote.set_events(replacement.clone());
            assert!(engine.all(true).await.is_success());
            assert_eq!(cache_contents(&store).await, expected_contents(&replacement));
        });
    }

    /// Merging the same remote list twice is a no-op: the second merge
    /// succeeds (a duplicate insert would fail) and leaves the cache
    /// unchanged.
    #[test]
    fn prop_merge_is_idempotent(events in event_set_strategy(12)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let remote = ListRemote::new(events.clone());
            let engine = EventEngine::new(store.clone(), remote, Arc::new(NoIntro));

            assert!(engine.all(true).await.is_success());
            let after_first = cache_contents(&store).await;

            assert!(engine.all(true).await.is_success());
            assert_eq!(cache_contents(&store).await, after_first);
        });
    }

    /// Favorite marks ride through reconciliation untouched for every id
    /// the remote still reports.
    #[test]
    fn prop_favorites_survive_refresh(events in event_set_strategy(12)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let remote = ListRemote::new(events.clone());
            let engine = EventEngine::new(store.clone(), remote, Arc::new(NoIntro));

            assert!(engine.all(true).await.is_success());
            for event in &events {
                engine.star(event.id()).await.unwrap();
            }

            assert!(engine.all(true).await.is_success());
            for event in &events {
                assert!(engine.is_favorite(event.id()).await.unwrap());
            }
        });
    }
}
