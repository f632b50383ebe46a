//! In-process event store.
//!
//! Implements the full cache contract over a [`DashMap`]. Used by tests and
//! by embedders that want an ephemeral cache without touching disk.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{FavoriteSource, ReadableSource, SourceError, WritableSource};
use crate::event::Event;

#[derive(Debug, Clone)]
struct Entry {
    event: Event,
    favorite: bool,
}

/// DashMap-backed store implementing all three source capabilities.
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Current event count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matching events in (month, day) order, as basic projections. List
    /// reads never expose detail fields; those are reserved for detailed
    /// single-event lookups.
    fn collect_basic<F: Fn(&Entry) -> bool>(&self, keep: F) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .entries
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().event.to_basic())
            .collect();
        events.sort_by(|a, b| {
            a.month_day()
                .cmp(&b.month_day())
                .then_with(|| a.id().cmp(b.id()))
        });
        events
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadableSource for MemoryStore {
    async fn get_by_id(
        &self,
        id: &str,
        with_details: bool,
    ) -> Result<Option<Event>, SourceError> {
        Ok(self.entries.get(id).and_then(|entry| {
            if with_details {
                entry.value().event.is_detailed().then(|| entry.value().event.clone())
            } else {
                Some(entry.value().event.to_basic())
            }
        }))
    }

    async fn get_all(&self) -> Result<Vec<Event>, SourceError> {
        Ok(self.collect_basic(|_| true))
    }

    async fn get_by_title(&self, needle: &str) -> Result<Vec<Event>, SourceError> {
        let needle = needle.to_lowercase();
        Ok(self.collect_basic(|entry| entry.event.title().to_lowercase().contains(&needle)))
    }

    async fn get_by_month(&self, month: u8) -> Result<Vec<Event>, SourceError> {
        Ok(self.collect_basic(|entry| entry.event.month_day().month() == month))
    }
}

#[async_trait]
impl WritableSource for MemoryStore {
    async fn insert(&self, event: &Event) -> Result<(), SourceError> {
        if self.entries.contains_key(event.id()) {
            return Err(SourceError::Backend(format!(
                "duplicate id '{}'",
                event.id()
            )));
        }
        self.entries.insert(
            event.id().to_string(),
            Entry {
                event: event.clone(),
                favorite: false,
            },
        );
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<(), SourceError> {
        let favorite = self
            .entries
            .get(event.id())
            .map(|entry| entry.value().favorite)
            .unwrap_or(false);
        self.entries.insert(
            event.id().to_string(),
            Entry {
                event: event.clone(),
                favorite,
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), SourceError> {
        self.entries.remove(id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), SourceError> {
        self.entries.clear();
        Ok(())
    }
}

#[async_trait]
impl FavoriteSource for MemoryStore {
    async fn favorites(&self) -> Result<Vec<Event>, SourceError> {
        Ok(self.collect_basic(|entry| entry.favorite))
    }

    async fn is_favorite(&self, id: &str) -> Result<bool, SourceError> {
        Ok(self
            .entries
            .get(id)
            .map(|entry| entry.value().favorite)
            .unwrap_or(false))
    }

    async fn star(&self, id: &str) -> Result<(), SourceError> {
        if let Some(mut entry) = self.entries.get_mut(id) {
            entry.value_mut().favorite = true;
        }
        Ok(())
    }

    async fn unstar(&self, id: &str) -> Result<(), SourceError> {
        if let Some(mut entry) = self.entries.get_mut(id) {
            entry.value_mut().favorite = false;
        }
        Ok(())
    }

    async fn unstar_all(&self) -> Result<(), SourceError> {
        for mut entry in self.entries.iter_mut() {
            entry.value_mut().favorite = false;
        }
        Ok(())
    }
}
