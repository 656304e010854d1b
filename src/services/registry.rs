use std::collections::HashMap;

use crate::models::document::FileId;
use crate::services::lifecycle::TrackedFile;

/// Tracked documents keyed by identifier, listed in insertion order.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<FileId, TrackedFile>,
    order: Vec<FileId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a document. An entry with the same id is replaced in place.
    pub fn insert(&mut self, tracked: TrackedFile) {
        let id = tracked.file.id;
        if self.entries.insert(id, tracked).is_none() {
            self.order.push(id);
        }
    }

    /// Mutate one entry. Returns false when the id is not tracked.
    pub fn update<F>(&mut self, id: &FileId, f: F) -> bool
    where
        F: FnOnce(&mut TrackedFile),
    {
        match self.entries.get_mut(id) {
            Some(tracked) => {
                f(tracked);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &FileId) -> Option<TrackedFile> {
        let removed = self.entries.remove(id)?;
        self.order.retain(|tracked_id| tracked_id != id);
        Some(removed)
    }

    pub fn get(&self, id: &FileId) -> Option<&TrackedFile> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedFile> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
