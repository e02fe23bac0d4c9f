/// The durable draft collection
///
/// Drafts are stored as one JSON array under a single storage key.
/// Every mutation rewrites the whole array in one `set_item` call, so
/// readers never observe a partially written collection.

use super::data::{sort_recent_first, Draft};
use super::library::LocalStorage;
use crate::config::STORAGE_KEY_DRAFTS;
use crate::error::StoreError;

/// Borrowed view over the draft entry of a [`LocalStorage`]
#[derive(Debug, Clone, Copy)]
pub struct DraftStore<'a> {
    storage: &'a LocalStorage,
}

impl<'a> DraftStore<'a> {
    pub fn new(storage: &'a LocalStorage) -> Self {
        Self { storage }
    }

    /// All drafts in storage order.
    ///
    /// An absent or unparsable entry reads as an empty collection.
    pub fn list(&self) -> Vec<Draft> {
        let json = match self.storage.get_item(STORAGE_KEY_DRAFTS) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read drafts, treating as empty: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&json) {
            Ok(drafts) => drafts,
            Err(e) => {
                tracing::warn!("Stored drafts are unparsable, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// All drafts, most recently updated first
    pub fn list_recent(&self) -> Vec<Draft> {
        let mut drafts = self.list();
        sort_recent_first(&mut drafts);
        drafts
    }

    pub fn find(&self, id: &str) -> Option<Draft> {
        self.list().into_iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.list().iter().any(|d| d.id == id)
    }

    /// Replace the draft with the same id, or append it
    pub fn upsert(&self, draft: Draft) -> Result<(), StoreError> {
        let mut drafts = self.list();
        match drafts.iter_mut().find(|d| d.id == draft.id) {
            Some(existing) => *existing = draft,
            None => drafts.push(draft),
        }
        self.write_all(&drafts)
    }

    /// Remove the draft with `id`; absent ids are not an error.
    /// Returns whether anything was removed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut drafts = self.list();
        let before = drafts.len();
        drafts.retain(|d| d.id != id);

        if drafts.len() == before {
            return Ok(false);
        }

        self.write_all(&drafts)?;
        Ok(true)
    }

    fn write_all(&self, drafts: &[Draft]) -> Result<(), StoreError> {
        let json = serde_json::to_string(drafts)?;
        self.storage.set_item(STORAGE_KEY_DRAFTS, &json)
    }
}
