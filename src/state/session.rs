/// Draft session controller
///
/// Mediates between the editable form and the [`DraftStore`]. At most one
/// draft is checked out into the form at a time; which one is tracked by
/// the [`Session`] value itself, so independent sessions never interfere.

use chrono::{DateTime, Utc};

use super::data::Draft;
use super::store::DraftStore;
use crate::error::StoreError;

/// The values currently shown in the editor form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftForm {
    pub title: String,
    pub tags: String,
    pub slug: String,
    pub category: String,
    pub image: String,
    pub content: String,
}

impl DraftForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn fill_from(&mut self, draft: &Draft) {
        self.title = draft.title.clone();
        self.tags = draft.tags.clone();
        self.slug = draft.slug.clone();
        self.category = draft.category.clone();
        self.image = draft.image.clone();
        self.content = draft.content.clone();
    }
}

/// Time-based draft identifiers.
///
/// Ids are milliseconds since the epoch, bumped past the last id issued by
/// this generator so two drafts created within one millisecond still differ.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    /// Next id not rejected by `taken`
    pub fn next(&mut self, taken: impl Fn(&str) -> bool) -> String {
        let mut candidate = Utc::now().timestamp_millis().max(self.last + 1);
        while taken(&candidate.to_string()) {
            candidate += 1;
        }
        self.last = candidate;
        candidate.to_string()
    }
}

/// What happened to the session after a delete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; nothing changed
    Declined,
    /// A draft other than the current one was removed
    Removed,
    /// The current draft was removed and this one was loaded in its place
    Switched(String),
    /// The last draft was removed and a fresh one created
    Replaced(String),
}

#[derive(Debug, Default)]
pub struct Session {
    current: Option<String>,
    ids: IdGenerator,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Start a fresh, empty draft and persist it right away so it shows
    /// up in the list before any edit.
    pub fn create_new(
        &mut self,
        store: &DraftStore,
        form: &mut DraftForm,
    ) -> Result<String, StoreError> {
        let id = self.ids.next(|candidate| store.contains(candidate));

        self.current = Some(id.clone());
        form.clear();
        self.save(store, form)?;

        tracing::info!("Created draft {}", id);
        Ok(id)
    }

    /// Check `id` out into the form. Unknown ids leave everything as is.
    pub fn load(&mut self, store: &DraftStore, form: &mut DraftForm, id: &str) -> bool {
        let Some(draft) = store.find(id) else {
            tracing::debug!("Ignoring load of unknown draft {}", id);
            return false;
        };

        form.fill_from(&draft);
        self.current = Some(draft.id);
        true
    }

    /// Harvest the form into the current draft and upsert it.
    ///
    /// `publishTime` is kept from the stored record when there is one.
    /// `updatedAt` never moves backwards, even if the clock does.
    /// Returns the saved record, or `None` when no draft is current.
    pub fn save(&self, store: &DraftStore, form: &DraftForm) -> Result<Option<Draft>, StoreError> {
        let Some(id) = self.current.as_deref() else {
            return Ok(None);
        };

        let now = Utc::now();
        let stored = store.find(id);
        let publish_time = stored
            .as_ref()
            .and_then(|d| d.publish_time)
            .unwrap_or(now);
        let updated_at = stored
            .as_ref()
            .map_or(now, |d| monotonic(d.updated_at, now));

        let draft = Draft {
            id: id.to_string(),
            title: form.title.clone(),
            tags: form.tags.clone(),
            slug: form.slug.clone(),
            category: form.category.clone(),
            image: form.image.clone(),
            content: form.content.clone(),
            publish_time: Some(publish_time),
            updated_at,
        };

        store.upsert(draft.clone())?;
        tracing::debug!("Saved draft {}", id);
        Ok(Some(draft))
    }

    /// Remove `id` once `confirm` agrees.
    ///
    /// Removing the current draft moves the session to the most recently
    /// updated remaining draft, or to a brand new one if none remain.
    pub fn delete(
        &mut self,
        store: &DraftStore,
        form: &mut DraftForm,
        id: &str,
        confirm: impl FnOnce() -> bool,
    ) -> Result<DeleteOutcome, StoreError> {
        if !confirm() {
            return Ok(DeleteOutcome::Declined);
        }

        store.delete(id)?;
        tracing::info!("Deleted draft {}", id);

        if self.current.as_deref() != Some(id) {
            return Ok(DeleteOutcome::Removed);
        }

        self.current = None;
        match store.list_recent().into_iter().next() {
            Some(next) => {
                self.load(store, form, &next.id);
                Ok(DeleteOutcome::Switched(next.id))
            }
            None => {
                let id = self.create_new(store, form)?;
                Ok(DeleteOutcome::Replaced(id))
            }
        }
    }

    /// Pick what to show at startup: the most recent draft, or a new one
    pub fn open_initial(
        &mut self,
        store: &DraftStore,
        form: &mut DraftForm,
    ) -> Result<String, StoreError> {
        if let Some(latest) = store.list_recent().into_iter().next() {
            self.load(store, form, &latest.id);
            return Ok(latest.id);
        }
        self.create_new(store, form)
    }
}

fn monotonic(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    previous.max(now)
}
