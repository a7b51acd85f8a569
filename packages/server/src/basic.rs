//! In-memory collection adapter.
//!
//! Entries live in insertion order behind an `RwLock`. Each entry gets a
//! `urn:uuid` id and a path name derived from the Slug header or its title,
//! made unique within the collection.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use abdera_model::app::Categories;
use abdera_model::atom::{Content, Entry, Feed, Link, Person};
use chrono::Utc;
use uuid::Uuid;

use crate::adapter::{AcceptMap, AdapterContext, CollectionAdapter, MediaPart};
use crate::error::{AdapterError, AdapterResult};

#[derive(Debug, Clone)]
struct StoredEntry {
    name: String,
    entry: Entry,
    media: Option<MediaPart>,
}

/// Collection adapter keeping everything in process memory.
#[derive(Debug)]
pub struct InMemoryAdapter {
    title: String,
    author: String,
    feed_id: String,
    accepts: AcceptMap,
    categories: Option<Categories>,
    store: RwLock<Vec<StoredEntry>>,
}

impl InMemoryAdapter {
    /// A collection accepting Atom entries only.
    #[must_use]
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            feed_id: urn_uuid(),
            accepts: AcceptMap::entries_only(),
            categories: None,
            store: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_accepts(mut self, accepts: AcceptMap) -> Self {
        self.accepts = accepts;
        self
    }

    #[must_use]
    pub fn with_categories(mut self, categories: Categories) -> Self {
        self.categories = Some(categories);
        self
    }

    /// Number of stored entries.
    pub fn len(&self) -> AdapterResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> AdapterResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> AdapterResult<RwLockReadGuard<'_, Vec<StoredEntry>>> {
        self.store
            .read()
            .map_err(|_| AdapterError::Storage("entry store lock poisoned".to_string()))
    }

    fn write(&self) -> AdapterResult<RwLockWriteGuard<'_, Vec<StoredEntry>>> {
        self.store
            .write()
            .map_err(|_| AdapterError::Storage("entry store lock poisoned".to_string()))
    }

    /// Stamp server-controlled fields onto a new entry and store it.
    fn insert(
        &self,
        ctx: &AdapterContext<'_>,
        mut entry: Entry,
        media: Option<MediaPart>,
    ) -> AdapterResult<Entry> {
        let mut store = self.write()?;
        let hint = ctx
            .slug
            .map(str::to_string)
            .or_else(|| entry.title())
            .unwrap_or_default();
        let name = unique_name(&store, &hint);

        let edit = ctx
            .entry_url(&name)
            .ok_or_else(|| AdapterError::Storage("no entry route registered".to_string()))?;

        let now = Utc::now();
        entry.set_id(urn_uuid());
        if entry.title().is_none() {
            entry.set_title(name.clone());
        }
        if entry.authors().is_empty() {
            entry.add_author(&Person::new(&self.author));
        }
        entry.set_updated(&now);
        entry.set_published(&now);
        entry.set_edited(&now);
        entry.set_link(&Link::new(edit).with_rel("edit"));

        if let Some(media) = &media {
            let src = ctx
                .media_url(&name)
                .ok_or_else(|| AdapterError::Storage("no media route registered".to_string()))?;
            entry.set_content(&Content::out_of_line(src.clone(), media.content_type.clone()));
            entry.set_link(&Link::new(src).with_rel("edit-media").with_type(media.content_type.clone()));
            if entry.summary().is_none() {
                entry.set_summary("");
            }
        }

        tracing::debug!(collection = ctx.collection, entry = %name, media = media.is_some(), "Stored entry");
        store.push(StoredEntry {
            name,
            entry: entry.clone(),
            media,
        });
        Ok(entry)
    }
}

impl CollectionAdapter for InMemoryAdapter {
    fn title(&self) -> &str {
        &self.title
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn accepts(&self) -> &AcceptMap {
        &self.accepts
    }

    fn categories(&self) -> Option<Categories> {
        self.categories.clone()
    }

    fn feed(&self, ctx: &AdapterContext<'_>) -> AdapterResult<Feed> {
        let store = self.read()?;
        let mut feed = Feed::new();
        feed.set_id(self.feed_id.clone());
        feed.set_title(self.title.clone());
        feed.add_author(&Person::new(&self.author));
        if let Some(href) = ctx.collection_url() {
            feed.set_link(&Link::new(href).with_rel("self"));
        }

        let mut updated = None;
        for stored in store.iter() {
            let entry_updated = stored.entry.updated()?;
            updated = updated.max(entry_updated);
        }
        feed.set_updated(&updated.unwrap_or_else(Utc::now));

        // Newest first.
        for stored in store.iter().rev() {
            feed.add_entry(stored.entry.clone());
        }
        Ok(feed)
    }

    fn entry(&self, _ctx: &AdapterContext<'_>, id: &str) -> AdapterResult<Option<Entry>> {
        Ok(self
            .read()?
            .iter()
            .find(|stored| stored.name == id)
            .map(|stored| stored.entry.clone()))
    }

    fn create_entry(&self, ctx: &AdapterContext<'_>, entry: Entry) -> AdapterResult<Entry> {
        self.insert(ctx, entry, None)
    }

    fn create_media(&self, ctx: &AdapterContext<'_>, media: MediaPart) -> AdapterResult<Entry> {
        self.insert(ctx, Entry::new(), Some(media))
    }

    fn create_media_entry(&self, ctx: &AdapterContext<'_>, entry: Entry, media: MediaPart) -> AdapterResult<Entry> {
        self.insert(ctx, entry, Some(media))
    }

    fn update_entry(&self, ctx: &AdapterContext<'_>, id: &str, mut entry: Entry) -> AdapterResult<Option<Entry>> {
        let mut store = self.write()?;
        let Some(stored) = store.iter_mut().find(|stored| stored.name == id) else {
            return Ok(None);
        };

        // Identity, creation time and server links are not client editable.
        if let Some(existing_id) = stored.entry.id() {
            entry.set_id(existing_id);
        }
        if let Some(published) = stored.entry.published()? {
            entry.set_published(&published);
        }
        for link in stored.entry.links() {
            if matches!(link.rel(), "edit" | "edit-media") {
                entry.set_link(&link);
            }
        }
        if stored.media.is_some() {
            if let Some(content) = stored.entry.content() {
                entry.set_content(&content);
            }
        }

        let now = Utc::now();
        entry.set_updated(&now);
        entry.set_edited(&now);
        stored.entry = entry.clone();

        tracing::debug!(collection = ctx.collection, entry = id, "Updated entry");
        Ok(Some(entry))
    }

    fn delete_entry(&self, ctx: &AdapterContext<'_>, id: &str) -> AdapterResult<bool> {
        let mut store = self.write()?;
        let before = store.len();
        store.retain(|stored| stored.name != id);
        let deleted = store.len() != before;
        tracing::debug!(collection = ctx.collection, entry = id, deleted, "Delete entry");
        Ok(deleted)
    }

    fn media(&self, _ctx: &AdapterContext<'_>, id: &str) -> AdapterResult<Option<MediaPart>> {
        Ok(self
            .read()?
            .iter()
            .find(|stored| stored.name == id)
            .and_then(|stored| stored.media.clone()))
    }
}

fn urn_uuid() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

/// Lowercase alphanumerics joined by single dashes.
fn sanitize(hint: &str) -> String {
    let mut name = String::new();
    for c in hint.chars() {
        if c.is_alphanumeric() {
            name.extend(c.to_lowercase());
        } else if !name.is_empty() && !name.ends_with('-') {
            name.push('-');
        }
    }
    name.trim_end_matches('-').to_string()
}

fn unique_name(store: &[StoredEntry], hint: &str) -> String {
    let base = sanitize(hint);
    let base = if base.is_empty() {
        Uuid::new_v4().simple().to_string()
    } else {
        base
    };

    let taken = |name: &str| store.iter().any(|stored| stored.name == name);
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
