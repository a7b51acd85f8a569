//! Collection adapters: the application side of a collection.
//!
//! The request processor owns protocol handling (routing, negotiation,
//! status codes); an adapter only stores and retrieves entries and media.

use abdera_model::app::{self, Categories};
use abdera_model::atom::{Entry, Feed, ENTRY_MEDIA_TYPE};

use crate::error::{AdapterError, AdapterResult};
use crate::mime::MediaType;
use crate::route::{names, RouteManager};

/// Alternate marker for media types accepted only inside multipart/related.
pub const MULTIPART_RELATED: &str = "multipart-related";

/// One `media-range -> alternate` entry of an [`AcceptMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptEntry {
    pub media_range: MediaType,
    pub alternate: String,
}

impl AcceptEntry {
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.alternate == MULTIPART_RELATED
    }
}

/// Ordered media ranges a collection accepts, each with an alternate
/// marker: `""` for plain posts, `"multipart-related"` for media that may
/// only arrive inside a multipart/related post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptMap {
    entries: Vec<AcceptEntry>,
}

impl AcceptMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atom entries only.
    #[must_use]
    pub fn entries_only() -> Self {
        Self::new().accept(ENTRY_MEDIA_TYPE, "")
    }

    /// Add a media range. Unparseable ranges are skipped with a warning.
    #[must_use]
    pub fn accept(mut self, media_range: &str, alternate: &str) -> Self {
        match MediaType::parse(media_range) {
            Some(media_range) => self.entries.push(AcceptEntry {
                media_range,
                alternate: alternate.to_string(),
            }),
            None => tracing::warn!(media_range, "Ignoring invalid media range"),
        }
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[AcceptEntry] {
        &self.entries
    }

    /// At least one entry carries the multipart marker.
    #[must_use]
    pub fn accepts_multipart(&self) -> bool {
        self.entries.iter().any(AcceptEntry::is_multipart)
    }

    /// At least one entry names something other than Atom.
    #[must_use]
    pub fn accepts_media(&self) -> bool {
        self.entries.iter().any(|entry| !entry.media_range.is_atom())
    }

    /// `media_type` matches a plain entry.
    #[must_use]
    pub fn matches_plain(&self, media_type: &MediaType) -> bool {
        self.entries
            .iter()
            .any(|entry| !entry.is_multipart() && media_type.matches(&entry.media_range))
    }

    /// `media_type` matches a multipart entry.
    #[must_use]
    pub fn matches_multipart(&self, media_type: &MediaType) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.is_multipart() && media_type.matches(&entry.media_range))
    }

    /// Add the entries to a service document collection.
    #[must_use]
    pub fn describe(&self, mut collection: app::Collection) -> app::Collection {
        for entry in &self.entries {
            let alternate = (!entry.alternate.is_empty()).then_some(entry.alternate.as_str());
            collection = collection.accept(entry.media_range.to_string(), alternate);
        }
        collection
    }
}

/// A media resource: its bytes and content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPart {
    pub content_type: String,
    pub content_id: Option<String>,
    pub data: Vec<u8>,
}

impl MediaPart {
    #[must_use]
    pub fn new(content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            content_id: None,
            data: data.into(),
        }
    }
}

/// Per-request information handed to adapter operations.
#[derive(Debug, Clone, Copy)]
pub struct AdapterContext<'a> {
    /// Name of the collection as it appears in paths.
    pub collection: &'a str,
    /// `Slug` header, the client's name hint for new resources.
    pub slug: Option<&'a str>,
    pub routes: &'a RouteManager,
}

impl AdapterContext<'_> {
    #[must_use]
    pub fn collection_url(&self) -> Option<String> {
        self.routes
            .url_for(names::COLLECTION, &[("collection", self.collection)])
    }

    #[must_use]
    pub fn entry_url(&self, entry: &str) -> Option<String> {
        self.routes
            .url_for(names::ENTRY, &[("collection", self.collection), ("entry", entry)])
    }

    #[must_use]
    pub fn media_url(&self, entry: &str) -> Option<String> {
        self.routes
            .url_for(names::MEDIA, &[("collection", self.collection), ("entry", entry)])
    }
}

fn not_supported<T>(operation: &str) -> AdapterResult<T> {
    Err(AdapterError::NotSupported(operation.to_string()))
}

/// Storage behind one collection.
///
/// Lookups return `Ok(None)` for unknown entries. Created entries must
/// carry an `edit` link, which becomes the response Location.
pub trait CollectionAdapter: Send + Sync {
    fn title(&self) -> &str;

    fn author(&self) -> &str;

    fn accepts(&self) -> &AcceptMap;

    fn categories(&self) -> Option<Categories> {
        None
    }

    fn feed(&self, ctx: &AdapterContext<'_>) -> AdapterResult<Feed>;

    fn entry(&self, ctx: &AdapterContext<'_>, id: &str) -> AdapterResult<Option<Entry>>;

    fn create_entry(&self, ctx: &AdapterContext<'_>, entry: Entry) -> AdapterResult<Entry>;

    /// Store a media resource and return its media link entry.
    fn create_media(&self, _ctx: &AdapterContext<'_>, _media: MediaPart) -> AdapterResult<Entry> {
        not_supported("create_media")
    }

    /// Store a media resource described by a client-supplied entry.
    fn create_media_entry(
        &self,
        _ctx: &AdapterContext<'_>,
        _entry: Entry,
        _media: MediaPart,
    ) -> AdapterResult<Entry> {
        not_supported("create_media_entry")
    }

    fn update_entry(&self, ctx: &AdapterContext<'_>, id: &str, entry: Entry) -> AdapterResult<Option<Entry>>;

    /// Remove an entry. Returns `false` when it did not exist.
    fn delete_entry(&self, ctx: &AdapterContext<'_>, id: &str) -> AdapterResult<bool>;

    fn media(&self, _ctx: &AdapterContext<'_>, _id: &str) -> AdapterResult<Option<MediaPart>> {
        not_supported("media")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mt(value: &str) -> MediaType {
        MediaType::parse(value).unwrap()
    }

    #[test]
    fn test_entries_only() {
        let accepts = AcceptMap::entries_only();
        assert!(!accepts.accepts_media());
        assert!(!accepts.accepts_multipart());
        assert!(accepts.matches_plain(&mt("application/atom+xml;type=entry")));
    }

    #[test]
    fn test_mixed_accept_map() {
        let accepts = AcceptMap::entries_only()
            .accept("image/*", MULTIPART_RELATED)
            .accept("text/plain", "");

        assert!(accepts.accepts_media());
        assert!(accepts.accepts_multipart());
        assert!(accepts.matches_multipart(&mt("image/png")));
        assert!(!accepts.matches_plain(&mt("image/png")));
        assert!(accepts.matches_plain(&mt("text/plain; charset=utf-8")));
        assert!(!accepts.matches_multipart(&mt("text/plain")));
    }

    #[test]
    fn test_describe() {
        let collection = AcceptMap::entries_only()
            .accept("image/*", MULTIPART_RELATED)
            .describe(app::Collection::new("/photos", "Photos"));
        assert_eq!(collection.accepts.len(), 2);
        assert_eq!(collection.accepts[0].media_range, "application/atom+xml;type=entry");
        assert_eq!(collection.accepts[1].alternate.as_deref(), Some(MULTIPART_RELATED));
    }

    #[test]
    fn test_context_urls() {
        let routes = RouteManager::standard("/").unwrap();
        let ctx = AdapterContext {
            collection: "photos",
            slug: None,
            routes: &routes,
        };
        assert_eq!(ctx.collection_url().as_deref(), Some("/photos"));
        assert_eq!(ctx.entry_url("beach").as_deref(), Some("/photos/beach"));
        assert_eq!(ctx.media_url("beach").as_deref(), Some("/photos/beach;media"));
    }
}
