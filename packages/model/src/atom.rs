//! Typed views over Atom entries and feeds (RFC 4287).
//!
//! `Entry` and `Feed` own their element and read or write the standard
//! children in place; anything they do not model stays in the element and is
//! written back untouched.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::document::Document;
use crate::element::Element;
use crate::error::{ModelError, Result};
use crate::extension::{Extension, ExtensionFactory};
use crate::qname::{ns, QName};

/// Media type of Atom documents.
pub const ATOM_MEDIA_TYPE: &str = "application/atom+xml";
/// Media type of Atom entry documents.
pub const ENTRY_MEDIA_TYPE: &str = "application/atom+xml;type=entry";
/// Media type of Atom feed documents.
pub const FEED_MEDIA_TYPE: &str = "application/atom+xml;type=feed";

/// An `atom:link`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
    pub title: Option<String>,
}

impl Link {
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: None,
            media_type: None,
            title: None,
        }
    }

    #[must_use]
    pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = Some(rel.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Relation, with the RFC 4287 default of `alternate`.
    #[must_use]
    pub fn rel(&self) -> &str {
        self.rel.as_deref().unwrap_or("alternate")
    }

    fn from_element(element: &Element) -> Option<Self> {
        Some(Self {
            href: element.attr("href")?.to_string(),
            rel: element.attr("rel").map(str::to_string),
            media_type: element.attr("type").map(str::to_string),
            title: element.attr("title").map(str::to_string),
        })
    }

    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(QName::atom("link")).with_attribute(QName::local("href"), &self.href);
        if let Some(rel) = &self.rel {
            element.set_attribute(QName::local("rel"), rel);
        }
        if let Some(media_type) = &self.media_type {
            element.set_attribute(QName::local("type"), media_type);
        }
        if let Some(title) = &self.title {
            element.set_attribute(QName::local("title"), title);
        }
        element
    }
}

/// An `atom:author` or `atom:contributor`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    pub email: Option<String>,
    pub uri: Option<String>,
}

impl Person {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn from_element(element: &Element) -> Self {
        Self {
            name: element.child_text(&QName::atom("name")).unwrap_or_default(),
            email: element.child_text(&QName::atom("email")),
            uri: element.child_text(&QName::atom("uri")),
        }
    }

    fn to_element(&self, local: &str) -> Element {
        let mut element =
            Element::new(QName::atom(local)).with_child(Element::new(QName::atom("name")).with_text(&self.name));
        if let Some(email) = &self.email {
            element.push_element(Element::new(QName::atom("email")).with_text(email));
        }
        if let Some(uri) = &self.uri {
            element.push_element(Element::new(QName::atom("uri")).with_text(uri));
        }
        element
    }
}

/// An `atom:content` construct.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Inline content. `kind` is `text`, `html`, `xhtml` or a media type.
    Inline { kind: String, value: String },
    /// Out-of-line content referenced by `src`.
    OutOfLine { src: String, media_type: Option<String> },
}

impl Content {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Inline {
            kind: "text".to_string(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn out_of_line(src: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self::OutOfLine {
            src: src.into(),
            media_type: Some(media_type.into()),
        }
    }

    fn from_element(element: &Element) -> Self {
        match element.attr("src") {
            Some(src) => Self::OutOfLine {
                src: src.to_string(),
                media_type: element.attr("type").map(str::to_string),
            },
            None => Self::Inline {
                kind: element.attr("type").unwrap_or("text").to_string(),
                value: element.text_content(),
            },
        }
    }

    fn to_element(&self) -> Element {
        let content = Element::new(QName::atom("content"));
        match self {
            Self::Inline { kind, value } => content
                .with_attribute(QName::local("type"), kind)
                .with_text(value),
            Self::OutOfLine { src, media_type } => {
                let mut content = content.with_attribute(QName::local("src"), src);
                if let Some(media_type) = media_type {
                    content.set_attribute(QName::local("type"), media_type);
                }
                content
            }
        }
    }
}

/// Format a timestamp the way Atom date constructs are written.
#[must_use]
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC 3339 date construct.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|date| date.with_timezone(&Utc))
        .map_err(|source| ModelError::InvalidDate {
            value: value.to_string(),
            source,
        })
}

fn date_child(element: &Element, name: &QName) -> Result<Option<DateTime<Utc>>> {
    element.child_text(name).map(|text| parse_date(&text)).transpose()
}

fn links_of(element: &Element) -> Vec<Link> {
    element
        .find_children(&QName::atom("link"))
        .filter_map(|link| Link::from_element(link))
        .collect()
}

fn link_href(element: &Element, rel: &str) -> Option<String> {
    links_of(element)
        .into_iter()
        .find(|link| link.rel() == rel)
        .map(|link| link.href)
}

/// Replace every link with `link.rel` by `link`.
fn replace_link(element: &mut Element, link: &Link) {
    let rel = link.rel();
    element.retain_elements(|child| {
        child.name() != &QName::atom("link") || child.attr("rel").unwrap_or("alternate") != rel
    });
    element.push_element(link.to_element());
}

fn check_root(element: &Element, expected: &str) -> Result<()> {
    if element.name().is(ns::ATOM, expected) {
        Ok(())
    } else {
        Err(ModelError::UnexpectedRoot {
            expected: QName::atom(expected),
            found: element.name().clone(),
        })
    }
}

/// An Atom entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    element: Element,
}

impl Default for Entry {
    fn default() -> Self {
        Self::new()
    }
}

impl Entry {
    /// Create an empty `atom:entry`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            element: Element::new(QName::atom("entry")),
        }
    }

    /// Wrap an element, which must be an `atom:entry`.
    pub fn from_element(element: Element) -> Result<Self> {
        check_root(&element, "entry")?;
        Ok(Self { element })
    }

    /// Take the root of a parsed document as an entry.
    pub fn from_document(document: Document) -> Result<Self> {
        Self::from_element(document.into_root())
    }

    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    #[must_use]
    pub fn into_element(self) -> Element {
        self.element
    }

    #[must_use]
    pub fn into_document(self) -> Document {
        Document::new(self.element)
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.element.child_text(&QName::atom("id"))
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.element.set_child_text(&QName::atom("id"), id);
    }

    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.element.child_text(&QName::atom("title"))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.element.set_child_text(&QName::atom("title"), title);
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.set_title(title);
        self
    }

    #[must_use]
    pub fn summary(&self) -> Option<String> {
        self.element.child_text(&QName::atom("summary"))
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.element.set_child_text(&QName::atom("summary"), summary);
    }

    /// `atom:updated`, if present.
    ///
    /// # Errors
    /// Returns `InvalidDate` when the value is not RFC 3339.
    pub fn updated(&self) -> Result<Option<DateTime<Utc>>> {
        date_child(&self.element, &QName::atom("updated"))
    }

    pub fn set_updated(&mut self, updated: &DateTime<Utc>) {
        self.element.set_child_text(&QName::atom("updated"), format_date(updated));
    }

    pub fn published(&self) -> Result<Option<DateTime<Utc>>> {
        date_child(&self.element, &QName::atom("published"))
    }

    pub fn set_published(&mut self, published: &DateTime<Utc>) {
        self.element.set_child_text(&QName::atom("published"), format_date(published));
    }

    /// `app:edited`, if present.
    pub fn edited(&self) -> Result<Option<DateTime<Utc>>> {
        date_child(&self.element, &QName::app("edited"))
    }

    pub fn set_edited(&mut self, edited: &DateTime<Utc>) {
        self.element.set_child_text(&QName::app("edited"), format_date(edited));
    }

    #[must_use]
    pub fn authors(&self) -> Vec<Person> {
        self.element
            .find_children(&QName::atom("author"))
            .map(|author| Person::from_element(author))
            .collect()
    }

    pub fn add_author(&mut self, author: &Person) {
        self.element.push_element(author.to_element("author"));
    }

    #[must_use]
    pub fn content(&self) -> Option<Content> {
        self.element
            .find_child(&QName::atom("content"))
            .map(|content| Content::from_element(content))
    }

    pub fn set_content(&mut self, content: &Content) {
        self.element.remove_children(&QName::atom("content"));
        self.element.push_element(content.to_element());
    }

    #[must_use]
    pub fn links(&self) -> Vec<Link> {
        links_of(&self.element)
    }

    pub fn add_link(&mut self, link: &Link) {
        self.element.push_element(link.to_element());
    }

    /// Replace the links sharing `link`'s relation.
    pub fn set_link(&mut self, link: &Link) {
        replace_link(&mut self.element, link);
    }

    /// Target of the first link with the given relation.
    #[must_use]
    pub fn link(&self, rel: &str) -> Option<String> {
        link_href(&self.element, rel)
    }

    #[must_use]
    pub fn edit_link(&self) -> Option<String> {
        self.link("edit")
    }

    #[must_use]
    pub fn edit_media_link(&self) -> Option<String> {
        self.link("edit-media")
    }

    /// Child elements outside the Atom namespace.
    pub fn extension_elements(&self) -> impl Iterator<Item = &Arc<Element>> {
        self.element
            .elements()
            .filter(|child| child.namespace() != Some(ns::ATOM))
    }

    /// Resolve the first child with the given name through a registry.
    #[must_use]
    pub fn extension(&self, registry: &dyn ExtensionFactory, name: &QName) -> Option<Extension> {
        self.element
            .find_child(name)
            .map(|child| registry.element_wrapper(Arc::clone(child)))
    }

    /// Add a foreign element.
    pub fn add_extension(&mut self, element: Element) {
        self.element.push_element(element);
    }
}

/// An Atom feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    element: Element,
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed {
    #[must_use]
    pub fn new() -> Self {
        Self {
            element: Element::new(QName::atom("feed")),
        }
    }

    pub fn from_element(element: Element) -> Result<Self> {
        check_root(&element, "feed")?;
        Ok(Self { element })
    }

    pub fn from_document(document: Document) -> Result<Self> {
        Self::from_element(document.into_root())
    }

    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    #[must_use]
    pub fn into_element(self) -> Element {
        self.element
    }

    #[must_use]
    pub fn into_document(self) -> Document {
        Document::new(self.element)
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.element.child_text(&QName::atom("id"))
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.element.set_child_text(&QName::atom("id"), id);
    }

    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.element.child_text(&QName::atom("title"))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.element.set_child_text(&QName::atom("title"), title);
    }

    pub fn updated(&self) -> Result<Option<DateTime<Utc>>> {
        date_child(&self.element, &QName::atom("updated"))
    }

    pub fn set_updated(&mut self, updated: &DateTime<Utc>) {
        self.element.set_child_text(&QName::atom("updated"), format_date(updated));
    }

    #[must_use]
    pub fn authors(&self) -> Vec<Person> {
        self.element
            .find_children(&QName::atom("author"))
            .map(|author| Person::from_element(author))
            .collect()
    }

    pub fn add_author(&mut self, author: &Person) {
        self.element.push_element(author.to_element("author"));
    }

    #[must_use]
    pub fn links(&self) -> Vec<Link> {
        links_of(&self.element)
    }

    pub fn set_link(&mut self, link: &Link) {
        replace_link(&mut self.element, link);
    }

    #[must_use]
    pub fn link(&self, rel: &str) -> Option<String> {
        link_href(&self.element, rel)
    }

    /// Entries in document order.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        self.element
            .find_children(&QName::atom("entry"))
            .map(|entry| Entry {
                element: Element::clone(entry),
            })
            .collect()
    }

    pub fn add_entry(&mut self, entry: Entry) {
        self.element.push_element(entry.element);
    }
}
