//! Whitelist and blacklist filters backed by qualified-name sets.

use std::collections::{HashMap, HashSet};

use super::{FilterOptions, ParseFilter};
use crate::qname::QName;

/// Whether set membership means acceptance or rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Whitelist,
    Blacklist,
}

/// A filter accepting (whitelist) or rejecting (blacklist) listed names.
///
/// Attribute rules are registered per parent element. A parent without any
/// registered attribute accepts all of its attributes. For a whitelist, a
/// parent with registered attributes accepts only those; for a blacklist, it
/// rejects only those.
#[derive(Debug, Clone)]
pub struct SetParseFilter {
    kind: ListKind,
    elements: HashSet<QName>,
    attributes: HashMap<QName, HashSet<QName>>,
    options: FilterOptions,
}

impl SetParseFilter {
    /// Start building a whitelist filter.
    #[must_use]
    pub fn whitelist() -> SetFilterBuilder {
        SetFilterBuilder::new(ListKind::Whitelist)
    }

    /// Start building a blacklist filter.
    #[must_use]
    pub fn blacklist() -> SetFilterBuilder {
        SetFilterBuilder::new(ListKind::Blacklist)
    }

    #[must_use]
    pub fn kind(&self) -> ListKind {
        self.kind
    }

    /// Check whether a name is in the element set.
    #[must_use]
    pub fn contains(&self, element: &QName) -> bool {
        self.elements.contains(element)
    }
}

impl ParseFilter for SetParseFilter {
    fn acceptable(&self, element: &QName) -> bool {
        match self.kind {
            ListKind::Whitelist => self.elements.contains(element),
            ListKind::Blacklist => !self.elements.contains(element),
        }
    }

    fn acceptable_attribute(&self, element: &QName, attribute: &QName) -> bool {
        if !self.acceptable(element) {
            return false;
        }
        let Some(registered) = self.attributes.get(element) else {
            return true;
        };
        match self.kind {
            ListKind::Whitelist => registered.contains(attribute),
            ListKind::Blacklist => !registered.contains(attribute),
        }
    }

    fn options(&self) -> &FilterOptions {
        &self.options
    }
}

/// Builder for [`SetParseFilter`].
#[derive(Debug)]
pub struct SetFilterBuilder {
    kind: ListKind,
    elements: HashSet<QName>,
    attributes: HashMap<QName, HashSet<QName>>,
    options: FilterOptions,
}

impl SetFilterBuilder {
    fn new(kind: ListKind) -> Self {
        Self {
            kind,
            elements: HashSet::new(),
            attributes: HashMap::new(),
            options: FilterOptions::default(),
        }
    }

    /// Add an element name to the set.
    #[must_use]
    pub fn add(mut self, element: QName) -> Self {
        self.elements.insert(element);
        self
    }

    /// Add several element names to the set.
    #[must_use]
    pub fn add_all(mut self, elements: impl IntoIterator<Item = QName>) -> Self {
        self.elements.extend(elements);
        self
    }

    /// Register an attribute rule for a parent element.
    #[must_use]
    pub fn add_attribute(mut self, element: QName, attribute: QName) -> Self {
        self.attributes.entry(element).or_default().insert(attribute);
        self
    }

    /// Raise [`super::Unacceptable`] instead of returning `false`.
    #[must_use]
    pub fn throw_on_unacceptable(mut self) -> Self {
        self.options.throw_on_unacceptable = true;
        self
    }

    #[must_use]
    pub fn ignore_comments(mut self, ignore: bool) -> Self {
        self.options.ignore_comments = ignore;
        self
    }

    #[must_use]
    pub fn ignore_whitespace(mut self, ignore: bool) -> Self {
        self.options.ignore_whitespace = ignore;
        self
    }

    #[must_use]
    pub fn ignore_processing_instructions(mut self, ignore: bool) -> Self {
        self.options.ignore_processing_instructions = ignore;
        self
    }

    #[must_use]
    pub fn build(self) -> SetParseFilter {
        SetParseFilter {
            kind: self.kind,
            elements: self.elements,
            attributes: self.attributes,
            options: self.options,
        }
    }
}
