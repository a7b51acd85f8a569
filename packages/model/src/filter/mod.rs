//! Parse filters deciding which elements and attributes survive parsing.
//!
//! A filter is built once through a builder, then shared read-only across
//! concurrent parses. Builders are consumed by `build()` and cannot be
//! reused.
//!
//! ```
//! use abdera_model::filter::{ParseFilter, SetParseFilter};
//! use abdera_model::QName;
//!
//! let filter = SetParseFilter::whitelist()
//!     .add(QName::atom("entry"))
//!     .add(QName::atom("title"))
//!     .build();
//!
//! assert!(filter.acceptable(&QName::atom("title")));
//! assert!(!filter.acceptable(&QName::atom("content")));
//! ```

mod compound;
mod set;

use std::fmt;

use thiserror::Error;

use crate::qname::QName;

pub use compound::{CompoundFilterBuilder, CompoundParseFilter, CompoundPolicy};
pub use set::{ListKind, SetFilterBuilder, SetParseFilter};

/// Options shared by every filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    pub ignore_comments: bool,
    pub ignore_whitespace: bool,
    pub ignore_processing_instructions: bool,
    /// Report rejections as [`Unacceptable`] errors instead of `false`.
    pub throw_on_unacceptable: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            ignore_comments: true,
            ignore_whitespace: true,
            ignore_processing_instructions: true,
            throw_on_unacceptable: false,
        }
    }
}

/// Rejection raised by a filter configured to throw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct Unacceptable {
    element: QName,
    attribute: Option<QName>,
}

impl Unacceptable {
    #[must_use]
    pub fn element(element: QName) -> Self {
        Self {
            element,
            attribute: None,
        }
    }

    #[must_use]
    pub fn attribute(element: QName, attribute: QName) -> Self {
        Self {
            element,
            attribute: Some(attribute),
        }
    }

    /// The rejected element, or the parent of the rejected attribute.
    #[must_use]
    pub fn qname(&self) -> &QName {
        &self.element
    }

    #[must_use]
    pub fn attribute_qname(&self) -> Option<&QName> {
        self.attribute.as_ref()
    }
}

impl fmt::Display for Unacceptable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attribute) => write!(f, "Unacceptable element [{},{attribute}]", self.element),
            None => write!(f, "Unacceptable element [{}]", self.element),
        }
    }
}

/// Predicate over element names and (element, attribute) name pairs.
///
/// Decisions must be pure functions of their arguments.
pub trait ParseFilter: Send + Sync + fmt::Debug {
    /// Check whether an element may enter the model.
    fn acceptable(&self, element: &QName) -> bool;

    /// Check whether an attribute of the given element may enter the model.
    fn acceptable_attribute(&self, element: &QName, attribute: &QName) -> bool;

    /// Options of this filter.
    fn options(&self) -> &FilterOptions;

    /// Like [`ParseFilter::acceptable`], but raises [`Unacceptable`] on
    /// rejection when the filter is configured to throw.
    fn check(&self, element: &QName) -> Result<bool, Unacceptable> {
        if self.acceptable(element) {
            Ok(true)
        } else if self.options().throw_on_unacceptable {
            Err(Unacceptable::element(element.clone()))
        } else {
            Ok(false)
        }
    }

    /// Attribute form of [`ParseFilter::check`].
    fn check_attribute(&self, element: &QName, attribute: &QName) -> Result<bool, Unacceptable> {
        if self.acceptable_attribute(element, attribute) {
            Ok(true)
        } else if self.options().throw_on_unacceptable {
            Err(Unacceptable::attribute(element.clone(), attribute.clone()))
        } else {
            Ok(false)
        }
    }
}
