//! Error types for the object model.
//!
//! `ModelError` covers parsing and model access; `FilterError` is raised when
//! a parse filter is built from an invalid configuration.

use thiserror::Error;

use crate::filter::Unacceptable;
use crate::qname::QName;

/// Main error type for the model library.
#[derive(Debug, Error)]
pub enum ModelError {
    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Input was not valid UTF-8.
    #[error("Document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A parse filter configured to throw rejected an element or attribute.
    #[error(transparent)]
    Unacceptable(#[from] Unacceptable),

    /// The filter rejected the root element, leaving nothing to parse.
    #[error("Document has no acceptable root element")]
    EmptyDocument,

    /// The document root is not the element the caller asked for.
    #[error("Unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot { expected: QName, found: QName },

    /// A date construct could not be parsed.
    #[error("Invalid date '{value}': {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Errors raised while building a parse filter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// A compound filter needs at least one child filter.
    #[error("Compound parse filter requires at least one child filter")]
    EmptyCompound,
}

/// Raised by an extension constructor that cannot wrap an element.
///
/// Never escapes a factory: the factory falls back to the unwrapped element.
#[derive(Debug, Error)]
#[error("Cannot wrap <{element}>: {message}")]
pub struct WrapperError {
    pub element: QName,
    pub message: String,
}

impl WrapperError {
    #[must_use]
    pub fn new(element: &QName, message: impl Into<String>) -> Self {
        Self {
            element: element.clone(),
            message: message.into(),
        }
    }
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
