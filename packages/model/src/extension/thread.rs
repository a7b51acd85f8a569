//! Atom Threading Extensions (RFC 4685).

use std::any::Any;
use std::sync::Arc;

use super::factory::{ElementWrapper, SimpleExtensionFactory};
use crate::element::Element;
use crate::error::WrapperError;
use crate::qname::{ns, QName};

/// `thr:in-reply-to`
pub fn in_reply_to() -> QName {
    QName::prefixed(ns::THREAD, "in-reply-to", "thr")
}

/// `thr:total`
pub fn total() -> QName {
    QName::prefixed(ns::THREAD, "total", "thr")
}

/// Reference from a response entry to the resource it replies to.
#[derive(Debug)]
pub struct InReplyTo {
    element: Arc<Element>,
}

impl InReplyTo {
    /// Wrap a `thr:in-reply-to` element; `ref` is mandatory.
    pub fn new(element: Arc<Element>) -> Result<Self, WrapperError> {
        if element.attr("ref").is_none() {
            return Err(WrapperError::new(element.name(), "missing ref attribute"));
        }
        Ok(Self { element })
    }

    /// Build a new `thr:in-reply-to` element.
    #[must_use]
    pub fn element_for(reference: &str, href: Option<&str>) -> Element {
        let mut element = Element::new(in_reply_to()).with_attribute(QName::local("ref"), reference);
        if let Some(href) = href {
            element.set_attribute(QName::local("href"), href);
        }
        element
    }

    /// Identifier of the resource being replied to.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.element.attr("ref").unwrap_or_default()
    }

    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.element.attr("href")
    }

    #[must_use]
    pub fn media_type(&self) -> Option<&str> {
        self.element.attr("type")
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.element.attr("source")
    }
}

impl ElementWrapper for InReplyTo {
    fn element(&self) -> &Arc<Element> {
        &self.element
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Total number of responses to an entry.
#[derive(Debug)]
pub struct Total {
    element: Arc<Element>,
    value: u64,
}

impl Total {
    pub fn new(element: Arc<Element>) -> Result<Self, WrapperError> {
        let value = element
            .text()
            .and_then(|text| text.trim().parse().ok())
            .ok_or_else(|| WrapperError::new(element.name(), "total is not a non-negative integer"))?;
        Ok(Self { element, value })
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl ElementWrapper for Total {
    fn element(&self) -> &Arc<Element> {
        &self.element
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory for the threading vocabulary.
#[must_use]
pub fn thread_factory() -> SimpleExtensionFactory {
    SimpleExtensionFactory::new([ns::THREAD])
        .add_impl(in_reply_to(), InReplyTo::new)
        .add_impl(total(), Total::new)
}
