//! Atompub publishing control and document MIME types.

use std::any::Any;
use std::sync::Arc;

use super::factory::{ElementWrapper, SimpleExtensionFactory};
use crate::element::Element;
use crate::error::WrapperError;
use crate::qname::{ns, QName};

/// Media type of Atompub service documents.
pub const SERVICE_MEDIA_TYPE: &str = "application/atomsvc+xml";
/// Media type of Atompub category documents.
pub const CATEGORIES_MEDIA_TYPE: &str = "application/atomcat+xml";

/// `app:control` holding publishing controls such as `app:draft`.
#[derive(Debug)]
pub struct Control {
    element: Arc<Element>,
}

impl Control {
    pub fn new(element: Arc<Element>) -> Result<Self, WrapperError> {
        if let Some(draft) = element.child_text(&QName::app("draft")) {
            if draft != "yes" && draft != "no" {
                return Err(WrapperError::new(
                    element.name(),
                    format!("app:draft must be yes or no, got '{draft}'"),
                ));
            }
        }
        Ok(Self { element })
    }

    /// Build a new `app:control` element.
    #[must_use]
    pub fn element_for(draft: bool) -> Element {
        Element::new(QName::app("control"))
            .with_child(Element::new(QName::app("draft")).with_text(if draft { "yes" } else { "no" }))
    }

    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.element.child_text(&QName::app("draft")).as_deref() == Some("yes")
    }
}

impl ElementWrapper for Control {
    fn element(&self) -> &Arc<Element> {
        &self.element
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory for the Atompub namespace.
#[must_use]
pub fn control_factory() -> SimpleExtensionFactory {
    SimpleExtensionFactory::new([ns::APP])
        .add_impl(QName::app("control"), Control::new)
        .add_mime_type(QName::app("service"), SERVICE_MEDIA_TYPE)
        .add_mime_type(QName::app("categories"), CATEGORIES_MEDIA_TYPE)
}
