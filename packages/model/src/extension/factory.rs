//! Extension factory trait and the closure-based factory implementation.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::document::Document;
use crate::element::Element;
use crate::error::WrapperError;
use crate::qname::QName;

/// A typed view over an element of an extension vocabulary.
pub trait ElementWrapper: Any + Send + Sync + fmt::Debug {
    /// The wrapped element.
    fn element(&self) -> &Arc<Element>;

    /// Upcast used for downcasting to the concrete wrapper.
    fn as_any(&self) -> &dyn Any;
}

/// Result of wrapper resolution: a typed wrapper, or the element unchanged.
#[derive(Debug)]
pub enum Extension {
    Element(Arc<Element>),
    Wrapped(Box<dyn ElementWrapper>),
}

impl Extension {
    /// The underlying element, wrapped or not.
    #[must_use]
    pub fn element(&self) -> &Arc<Element> {
        match self {
            Self::Element(element) => element,
            Self::Wrapped(wrapper) => wrapper.element(),
        }
    }

    #[must_use]
    pub fn is_wrapped(&self) -> bool {
        matches!(self, Self::Wrapped(_))
    }

    /// Downcast to a concrete wrapper type.
    #[must_use]
    pub fn downcast_ref<W: ElementWrapper>(&self) -> Option<&W> {
        match self {
            Self::Wrapped(wrapper) => wrapper.as_any().downcast_ref::<W>(),
            Self::Element(_) => None,
        }
    }
}

/// What a MIME type lookup starts from.
#[derive(Debug, Clone, Copy)]
pub enum Base<'a> {
    Document(&'a Document),
    Element(&'a Element),
}

impl Base<'_> {
    /// The element whose name is looked up; a document resolves to its root.
    #[must_use]
    pub fn root(&self) -> &Element {
        match self {
            Self::Document(document) => document.root(),
            Self::Element(element) => element,
        }
    }
}

impl<'a> From<&'a Document> for Base<'a> {
    fn from(document: &'a Document) -> Self {
        Self::Document(document)
    }
}

impl<'a> From<&'a Element> for Base<'a> {
    fn from(element: &'a Element) -> Self {
        Self::Element(element)
    }
}

/// Maps qualified element names to wrapper constructors.
pub trait ExtensionFactory: Send + Sync + fmt::Debug {
    /// Namespaces this factory claims.
    fn namespaces(&self) -> &[String];

    fn handles_namespace(&self, namespace: &str) -> bool {
        self.namespaces().iter().any(|claimed| claimed == namespace)
    }

    /// Wrap an element, or hand it back unchanged.
    ///
    /// Never fails: an unknown name or a failing constructor yields
    /// `Extension::Element` holding the same `Arc`.
    fn element_wrapper(&self, element: Arc<Element>) -> Extension;

    /// MIME type associated with the root element of `base`, if any.
    fn mime_type(&self, base: Base<'_>) -> Option<String>;
}

/// Constructor producing a wrapper from an element.
pub type WrapperConstructor =
    Arc<dyn Fn(Arc<Element>) -> Result<Box<dyn ElementWrapper>, WrapperError> + Send + Sync>;

/// Extension factory populated through explicit registration calls.
///
/// ```
/// use std::sync::Arc;
/// use abdera_model::extension::{ExtensionFactory, SimpleExtensionFactory};
/// use abdera_model::{Element, QName};
///
/// let factory = SimpleExtensionFactory::new(["urn:example"])
///     .add_mime_type(QName::new("urn:example", "report"), "application/x-report+xml");
///
/// assert!(factory.handles_namespace("urn:example"));
/// let report = Element::new(QName::new("urn:example", "report"));
/// assert_eq!(
///     factory.mime_type((&report).into()).as_deref(),
///     Some("application/x-report+xml")
/// );
/// ```
#[derive(Clone, Default)]
pub struct SimpleExtensionFactory {
    namespaces: Vec<String>,
    constructors: HashMap<QName, WrapperConstructor>,
    mime_types: HashMap<QName, String>,
}

impl SimpleExtensionFactory {
    /// Create a factory claiming the given namespaces.
    #[must_use]
    pub fn new(namespaces: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut factory = Self::default();
        for namespace in namespaces {
            let namespace = namespace.into();
            if !factory.namespaces.contains(&namespace) {
                factory.namespaces.push(namespace);
            }
        }
        factory
    }

    /// Register a wrapper constructor for an element name.
    ///
    /// Names outside the claimed namespaces are accepted but never reached
    /// through a registry, which only consults factories claiming the
    /// element's namespace.
    #[must_use]
    pub fn add_impl<W, F>(mut self, name: QName, constructor: F) -> Self
    where
        W: ElementWrapper,
        F: Fn(Arc<Element>) -> Result<W, WrapperError> + Send + Sync + 'static,
    {
        if !name.namespace().is_some_and(|ns| self.handles_namespace(ns)) {
            tracing::warn!(element = %name, "Registering wrapper outside claimed namespaces");
        }
        let constructor: WrapperConstructor = Arc::new(move |element| {
            constructor(element).map(|wrapper| Box::new(wrapper) as Box<dyn ElementWrapper>)
        });
        self.constructors.insert(name, constructor);
        self
    }

    /// Associate a MIME type with a root element name.
    #[must_use]
    pub fn add_mime_type(mut self, name: QName, mime_type: impl Into<String>) -> Self {
        self.mime_types.insert(name, mime_type.into());
        self
    }

    /// Check whether a constructor is registered for a name.
    #[must_use]
    pub fn has_impl(&self, name: &QName) -> bool {
        self.constructors.contains_key(name)
    }
}

impl ExtensionFactory for SimpleExtensionFactory {
    fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    fn element_wrapper(&self, element: Arc<Element>) -> Extension {
        let Some(constructor) = self.constructors.get(element.name()) else {
            return Extension::Element(element);
        };
        match constructor(Arc::clone(&element)) {
            Ok(wrapper) => Extension::Wrapped(wrapper),
            Err(err) => {
                tracing::debug!(error = %err, "Wrapper construction failed, using plain element");
                Extension::Element(element)
            }
        }
    }

    fn mime_type(&self, base: Base<'_>) -> Option<String> {
        self.mime_types.get(base.root().name()).cloned()
    }
}

impl fmt::Debug for SimpleExtensionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleExtensionFactory")
            .field("namespaces", &self.namespaces)
            .field("constructors", &self.constructors.keys().collect::<Vec<_>>())
            .field("mime_types", &self.mime_types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:test";

    #[derive(Debug)]
    struct Rating {
        element: Arc<Element>,
        value: u8,
    }

    impl ElementWrapper for Rating {
        fn element(&self) -> &Arc<Element> {
            &self.element
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn rating(element: Arc<Element>) -> Result<Rating, WrapperError> {
        let value = element
            .text()
            .and_then(|t| t.trim().parse().ok())
            .ok_or_else(|| WrapperError::new(element.name(), "rating is not a number"))?;
        Ok(Rating { element, value })
    }

    fn factory() -> SimpleExtensionFactory {
        SimpleExtensionFactory::new([NS]).add_impl(QName::new(NS, "rating"), rating)
    }

    #[test]
    fn test_wraps_registered_element() {
        let element = Arc::new(Element::new(QName::new(NS, "rating")).with_text("4"));
        let extension = factory().element_wrapper(element);

        let wrapped = extension.downcast_ref::<Rating>().unwrap();
        assert_eq!(wrapped.value, 4);
    }

    #[test]
    fn test_failed_constructor_falls_back_to_same_element() {
        let element = Arc::new(Element::new(QName::new(NS, "rating")).with_text("five"));
        let extension = factory().element_wrapper(Arc::clone(&element));

        assert!(!extension.is_wrapped());
        assert!(Arc::ptr_eq(extension.element(), &element));
    }

    #[test]
    fn test_unregistered_name_is_returned_unchanged() {
        let element = Arc::new(Element::new(QName::new(NS, "other")));
        let extension = factory().element_wrapper(Arc::clone(&element));
        assert!(Arc::ptr_eq(extension.element(), &element));
    }

    #[test]
    fn test_namespaces_deduplicated() {
        let factory = SimpleExtensionFactory::new([NS, NS, "urn:other"]);
        assert_eq!(factory.namespaces(), ["urn:test", "urn:other"]);
        assert!(factory.handles_namespace("urn:other"));
        assert!(!factory.handles_namespace("urn:missing"));
    }

    #[test]
    fn test_mime_type_follows_document_root() {
        let factory = SimpleExtensionFactory::new([NS])
            .add_mime_type(QName::new(NS, "report"), "application/x-report+xml");
        let document = Document::new(Element::new(QName::new(NS, "report")));

        assert_eq!(
            factory.mime_type(Base::from(&document)).as_deref(),
            Some("application/x-report+xml")
        );
        let other = Element::new(QName::new(NS, "other"));
        assert_eq!(factory.mime_type(Base::from(&other)), None);
    }
}
