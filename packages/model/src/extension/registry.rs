//! Registry aggregating extension factories.

use std::sync::Arc;

use super::factory::{Base, Extension, ExtensionFactory};
use crate::element::Element;

/// Ordered collection of extension factories.
///
/// Factories are consulted in registration order, so when two factories
/// claim the same namespace and element name the first one registered wins.
/// Registration happens during initialization; share the finished registry
/// behind an `Arc` so it can no longer change.
#[derive(Debug, Default, Clone)]
pub struct ExtensionFactoryMap {
    factories: Vec<Arc<dyn ExtensionFactory>>,
    namespaces: Vec<String>,
}

impl ExtensionFactoryMap {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory and claim its namespaces.
    pub fn add_factory(&mut self, factory: impl ExtensionFactory + 'static) -> &mut Self {
        self.add_shared(Arc::new(factory))
    }

    /// Register a factory that is shared with other owners.
    pub fn add_shared(&mut self, factory: Arc<dyn ExtensionFactory>) -> &mut Self {
        for namespace in factory.namespaces() {
            if !self.namespaces.contains(namespace) {
                self.namespaces.push(namespace.clone());
            }
        }
        tracing::debug!(namespaces = ?factory.namespaces(), "Registered extension factory");
        self.factories.push(factory);
        self
    }

    /// Registered factories in consultation order.
    #[must_use]
    pub fn factories(&self) -> &[Arc<dyn ExtensionFactory>] {
        &self.factories
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ExtensionFactory for ExtensionFactoryMap {
    fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    fn element_wrapper(&self, element: Arc<Element>) -> Extension {
        let namespace = element.namespace().map(str::to_owned);
        for factory in &self.factories {
            let claims = namespace
                .as_deref()
                .is_none_or(|ns| factory.handles_namespace(ns));
            if !claims {
                continue;
            }
            match factory.element_wrapper(Arc::clone(&element)) {
                Extension::Wrapped(wrapper) => return Extension::Wrapped(wrapper),
                Extension::Element(_) => continue,
            }
        }
        Extension::Element(element)
    }

    fn mime_type(&self, base: Base<'_>) -> Option<String> {
        let namespace = base.root().namespace()?;
        self.factories
            .iter()
            .find(|factory| factory.handles_namespace(namespace))
            .and_then(|factory| factory.mime_type(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WrapperError;
    use crate::extension::{ElementWrapper, SimpleExtensionFactory};
    use crate::qname::QName;
    use std::any::Any;

    const NS: &str = "urn:shared";

    #[derive(Debug)]
    struct Tagged {
        element: Arc<Element>,
        source: &'static str,
    }

    impl ElementWrapper for Tagged {
        fn element(&self) -> &Arc<Element> {
            &self.element
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn tagged(source: &'static str) -> impl Fn(Arc<Element>) -> Result<Tagged, WrapperError> {
        move |element| Ok(Tagged { element, source })
    }

    #[test]
    fn test_add_factory_unions_namespaces() {
        let mut registry = ExtensionFactoryMap::new();
        registry
            .add_factory(SimpleExtensionFactory::new(["urn:a", "urn:b"]))
            .add_factory(SimpleExtensionFactory::new(["urn:b", "urn:c"]));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.namespaces(), ["urn:a", "urn:b", "urn:c"]);
        assert!(registry.handles_namespace("urn:c"));
    }

    #[test]
    fn test_unclaimed_namespace_returns_identity() {
        let mut registry = ExtensionFactoryMap::new();
        registry.add_factory(
            SimpleExtensionFactory::new([NS]).add_impl(QName::new(NS, "x"), tagged("first")),
        );

        let element = Arc::new(Element::new(QName::new("urn:unknown", "x")));
        let extension = registry.element_wrapper(Arc::clone(&element));
        assert!(Arc::ptr_eq(extension.element(), &element));
        assert!(!extension.is_wrapped());
    }

    #[test]
    fn test_empty_registry_returns_identity() {
        let registry = ExtensionFactoryMap::new();
        let element = Arc::new(Element::new(QName::local("plain")));
        let extension = registry.element_wrapper(Arc::clone(&element));
        assert!(Arc::ptr_eq(extension.element(), &element));
    }

    #[test]
    fn test_first_factory_with_mapping_wins() {
        let name = QName::new(NS, "x");
        let mut registry = ExtensionFactoryMap::new();
        registry
            // Claims the namespace but has no mapping for `x`.
            .add_factory(SimpleExtensionFactory::new([NS]))
            .add_factory(SimpleExtensionFactory::new([NS]).add_impl(name.clone(), tagged("second")))
            .add_factory(SimpleExtensionFactory::new([NS]).add_impl(name.clone(), tagged("third")));

        let extension = registry.element_wrapper(Arc::new(Element::new(name)));
        let wrapped = extension.downcast_ref::<Tagged>().unwrap();
        assert_eq!(wrapped.source, "second");
    }

    #[test]
    fn test_failing_constructor_tries_next_factory() {
        let name = QName::new(NS, "x");
        let failing = |element: Arc<Element>| -> Result<Tagged, WrapperError> {
            Err(WrapperError::new(element.name(), "broken"))
        };
        let mut registry = ExtensionFactoryMap::new();
        registry
            .add_factory(SimpleExtensionFactory::new([NS]).add_impl(name.clone(), failing))
            .add_factory(SimpleExtensionFactory::new([NS]).add_impl(name.clone(), tagged("backup")));

        let extension = registry.element_wrapper(Arc::new(Element::new(name)));
        assert_eq!(extension.downcast_ref::<Tagged>().unwrap().source, "backup");
    }

    #[test]
    fn test_mime_type_uses_first_claiming_factory() {
        let name = QName::new(NS, "doc");
        let mut registry = ExtensionFactoryMap::new();
        registry
            .add_factory(SimpleExtensionFactory::new([NS]))
            .add_factory(SimpleExtensionFactory::new([NS]).add_mime_type(name.clone(), "text/x-doc"));

        // The first claiming factory has no mapping and results are not merged.
        let element = Element::new(name);
        assert_eq!(registry.mime_type(Base::from(&element)), None);
    }
}
