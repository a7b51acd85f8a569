//! Parsed documents.

use std::sync::{Arc, LazyLock};

use crate::element::Element;
use crate::extension::{default_factories, Base, Extension, ExtensionFactory, ExtensionFactoryMap};

static DEFAULT_FACTORIES: LazyLock<Arc<ExtensionFactoryMap>> =
    LazyLock::new(|| Arc::new(default_factories()));

/// Shared handle to the built-in extension registry.
#[must_use]
pub fn shared_default_factories() -> Arc<ExtensionFactoryMap> {
    Arc::clone(&DEFAULT_FACTORIES)
}

/// A root element together with its base URI and extension registry.
#[derive(Debug, Clone)]
pub struct Document {
    root: Arc<Element>,
    base: Option<String>,
    factories: Arc<ExtensionFactoryMap>,
}

impl Document {
    /// Wrap a root element using the built-in extension registry.
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self {
            root: Arc::new(root),
            base: None,
            factories: shared_default_factories(),
        }
    }

    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    #[must_use]
    pub fn with_factories(mut self, factories: Arc<ExtensionFactoryMap>) -> Self {
        self.factories = factories;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    #[must_use]
    pub fn root_arc(&self) -> &Arc<Element> {
        &self.root
    }

    /// Take the root element, cloning it only if it is shared.
    #[must_use]
    pub fn into_root(self) -> Element {
        Arc::unwrap_or_clone(self.root)
    }

    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    #[must_use]
    pub fn factories(&self) -> &Arc<ExtensionFactoryMap> {
        &self.factories
    }

    /// Resolve the wrapper for an element of this document.
    #[must_use]
    pub fn extension(&self, element: &Arc<Element>) -> Extension {
        self.factories.element_wrapper(Arc::clone(element))
    }

    /// MIME type registered for the root element, if any.
    #[must_use]
    pub fn mime_type(&self) -> Option<String> {
        self.factories.mime_type(Base::Document(self))
    }
}
