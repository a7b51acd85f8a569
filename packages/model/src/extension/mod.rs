//! Extension factories resolving typed wrappers for namespaced elements.
//!
//! Each vocabulary module contributes a factory built with explicit
//! registration calls. The [`ExtensionFactoryMap`] consults the factories
//! claiming an element's namespace and falls back to the plain element, so
//! documents with unknown or malformed extensions still parse.

pub mod control;
mod factory;
pub mod georss;
mod registry;
pub mod thread;

pub use factory::{
    Base, ElementWrapper, Extension, ExtensionFactory, SimpleExtensionFactory, WrapperConstructor,
};
pub use registry::ExtensionFactoryMap;

/// Registry holding the built-in vocabularies.
///
/// # Examples
/// ```
/// use abdera_model::extension::{default_factories, ExtensionFactory};
/// use abdera_model::qname::ns;
///
/// let registry = default_factories();
/// assert!(registry.handles_namespace(ns::THREAD));
/// assert!(registry.handles_namespace(ns::GEORSS));
/// assert!(registry.handles_namespace(ns::APP));
/// ```
#[must_use]
pub fn default_factories() -> ExtensionFactoryMap {
    let mut registry = ExtensionFactoryMap::new();
    registry
        .add_factory(thread::thread_factory())
        .add_factory(georss::georss_factory())
        .add_factory(control::control_factory());
    registry
}
