//! Namespace-qualified names.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Well-known namespace URIs.
pub mod ns {
    /// Atom Syndication Format (RFC 4287).
    pub const ATOM: &str = "http://www.w3.org/2005/Atom";
    /// Atom Publishing Protocol (RFC 5023).
    pub const APP: &str = "http://www.w3.org/2007/app";
    /// Atom Threading Extensions (RFC 4685).
    pub const THREAD: &str = "http://purl.org/syndication/thread/1.0";
    /// GeoRSS Simple.
    pub const GEORSS: &str = "http://www.georss.org/georss";
    /// The reserved `xml:` namespace.
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
}

/// A namespace-qualified name.
///
/// Equality and hashing consider only the namespace and the local part;
/// the prefix is a serialization hint.
#[derive(Debug, Clone, Eq)]
pub struct QName {
    namespace: Option<String>,
    local: String,
    prefix: Option<String>,
}

impl QName {
    /// Create a name in the given namespace.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: (!namespace.is_empty()).then_some(namespace),
            local: local.into(),
            prefix: None,
        }
    }

    /// Create a name without a namespace.
    #[must_use]
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
            prefix: None,
        }
    }

    /// Create a name with a preferred prefix.
    #[must_use]
    pub fn prefixed(
        namespace: impl Into<String>,
        local: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: (!prefix.is_empty()).then_some(prefix),
            ..Self::new(namespace, local)
        }
    }

    /// Shorthand for a name in the Atom namespace.
    #[must_use]
    pub fn atom(local: impl Into<String>) -> Self {
        Self::new(ns::ATOM, local)
    }

    /// Shorthand for a name in the Atompub namespace, using the `app` prefix.
    #[must_use]
    pub fn app(local: impl Into<String>) -> Self {
        Self::prefixed(ns::APP, local, "app")
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Return a copy of this name carrying the given prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Check whether this name is `local` in `namespace`.
    #[must_use]
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace() == Some(namespace) && self.local == local
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local == other.local
    }
}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local.hash(state);
    }
}

/// Formats as `namespace:local`, or just `local` without a namespace.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

impl From<roxmltree::ExpandedName<'_, '_>> for QName {
    fn from(name: roxmltree::ExpandedName<'_, '_>) -> Self {
        match name.namespace() {
            Some(namespace) => Self::new(namespace, name.name()),
            None => Self::local(name.name()),
        }
    }
}
