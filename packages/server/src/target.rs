//! Request targets.

use std::collections::BTreeMap;

use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Kind of resource a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum TargetType {
    Service,
    Collection,
    Entry,
    Media,
    Categories,
}

/// A resolved target with the parameters captured from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    target_type: TargetType,
    params: BTreeMap<String, String>,
}

impl Target {
    #[must_use]
    pub fn new(target_type: TargetType, params: BTreeMap<String, String>) -> Self {
        Self { target_type, params }
    }

    #[must_use]
    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// The `collection` parameter.
    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        self.param("collection")
    }

    /// The `entry` parameter.
    #[must_use]
    pub fn entry(&self) -> Option<&str> {
        self.param("entry")
    }
}
