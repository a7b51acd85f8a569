//! Server configuration: a YAML file, overridden by `ABDERA_*` environment
//! variables.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use abdera_model::app::Categories;
use serde::Deserialize;

use crate::adapter::{AcceptMap, MULTIPART_RELATED};
use crate::basic::InMemoryAdapter;
use crate::error::{Result, ServerError};
use crate::mime::MediaType;
use crate::processor::Provider;
use crate::route::RouteManager;
use crate::workspace::{DefaultWorkspaceManager, WorkspaceInfo};

pub const ENV_LISTEN: &str = "ABDERA_LISTEN";
pub const ENV_BASE_PATH: &str = "ABDERA_BASE_PATH";
pub const ENV_MAX_BODY_BYTES: &str = "ABDERA_MAX_BODY_BYTES";

const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
const DEFAULT_AUTHOR: &str = "Abdera";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen: String,
    pub base_path: String,
    pub max_body_bytes: usize,
    pub workspaces: Vec<WorkspaceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    pub title: String,
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// Path segment of the collection.
    pub name: String,
    pub title: String,
    #[serde(default = "default_author")]
    pub author: String,
    /// Empty means Atom entries only.
    #[serde(default)]
    pub accepts: Vec<AcceptConfig>,
    #[serde(default)]
    pub categories: Option<CategoriesConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcceptConfig {
    pub media_type: String,
    #[serde(default)]
    pub alternate: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoriesConfig {
    pub fixed: bool,
    pub scheme: Option<String>,
    pub terms: Vec<String>,
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            base_path: "/".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            workspaces: vec![WorkspaceConfig {
                title: "Main".to_string(),
                collections: vec![CollectionConfig {
                    name: "entries".to_string(),
                    title: "Entries".to_string(),
                    author: default_author(),
                    accepts: Vec::new(),
                    categories: None,
                }],
            }],
        }
    }
}

impl ServerConfig {
    /// Load a YAML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loading configuration");
        Self::from_yaml(&yaml)?.with_env(|name| std::env::var(name).ok())
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env(|name| std::env::var(name).ok())
    }

    /// Parse and validate YAML, without environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ABDERA_*` overrides read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(listen) = lookup(ENV_LISTEN) {
            self.listen = listen;
        }
        if let Some(base_path) = lookup(ENV_BASE_PATH) {
            self.base_path = base_path;
        }
        if let Some(max) = lookup(ENV_MAX_BODY_BYTES) {
            self.max_body_bytes = max
                .trim()
                .parse()
                .map_err(|e| ServerError::Config(format!("{ENV_MAX_BODY_BYTES}='{max}': {e}")))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen.trim().is_empty() {
            return Err(ServerError::Config("listen address is empty".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(ServerError::Config("max_body_bytes must be positive".into()));
        }

        let mut names = HashSet::new();
        for collection in self.collections() {
            if collection.name.trim().is_empty() {
                return Err(ServerError::Config(format!(
                    "collection '{}' has an empty name",
                    collection.title
                )));
            }
            if collection.name.contains(['/', ';', '?']) {
                return Err(ServerError::Config(format!(
                    "collection name '{}' must be a single path segment",
                    collection.name
                )));
            }
            if !names.insert(collection.name.as_str()) {
                return Err(ServerError::Config(format!(
                    "duplicate collection '{}'",
                    collection.name
                )));
            }
            for accept in &collection.accepts {
                if MediaType::parse(&accept.media_type).is_none() {
                    return Err(ServerError::Config(format!(
                        "collection '{}': invalid media range '{}'",
                        collection.name, accept.media_type
                    )));
                }
                if !accept.alternate.is_empty() && accept.alternate != MULTIPART_RELATED {
                    return Err(ServerError::Config(format!(
                        "collection '{}': unknown alternate '{}', expected '' or '{MULTIPART_RELATED}'",
                        collection.name, accept.alternate
                    )));
                }
            }
        }
        Ok(())
    }

    /// All collections, across workspaces.
    pub fn collections(&self) -> impl Iterator<Item = &CollectionConfig> {
        self.workspaces
            .iter()
            .flat_map(|workspace| workspace.collections.iter())
    }

    /// In-memory collections for every configured collection.
    #[must_use]
    pub fn workspace_manager(&self) -> DefaultWorkspaceManager {
        self.workspaces
            .iter()
            .fold(DefaultWorkspaceManager::new(), |manager, workspace| {
                let info = workspace
                    .collections
                    .iter()
                    .fold(WorkspaceInfo::new(&workspace.title), |info, collection| {
                        info.with_collection(&collection.name, Arc::new(collection.adapter()))
                    });
                manager.with_workspace(info)
            })
    }

    /// Routes under `base_path` plus the configured workspaces.
    pub fn provider(&self) -> Result<Provider> {
        let routes = RouteManager::standard(&self.base_path)?;
        Ok(Provider::new(routes, Arc::new(self.workspace_manager())))
    }
}

impl CollectionConfig {
    #[must_use]
    pub fn accept_map(&self) -> AcceptMap {
        if self.accepts.is_empty() {
            return AcceptMap::entries_only();
        }
        self.accepts
            .iter()
            .fold(AcceptMap::new(), |map, accept| map.accept(&accept.media_type, &accept.alternate))
    }

    #[must_use]
    pub fn adapter(&self) -> InMemoryAdapter {
        let adapter = InMemoryAdapter::new(&self.title, &self.author).with_accepts(self.accept_map());
        match &self.categories {
            Some(config) => adapter.with_categories(config.to_categories()),
            None => adapter,
        }
    }
}

impl CategoriesConfig {
    #[must_use]
    pub fn to_categories(&self) -> Categories {
        let categories = Categories::new().fixed(self.fixed);
        let categories = match &self.scheme {
            Some(scheme) => categories.with_scheme(scheme),
            None => categories,
        };
        self.terms
            .iter()
            .fold(categories, |categories, term| categories.with_term(term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::CollectionAdapter;
    use crate::workspace::WorkspaceManager;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const YAML: &str = r#"
listen: 127.0.0.1:9000
base_path: /atom
workspaces:
  - title: Main
    collections:
      - name: customers
        title: Customers
        accepts:
          - { media_type: "application/atom+xml;type=entry", alternate: "" }
          - { media_type: "image/*", alternate: "multipart-related" }
        categories: { fixed: true, scheme: "urn:example", terms: [a, b] }
"#;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.max_body_bytes, 16 * 1024 * 1024);
        assert_eq!(config.collections().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["entries"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let config = ServerConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000");
        assert_eq!(config.base_path, "/atom");
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);

        let collection = config.collections().next().unwrap();
        assert_eq!(collection.author, "Abdera");
        let accepts = collection.accept_map();
        assert!(accepts.accepts_multipart());

        let categories = collection.categories.as_ref().unwrap().to_categories();
        assert!(categories.fixed);
        assert_eq!(categories.categories.len(), 2);
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::default()
            .with_env(|name| match name {
                ENV_LISTEN => Some("127.0.0.1:1".to_string()),
                ENV_MAX_BODY_BYTES => Some("1024".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.listen, "127.0.0.1:1");
        assert_eq!(config.max_body_bytes, 1024);
        assert_eq!(config.base_path, "/");

        let err = ServerConfig::default()
            .with_env(|name| (name == ENV_MAX_BODY_BYTES).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_BODY_BYTES));
    }

    #[test]
    fn test_validation_errors() {
        let duplicate = r"
workspaces:
  - title: A
    collections:
      - { name: notes, title: Notes }
  - title: B
    collections:
      - { name: notes, title: Other }
";
        let err = ServerConfig::from_yaml(duplicate).unwrap_err();
        assert_eq!(err.to_string(), "configuration error: duplicate collection 'notes'");

        let alternate = r#"
workspaces:
  - title: A
    collections:
      - name: notes
        title: Notes
        accepts: [{ media_type: "image/*", alternate: "inline" }]
"#;
        assert!(matches!(ServerConfig::from_yaml(alternate), Err(ServerError::Config(_))));

        let unknown = "listen: x\nport: 1\n";
        assert!(matches!(ServerConfig::from_yaml(unknown), Err(ServerError::Yaml(_))));
    }

    #[test]
    fn test_load_and_build_provider() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        let provider = config.provider().unwrap();
        assert_eq!(provider.routes().base_path(), "/atom");

        let adapter = provider.workspaces().collection("customers").unwrap();
        assert_eq!(adapter.title(), "Customers");
        assert!(adapter.categories().is_some());
    }
}
