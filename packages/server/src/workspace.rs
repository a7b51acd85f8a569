//! Workspaces: named groups of collections, and their lookup by name.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::adapter::CollectionAdapter;

/// A titled group of named collections.
#[derive(Clone)]
pub struct WorkspaceInfo {
    pub title: String,
    pub collections: Vec<(String, Arc<dyn CollectionAdapter>)>,
}

impl WorkspaceInfo {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            collections: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>, adapter: Arc<dyn CollectionAdapter>) -> Self {
        self.collections.push((name.into(), adapter));
        self
    }
}

impl std::fmt::Debug for WorkspaceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceInfo")
            .field("title", &self.title)
            .field(
                "collections",
                &self.collections.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Source of the workspaces a server exposes.
pub trait WorkspaceManager: Send + Sync {
    fn workspaces(&self) -> &[WorkspaceInfo];

    /// Adapter of the collection with this path name.
    fn collection(&self, name: &str) -> Option<Arc<dyn CollectionAdapter>> {
        self.workspaces()
            .iter()
            .flat_map(|workspace| workspace.collections.iter())
            .find(|(candidate, _)| candidate == name)
            .map(|(_, adapter)| Arc::clone(adapter))
    }

    /// Overrides the computed service document ETag.
    fn entity_tag(&self) -> Option<String> {
        None
    }

    /// Last-Modified of the service document.
    fn last_modified(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Fixed set of workspaces.
#[derive(Debug, Clone, Default)]
pub struct DefaultWorkspaceManager {
    workspaces: Vec<WorkspaceInfo>,
    entity_tag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
}

impl DefaultWorkspaceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_workspace(mut self, workspace: WorkspaceInfo) -> Self {
        self.workspaces.push(workspace);
        self
    }

    #[must_use]
    pub fn with_entity_tag(mut self, tag: impl Into<String>) -> Self {
        self.entity_tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_last_modified(mut self, date: DateTime<Utc>) -> Self {
        self.last_modified = Some(date);
        self
    }
}

impl WorkspaceManager for DefaultWorkspaceManager {
    fn workspaces(&self) -> &[WorkspaceInfo] {
        &self.workspaces
    }

    fn entity_tag(&self) -> Option<String> {
        self.entity_tag.clone()
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }
}
