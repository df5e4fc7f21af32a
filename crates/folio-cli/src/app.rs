//! Application state management.

use anyhow::Context;
use folio_core::{
    discover_projects, Config, ContentPaths, FolderCache, Project, ProjectList, RebuildRequest,
    SearchIndex, SnapshotStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state.
pub struct App {
    /// Configuration
    pub config: Config,

    /// The search index, with any persisted snapshot already loaded
    pub index: Arc<SearchIndex>,

    /// Folder listing and statistics cache
    pub cache: FolderCache,

    /// Content-indexed path prefixes
    pub content_paths: ContentPaths,

    /// Projects found by the last discovery
    pub project_list: ProjectList,

    /// Where the snapshot and path list live
    pub data_dir: PathBuf,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let data_dir = config.data_dir()?;
        let index = Arc::new(SearchIndex::with_store(store_for(&config, &data_dir)));
        let loaded = index.load_from_disk();
        let content_paths = ContentPaths::load(data_dir.join(ContentPaths::FILE_NAME));
        let project_list = ProjectList::load(data_dir.join(ProjectList::FILE_NAME));

        info!(
            data_dir = %data_dir.display(),
            loaded,
            documents = index.len(),
            content_paths = content_paths.list().len(),
            known_projects = project_list.len(),
            "Application initialized"
        );

        Ok(App {
            config,
            index,
            cache: FolderCache::new(),
            content_paths,
            project_list,
            data_dir,
        })
    }

    /// Projects under `root`, or under the configured projects root.
    ///
    /// The remembered project list is brought in line with what is on disk
    /// and written back when it changed.
    pub fn projects(&mut self, root: Option<&Path>) -> anyhow::Result<Vec<Project>> {
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => self.config.general.projects_root.clone().context(
                "No projects root configured. Pass --root or set general.projects_root",
            )?,
        };
        if !root.is_dir() {
            anyhow::bail!("Projects root {} is not a folder", root.display());
        }
        let changes = self
            .project_list
            .sync(discover_projects(&root, self.config.enumerate_options()));
        for project in &changes.added {
            info!(project = %project, "New project");
        }
        for project in &changes.removed {
            info!(project = %project, "Project no longer present");
        }
        if !changes.is_empty() {
            if let Err(e) = self.project_list.save() {
                warn!(error = %e, "Failed to save project list");
            }
        }
        Ok(self.project_list.projects().to_vec())
    }

    /// A rebuild request for `projects` under the current settings.
    pub fn rebuild_request(&self, projects: Vec<Project>) -> RebuildRequest {
        RebuildRequest::new(projects)
            .with_content_prefixes(self.content_paths.list().to_vec())
            .with_extractor(self.config.extractor())
            .with_options(self.config.enumerate_options())
    }
}

/// The snapshot store configured for `data_dir`.
pub fn store_for(config: &Config, data_dir: &Path) -> SnapshotStore {
    SnapshotStore::new(data_dir).with_compression(config.index.compress_snapshot)
}
