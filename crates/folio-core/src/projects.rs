//! Project discovery and the persisted project list.
//!
//! A project is an immediate child folder of the configured projects root.
//! The index builder only needs `{name, path}` pairs, so any other source
//! of projects can hand it a `Vec<Project>` directly.
//!
//! [`ProjectList`] remembers the last discovered set as JSON so it is known
//! before the root is reachable, and reconciles it with a fresh discovery.

use crate::enumerate::{enumerate, EnumerateOptions};
use crate::error::Result;
use crate::types::Project;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// List the projects under `root`, sorted by name (case-insensitive).
///
/// A missing or unreadable root yields an empty list.
pub fn discover_projects(root: impl AsRef<Path>, options: EnumerateOptions) -> Vec<Project> {
    let root = root.as_ref();
    let mut projects: Vec<Project> = enumerate(root, options)
        .filter(|item| item.is_dir)
        .map(|item| Project::new(item.name, item.path))
        .collect();

    sort_projects(&mut projects);

    debug!(root = %root.display(), count = projects.len(), "Discovered projects");
    projects
}

fn sort_projects(projects: &mut [Project]) {
    projects.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Projects gained and lost by a [`ProjectList::sync`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub added: Vec<Project>,
    pub removed: Vec<Project>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The last known set of projects, persisted as a JSON array.
#[derive(Debug, Clone)]
pub struct ProjectList {
    file: PathBuf,
    projects: Vec<Project>,
}

impl ProjectList {
    /// Default file name inside the data directory.
    pub const FILE_NAME: &'static str = "projects.json";

    /// Load the list from `file`; missing or corrupt files give an empty list.
    pub fn load(file: impl AsRef<Path>) -> Self {
        let file = file.as_ref().to_path_buf();
        let mut projects = match fs::read_to_string(&file) {
            Ok(json) => match serde_json::from_str::<Vec<Project>>(&json) {
                Ok(list) => list,
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "Project list is corrupt, starting empty");
                    Vec::new()
                }
            },
            Err(e) => {
                debug!(path = %file.display(), error = %e, "No project list");
                Vec::new()
            }
        };
        sort_projects(&mut projects);
        ProjectList { file, projects }
    }

    /// The projects, sorted by name (case-insensitive).
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Replace the list with `discovered`, reporting what changed.
    ///
    /// Projects are matched by path; a renamed folder is one removal plus
    /// one addition.
    pub fn sync(&mut self, mut discovered: Vec<Project>) -> ProjectChanges {
        sort_projects(&mut discovered);

        let known: HashSet<&Path> = self.projects.iter().map(|p| p.path.as_path()).collect();
        let live: HashSet<&Path> = discovered.iter().map(|p| p.path.as_path()).collect();

        let changes = ProjectChanges {
            added: discovered
                .iter()
                .filter(|p| !known.contains(p.path.as_path()))
                .cloned()
                .collect(),
            removed: self
                .projects
                .iter()
                .filter(|p| !live.contains(p.path.as_path()))
                .cloned()
                .collect(),
        };

        if !changes.is_empty() {
            info!(
                added = changes.added.len(),
                removed = changes.removed.len(),
                total = discovered.len(),
                "Project list changed"
            );
        }
        self.projects = discovered;
        changes
    }

    /// Write the list to its file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.projects)?;
        fs::write(&self.file, json)?;
        Ok(())
    }
}
