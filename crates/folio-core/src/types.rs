//! Core data types for Folio.
//!
//! This module defines the fundamental data structures shared by the
//! enumerator, the folder cache and the search index. These types are:
//!
//! - **Serializable**: documents and stats are persisted with the snapshot
//! - **Platform-agnostic**: no OS-specific details leak into these types
//! - **Immutable once built**: documents are replaced wholesale on rebuild

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single file or folder entry in the search index.
///
/// Documents are identified by their position in the snapshot's document
/// list; they carry no id of their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Filename without path (e.g., "Invoice_2024.pdf")
    pub name: String,

    /// Full path including filename
    pub path: String,

    /// True if this is a folder
    pub is_dir: bool,

    /// Name of the project whose tree contains this entry
    pub project: String,
}

impl IndexedDocument {
    /// Create a document from an enumerated item.
    pub fn from_item(item: &FileItem, project: &str) -> Self {
        IndexedDocument {
            name: item.name.clone(),
            path: item.path.to_string_lossy().into_owned(),
            is_dir: item.is_dir,
            project: project.to_string(),
        }
    }
}

/// One child of a folder, as produced by the directory enumerator and held
/// in the folder cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    /// Filename without path
    pub name: String,

    /// Full path including filename
    pub path: PathBuf,

    /// True if this is a folder
    pub is_dir: bool,

    /// Human-readable type label ("Folder" or "File")
    pub type_label: &'static str,

    /// File size in bytes (None for folders or if unavailable)
    pub size: Option<u64>,

    /// Last modification time
    pub modified: Option<DateTime<Utc>>,
}

impl FileItem {
    /// Label used for folders
    pub const FOLDER_LABEL: &'static str = "Folder";
    /// Label used for everything else
    pub const FILE_LABEL: &'static str = "File";

    /// Create a new item; the type label follows `is_dir`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, is_dir: bool) -> Self {
        FileItem {
            name: name.into(),
            path: path.into(),
            is_dir,
            type_label: if is_dir {
                Self::FOLDER_LABEL
            } else {
                Self::FILE_LABEL
            },
            size: None,
            modified: None,
        }
    }

    /// Set the file size
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the modification time
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }
}

/// Aggregate statistics for a folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStats {
    /// Number of immediate child folders
    pub folders: u64,

    /// Number of files in the whole subtree
    pub files: u64,

    /// Sum of the sizes of those files
    pub total_bytes: u64,
}

impl FolderStats {
    /// Total size in gibibytes, rounded to three decimals.
    pub fn total_gib(&self) -> f64 {
        let gib = self.total_bytes as f64 / (1024.0 * 1024.0 * 1024.0);
        (gib * 1000.0).round() / 1000.0
    }
}

/// A project root handed to the index builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Display name, usually the folder name
    pub name: String,

    /// Root folder of the project
    pub path: PathBuf,
}

impl Project {
    /// Create a new project
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Project {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// Statistics about the published index snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of documents (files + folders)
    pub documents: u64,

    /// Number of folder documents
    pub folders: u64,

    /// Number of file documents
    pub files: u64,

    /// Number of distinct tokens
    pub tokens: u64,

    /// Number of distinct projects
    pub projects: u64,

    /// When the snapshot was built
    pub built_at: Option<DateTime<Utc>>,
}

/// Entries that can be ordered for presentation.
pub trait DisplayOrder {
    fn is_folder(&self) -> bool;
    fn display_name(&self) -> &str;
}

impl DisplayOrder for IndexedDocument {
    fn is_folder(&self) -> bool {
        self.is_dir
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl DisplayOrder for FileItem {
    fn is_folder(&self) -> bool {
        self.is_dir
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Sort entries the way the browser shows them: folders before files, then
/// by name (case-insensitive, ties broken by exact name).
pub fn sort_for_display<T: DisplayOrder>(items: &mut [T]) {
    items.sort_by(display_cmp);
}

fn display_cmp<T: DisplayOrder>(a: &T, b: &T) -> Ordering {
    b.is_folder()
        .cmp(&a.is_folder())
        .then_with(|| {
            a.display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase())
        })
        .then_with(|| a.display_name().cmp(b.display_name()))
}
