//! # Folio Core Library
//!
//! This crate provides the local search index and folder cache behind the
//! Folio project-file browser. It crawls project trees, tokenizes file and
//! folder names (and, under configured paths, file contents), and answers
//! multi-term prefix queries while rebuilds run in the background.
//!
//! ## Architecture
//!
//! - **Enumerate** (`enumerate`): Lazy listing of one folder's children
//! - **Extract** (`extract`): Text extraction for content indexing
//! - **Tokenize** (`tokenize`): The tokenizer shared by indexing and queries
//! - **Snapshot** (`snapshot`): Immutable document list + inverted index
//! - **Index** (`index`): The search index service with atomic publish
//! - **Persistence** (`persistence`): On-disk storage of snapshots
//! - **Cache** (`cache`): Folder listing and statistics cache
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```rust,ignore
//! use folio_core::{
//!     discover_projects, CancellationToken, Config, NoProgress, RebuildRequest, SearchIndex,
//! };
//!
//! let config = Config::load()?;
//! let projects = discover_projects("/srv/projects", config.enumerate_options());
//!
//! let index = SearchIndex::new();
//! index.rebuild(&RebuildRequest::new(projects), &NoProgress, &CancellationToken::new())?;
//! for doc in index.search("invoice 2024") {
//!     println!("{}", doc.path);
//! }
//! ```

pub mod cache;
pub mod cancel;
pub mod config;
pub mod content_paths;
pub mod enumerate;
pub mod error;
pub mod extract;
pub mod index;
pub mod persistence;
pub mod progress;
pub mod projects;
pub mod snapshot;
pub mod tokenize;
pub mod types;

// Re-export commonly used types
pub use cache::{compute_stats, FolderCache};
pub use cancel::{CancellationToken, ScanOutcome};
pub use config::Config;
pub use content_paths::ContentPaths;
pub use enumerate::{enumerate, EnumerateOptions};
pub use error::{FolioError, Result};
pub use extract::{ContentExtractor, ContentKind};
pub use index::{IndexState, RebuildEvent, RebuildHandle, RebuildRequest, SearchIndex};
pub use persistence::SnapshotStore;
pub use progress::{LoggingProgress, NoProgress, ProgressSink};
pub use projects::{discover_projects, ProjectChanges, ProjectList};
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use tokenize::tokenize;
pub use types::{sort_for_display, FileItem, FolderStats, IndexStats, IndexedDocument, Project};
