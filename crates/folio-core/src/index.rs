//! The search index service.
//!
//! [`SearchIndex`] owns the published [`Snapshot`] and is the only way to
//! replace it. It supports:
//!
//! - Loading a persisted snapshot at startup
//! - Full rebuilds from a list of projects, with progress and cancellation
//! - Concurrent multi-term prefix queries while a rebuild runs
//!
//! ## Architecture
//!
//! - The published snapshot lives behind `RwLock<Option<Arc<Snapshot>>>`.
//!   Queries clone the `Arc` under the read lock and search without holding
//!   it; publishing a rebuild is a pointer swap under the write lock.
//! - A rebuild fills a private [`SnapshotBuilder`]. Nothing it does is
//!   visible until the finished snapshot is swapped in, so a cancelled
//!   rebuild leaves the previous snapshot untouched.
//! - At most one rebuild runs at a time. A second request fails with
//!   [`FolioError::RebuildInProgress`].

use crate::cancel::{CancellationToken, ScanOutcome};
use crate::content_paths::matches_prefix;
use crate::enumerate::{enumerate, EnumerateOptions};
use crate::error::{FolioError, Result};
use crate::extract::ContentExtractor;
use crate::persistence::SnapshotStore;
use crate::progress::{percent, ProgressSink};
use crate::snapshot::{Snapshot, SnapshotBuilder};
use crate::tokenize::{tokenize, tokens};
use crate::types::{IndexStats, IndexedDocument, Project};
use crossbeam_channel::{unbounded, Receiver};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Lifecycle state of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// No snapshot has been loaded or built
    Empty,
    /// A snapshot is published and serving queries
    Ready,
    /// A rebuild is running; the previous snapshot (if any) keeps serving
    Rebuilding,
}

impl std::fmt::Display for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexState::Empty => write!(f, "empty"),
            IndexState::Ready => write!(f, "ready"),
            IndexState::Rebuilding => write!(f, "rebuilding"),
        }
    }
}

/// Everything a rebuild needs to know about its sources.
#[derive(Debug, Clone, Default)]
pub struct RebuildRequest {
    /// Project roots to crawl, in order
    pub projects: Vec<Project>,

    /// Files under these prefixes also get their content tokenized
    pub content_prefixes: Vec<String>,

    /// Extractor used for content-indexed files
    pub extractor: ContentExtractor,

    /// Enumeration policy for the crawl
    pub options: EnumerateOptions,
}

impl RebuildRequest {
    pub fn new(projects: Vec<Project>) -> Self {
        RebuildRequest {
            projects,
            ..Default::default()
        }
    }

    /// Set the content-indexed path prefixes
    pub fn with_content_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.content_prefixes = prefixes;
        self
    }

    /// Set the content extractor
    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Set the enumeration options
    pub fn with_options(mut self, options: EnumerateOptions) -> Self {
        self.options = options;
        self
    }
}

/// The search index service.
///
/// Construct one per process and share it behind an `Arc`.
///
/// ## Example
///
/// ```rust,ignore
/// use folio_core::{CancellationToken, NoProgress, RebuildRequest, SearchIndex};
///
/// let index = SearchIndex::new();
/// index.rebuild(&RebuildRequest::new(projects), &NoProgress, &CancellationToken::new())?;
/// for doc in index.search("invoice 2024") {
///     println!("{}", doc.path);
/// }
/// ```
pub struct SearchIndex {
    /// The published snapshot, swapped wholesale on rebuild
    published: RwLock<Option<Arc<Snapshot>>>,

    /// Where snapshots are persisted after publish
    store: Option<SnapshotStore>,

    /// Set while a rebuild owns the writer role
    rebuilding: AtomicBool,

    /// Incremented on every publish or clear
    generation: AtomicU64,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the writer role when the rebuild ends, however it ends.
struct RebuildGuard<'a>(&'a AtomicBool);

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SearchIndex {
    /// Create an empty, in-memory only index.
    pub fn new() -> Self {
        SearchIndex {
            published: RwLock::new(None),
            store: None,
            rebuilding: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Create an empty index that persists to `store` after each rebuild.
    pub fn with_store(store: SnapshotStore) -> Self {
        SearchIndex {
            store: Some(store),
            ..Self::new()
        }
    }

    pub fn state(&self) -> IndexState {
        if self.rebuilding.load(Ordering::Acquire) {
            IndexState::Rebuilding
        } else if self.published.read().is_some() {
            IndexState::Ready
        } else {
            IndexState::Empty
        }
    }

    /// True if a snapshot is published, even while a rebuild runs.
    pub fn is_ready(&self) -> bool {
        self.published.read().is_some()
    }

    /// Get the current generation (publish counter).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The published snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.published.read().clone()
    }

    /// Statistics of the published snapshot (all zero when empty).
    pub fn stats(&self) -> IndexStats {
        self.snapshot().map(|s| s.stats()).unwrap_or_default()
    }

    /// Number of documents in the published snapshot.
    pub fn len(&self) -> usize {
        self.snapshot().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Publish the persisted snapshot, if there is a usable one.
    ///
    /// Returns true on success. A missing or corrupt snapshot leaves the
    /// index as it was; the reason is logged, never returned.
    pub fn load_from_disk(&self) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match store.load_or_none() {
            Some(snapshot) => {
                self.publish(Arc::new(snapshot));
                true
            }
            None => false,
        }
    }

    /// Rebuild the index on the calling thread.
    ///
    /// Returns `Cancelled` if `cancel` fired before publish; the previously
    /// published snapshot is then still in place. Fails only if another
    /// rebuild is already running.
    pub fn rebuild(
        &self,
        request: &RebuildRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome<IndexStats>> {
        self.begin_rebuild()?;
        let _guard = RebuildGuard(&self.rebuilding);
        Ok(self.run_rebuild(request, progress, cancel))
    }

    /// Rebuild the index on a background thread.
    ///
    /// The returned handle streams progress and the final outcome, and can
    /// cancel the rebuild. Fails if another rebuild is already running.
    pub fn spawn_rebuild(self: &Arc<Self>, request: RebuildRequest) -> Result<RebuildHandle> {
        self.begin_rebuild()?;

        let (tx, rx) = unbounded();
        let cancel = CancellationToken::new();
        let index = Arc::clone(self);
        let worker_cancel = cancel.clone();

        let spawned = thread::Builder::new()
            .name("folio-rebuild".to_string())
            .spawn(move || {
                let _guard = RebuildGuard(&index.rebuilding);
                let progress_tx = tx.clone();
                let sink = move |p: f64| {
                    let _ = progress_tx.send(RebuildEvent::Progress(p));
                };
                let outcome = index.run_rebuild(&request, &sink, &worker_cancel);
                let _ = tx.send(RebuildEvent::Finished(outcome.clone()));
                outcome
            });

        match spawned {
            Ok(thread) => Ok(RebuildHandle {
                events: rx,
                cancel,
                thread: Some(thread),
            }),
            Err(e) => {
                self.rebuilding.store(false, Ordering::Release);
                Err(FolioError::Io(e))
            }
        }
    }

    /// Find every document that has, for each query term, a token starting
    /// with that term. The result is unordered; see
    /// [`sort_for_display`](crate::types::sort_for_display).
    pub fn search(&self, query: &str) -> Vec<IndexedDocument> {
        self.search_limited(query, usize::MAX)
    }

    /// Like [`search`](Self::search), but returns at most `limit` documents.
    pub fn search_limited(&self, query: &str, limit: usize) -> Vec<IndexedDocument> {
        let terms = tokenize(query);
        if terms.is_empty() || limit == 0 {
            return Vec::new();
        }
        let Some(snapshot) = self.snapshot() else {
            return Vec::new();
        };

        let results = snapshot.matching_documents(&terms, limit);
        debug!(query = %query, terms = terms.len(), results = results.len(), "Search complete");
        results
    }

    /// Drop the published snapshot and delete the persisted one.
    pub fn clear(&self) -> Result<()> {
        *self.published.write() = None;
        self.generation.fetch_add(1, Ordering::Release);
        if let Some(store) = &self.store {
            store.clear()?;
        }
        info!("Index cleared");
        Ok(())
    }

    fn begin_rebuild(&self) -> Result<()> {
        self.rebuilding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| FolioError::RebuildInProgress)
    }

    fn publish(&self, snapshot: Arc<Snapshot>) {
        *self.published.write() = Some(snapshot);
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Crawl, publish and persist. The caller holds the writer role.
    #[instrument(skip_all, fields(projects = request.projects.len()))]
    fn run_rebuild(
        &self,
        request: &RebuildRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> ScanOutcome<IndexStats> {
        let started = Instant::now();
        info!("Starting index rebuild");

        let mut builder = SnapshotBuilder::new();
        let total = request.projects.len();

        for (done, project) in request.projects.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(completed_projects = done, "Index rebuild cancelled");
                return ScanOutcome::Cancelled;
            }

            let before = builder.len();
            if index_project(&mut builder, project, request, cancel).is_cancelled() {
                info!(completed_projects = done, "Index rebuild cancelled");
                return ScanOutcome::Cancelled;
            }
            debug!(
                project = %project.name,
                documents = builder.len() - before,
                "Project indexed"
            );
            progress.report(percent(done + 1, total));
        }

        if cancel.is_cancelled() {
            info!("Index rebuild cancelled before publish");
            return ScanOutcome::Cancelled;
        }

        let snapshot = Arc::new(builder.finish());
        let stats = snapshot.stats();
        self.publish(Arc::clone(&snapshot));

        info!(
            documents = stats.documents,
            tokens = stats.tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Index rebuild published"
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&snapshot) {
                warn!(error = %e, "Failed to persist index snapshot");
            }
        }

        if total == 0 {
            progress.report(100.0);
        }
        ScanOutcome::Completed(stats)
    }
}

/// Breadth-first crawl of one project into `builder`.
fn index_project(
    builder: &mut SnapshotBuilder,
    project: &Project,
    request: &RebuildRequest,
    cancel: &CancellationToken,
) -> ScanOutcome<()> {
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(project.path.clone());

    while let Some(folder) = queue.pop_front() {
        if cancel.is_cancelled() {
            return ScanOutcome::Cancelled;
        }

        for item in enumerate(&folder, request.options) {
            if cancel.is_cancelled() {
                return ScanOutcome::Cancelled;
            }

            let document = IndexedDocument::from_item(&item, &project.name);
            let content = if !item.is_dir && matches_prefix(&document.path, &request.content_prefixes)
            {
                request.extractor.extract_text(&item.path)
            } else {
                String::new()
            };

            builder.push(document, tokens(&item.name).chain(tokens(&content)));

            if item.is_dir {
                queue.push_back(item.path);
            }
        }
    }
    ScanOutcome::Completed(())
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("state", &self.state())
            .field("documents", &self.len())
            .field("generation", &self.generation())
            .finish()
    }
}

/// Message sent from a background rebuild.
#[derive(Debug, Clone)]
pub enum RebuildEvent {
    /// Percentage of projects completed
    Progress(f64),
    /// The rebuild ended; no further events follow
    Finished(ScanOutcome<IndexStats>),
}

/// Handle to a rebuild started with [`SearchIndex::spawn_rebuild`].
///
/// Dropping the handle without joining cancels the rebuild and waits for
/// the worker to stop.
pub struct RebuildHandle {
    events: Receiver<RebuildEvent>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<ScanOutcome<IndexStats>>>,
}

impl RebuildHandle {
    /// Progress and completion events, in order.
    pub fn progress(&self) -> &Receiver<RebuildEvent> {
        &self.events
    }

    /// Ask the worker to stop at its next check.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker and return its outcome.
    pub fn join(mut self) -> ScanOutcome<IndexStats> {
        match self.thread.take() {
            Some(thread) => match thread.join() {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            },
            None => ScanOutcome::Cancelled,
        }
    }
}

impl Drop for RebuildHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.cancel.cancel();
            let _ = thread.join();
        }
    }
}
