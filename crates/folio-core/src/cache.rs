//! Folder listing and statistics cache.
//!
//! [`FolderCache`] keeps two independent maps keyed by folder path: the
//! listing of a folder's children and its aggregate [`FolderStats`]. Both
//! are plain key-value stores. Last write wins, and nothing is evicted or
//! expires until [`FolderCache::clear`] or process exit.
//!
//! Entries are sharded in `DashMap`s, so readers of one path never wait on
//! a writer of another. A bulk pre-cache and an ad-hoc listing of the same
//! folder may race; whichever finishes last is kept.

use crate::cancel::{CancellationToken, ScanOutcome};
use crate::enumerate::{enumerate, EnumerateOptions};
use crate::progress::{percent, ProgressSink};
use crate::types::{FileItem, FolderStats};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Shared cache of folder listings and folder statistics.
#[derive(Debug, Default)]
pub struct FolderCache {
    listings: DashMap<PathBuf, Arc<Vec<FileItem>>>,
    stats: DashMap<PathBuf, FolderStats>,
}

impl FolderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached listing of `path`, if any.
    pub fn get(&self, path: &Path) -> Option<Arc<Vec<FileItem>>> {
        self.listings.get(path).map(|entry| Arc::clone(entry.value()))
    }

    /// Store the listing of `path`, replacing any previous one.
    pub fn put(&self, path: impl Into<PathBuf>, listing: Vec<FileItem>) {
        self.listings.insert(path.into(), Arc::new(listing));
    }

    /// Cached statistics of `path`, if any.
    pub fn get_stats(&self, path: &Path) -> Option<FolderStats> {
        self.stats.get(path).map(|entry| *entry.value())
    }

    /// Store the statistics of `path`, replacing any previous value.
    pub fn put_stats(&self, path: impl Into<PathBuf>, stats: FolderStats) {
        self.stats.insert(path.into(), stats);
    }

    /// Listing of `path`, enumerating and caching it on a miss.
    ///
    /// Returns `None` if the folder cannot be opened; nothing is cached then.
    pub fn list(&self, path: &Path, options: EnumerateOptions) -> Option<Arc<Vec<FileItem>>> {
        if let Some(listing) = self.get(path) {
            return Some(listing);
        }
        self.refresh(path, options)
    }

    /// Re-enumerate `path` and overwrite its cached listing.
    pub fn refresh(&self, path: &Path, options: EnumerateOptions) -> Option<Arc<Vec<FileItem>>> {
        let entries = enumerate(path, options);
        if !entries.is_opened() {
            return None;
        }
        let listing = Arc::new(entries.collect::<Vec<_>>());
        self.listings
            .insert(path.to_path_buf(), Arc::clone(&listing));
        Some(listing)
    }

    /// Items of the cached listing of `path` whose name contains `text`,
    /// ignoring case. Empty if the folder is not cached.
    pub fn filter(&self, path: &Path, text: &str) -> Vec<FileItem> {
        let Some(listing) = self.get(path) else {
            return Vec::new();
        };
        let needle = text.to_lowercase();
        listing
            .iter()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Cached statistics of `path`, computing them on a miss.
    ///
    /// Only completed computations for folders are cached.
    pub fn stats_or_compute(
        &self,
        path: &Path,
        options: EnumerateOptions,
        cancel: &CancellationToken,
    ) -> ScanOutcome<FolderStats> {
        if let Some(stats) = self.get_stats(path) {
            return ScanOutcome::Completed(stats);
        }

        let outcome = compute_stats(path, options, cancel);
        if let ScanOutcome::Completed(stats) = &outcome {
            if path.is_dir() {
                self.put_stats(path, *stats);
            }
        }
        outcome
    }

    /// Statistics of `path` computed from cached listings alone.
    ///
    /// Returns None if `path` itself has no cached listing. Subfolders that
    /// were never cached contribute nothing.
    pub fn cached_stats(&self, path: &Path) -> Option<FolderStats> {
        let top = self.get(path)?;
        let mut stats = FolderStats::default();
        let mut queue: VecDeque<Arc<Vec<FileItem>>> = VecDeque::new();
        stats.folders = top.iter().filter(|item| item.is_dir).count() as u64;
        queue.push_back(top);

        while let Some(listing) = queue.pop_front() {
            for item in listing.iter() {
                if item.is_dir {
                    if let Some(child) = self.get(&item.path) {
                        queue.push_back(child);
                    }
                } else {
                    stats.files += 1;
                    stats.total_bytes += item.size.unwrap_or(0);
                }
            }
        }
        Some(stats)
    }

    /// Walk the whole tree under `root` breadth-first, caching the listing
    /// of every folder that can be opened.
    ///
    /// Progress is the share of `root`'s immediate child folders processed.
    /// Folders found deeper down are not counted, so the figure runs ahead
    /// of the real work on deep trees; it is clamped to 100.
    ///
    /// On cancellation, folders cached so far stay cached. Returns the
    /// number of folders cached.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn precache_all(
        &self,
        root: &Path,
        options: EnumerateOptions,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> ScanOutcome<usize> {
        let started = Instant::now();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();
        queue.push_back(root.to_path_buf());

        let mut total: Option<usize> = None;
        let mut processed = 0usize;
        let mut cached = 0usize;

        while let Some(folder) = queue.pop_front() {
            if cancel.is_cancelled() {
                info!(cached, "Pre-cache cancelled");
                return ScanOutcome::Cancelled;
            }

            let entries = enumerate(&folder, options);
            if !entries.is_opened() {
                debug!(path = %folder.display(), "Skipping inaccessible folder");
                continue;
            }

            let mut listing = Vec::new();
            for item in entries {
                if cancel.is_cancelled() {
                    info!(cached, "Pre-cache cancelled");
                    return ScanOutcome::Cancelled;
                }
                if item.is_dir {
                    queue.push_back(item.path.clone());
                }
                listing.push(item);
            }
            self.put(folder, listing);
            cached += 1;

            // The first folder is the root; its children set the denominator.
            match total {
                None => total = Some(queue.len()),
                Some(total) => {
                    processed += 1;
                    progress.report(percent(processed, total));
                }
            }
        }

        progress.report(100.0);
        info!(
            cached,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pre-cache complete"
        );
        ScanOutcome::Completed(cached)
    }

    /// Number of cached listings.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Number of cached statistics.
    pub fn stats_len(&self) -> usize {
        self.stats.len()
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.listings.clear();
        self.stats.clear();
    }
}

/// Compute the statistics of `path`.
///
/// `folders` counts the immediate child folders, `files` and `total_bytes`
/// cover every file in the subtree. Inaccessible folders are skipped.
pub fn compute_stats(
    path: &Path,
    options: EnumerateOptions,
    cancel: &CancellationToken,
) -> ScanOutcome<FolderStats> {
    let mut stats = FolderStats::default();
    let mut queue: VecDeque<(PathBuf, bool)> = VecDeque::new();
    queue.push_back((path.to_path_buf(), true));

    while let Some((folder, top_level)) = queue.pop_front() {
        if cancel.is_cancelled() {
            return ScanOutcome::Cancelled;
        }
        for item in enumerate(&folder, options) {
            if cancel.is_cancelled() {
                return ScanOutcome::Cancelled;
            }
            if item.is_dir {
                if top_level {
                    stats.folders += 1;
                }
                queue.push_back((item.path, false));
            } else {
                stats.files += 1;
                stats.total_bytes += item.size.unwrap_or(0);
            }
        }
    }

    debug!(
        path = %path.display(),
        folders = stats.folders,
        files = stats.files,
        bytes = stats.total_bytes,
        "Folder statistics computed"
    );
    ScanOutcome::Completed(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use parking_lot::Mutex;
    use std::fs;
    use tempfile::TempDir;

    fn make_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a").join("deep")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join("top.txt"), vec![0u8; 10]).unwrap();
        fs::write(root.join("a").join("one.txt"), vec![0u8; 20]).unwrap();
        fs::write(root.join("a").join("deep").join("two.txt"), vec![0u8; 30]).unwrap();
        dir
    }

    #[test]
    fn test_get_put() {
        let cache = FolderCache::new();
        let path = Path::new("/p");
        assert!(cache.get(path).is_none());

        cache.put(path, vec![FileItem::new("x", "/p/x", false)]);
        assert_eq!(cache.get(path).unwrap().len(), 1);

        cache.put(path, Vec::new());
        assert!(cache.get(path).unwrap().is_empty());
    }

    #[test]
    fn test_put_stats_does_not_touch_listings() {
        let cache = FolderCache::new();
        let p = Path::new("/p");
        let q = Path::new("/q");
        cache.put(p, vec![FileItem::new("x", "/p/x", false)]);
        cache.put(q, vec![FileItem::new("y", "/q/y", true)]);

        cache.put_stats(
            p,
            FolderStats {
                folders: 1,
                files: 2,
                total_bytes: 3,
            },
        );

        assert_eq!(cache.get(p).unwrap()[0].name, "x");
        assert_eq!(cache.get(q).unwrap()[0].name, "y");
        assert!(cache.get_stats(q).is_none());
        assert_eq!(cache.get_stats(p).unwrap().files, 2);
    }

    #[test]
    fn test_compute_stats() {
        let dir = make_tree();
        let stats = compute_stats(dir.path(), EnumerateOptions::default(), &CancellationToken::new())
            .completed()
            .unwrap();

        assert_eq!(stats.folders, 2);
        assert_eq!(stats.files, 3);
        assert_eq!(stats.total_bytes, 60);
    }

    #[test]
    fn test_compute_stats_cancelled() {
        let dir = make_tree();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(compute_stats(dir.path(), EnumerateOptions::default(), &cancel).is_cancelled());
    }

    #[test]
    fn test_stats_or_compute_caches() {
        let dir = make_tree();
        let cache = FolderCache::new();
        let cancel = CancellationToken::new();

        let first = cache.stats_or_compute(dir.path(), EnumerateOptions::default(), &cancel);
        assert_eq!(cache.stats_len(), 1);

        fs::write(dir.path().join("later.txt"), b"x").unwrap();
        let second = cache.stats_or_compute(dir.path(), EnumerateOptions::default(), &cancel);
        assert_eq!(first, second);
    }

    #[test]
    fn test_stats_or_compute_missing_folder_not_cached() {
        let dir = TempDir::new().unwrap();
        let cache = FolderCache::new();
        let missing = dir.path().join("missing");

        let stats = cache
            .stats_or_compute(&missing, EnumerateOptions::default(), &CancellationToken::new())
            .completed()
            .unwrap();
        assert_eq!(stats, FolderStats::default());
        assert_eq!(cache.stats_len(), 0);
    }

    #[test]
    fn test_list_and_refresh() {
        let dir = make_tree();
        let cache = FolderCache::new();
        let opts = EnumerateOptions::default();

        assert_eq!(cache.list(dir.path(), opts).unwrap().len(), 3);

        fs::write(dir.path().join("new.txt"), b"x").unwrap();
        assert_eq!(cache.list(dir.path(), opts).unwrap().len(), 3);
        assert_eq!(cache.refresh(dir.path(), opts).unwrap().len(), 4);
        assert_eq!(cache.get(dir.path()).unwrap().len(), 4);

        assert!(cache.list(&dir.path().join("missing"), opts).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_filter() {
        let dir = make_tree();
        let cache = FolderCache::new();
        let _ = cache.list(dir.path(), EnumerateOptions::default());

        let found = cache.filter(dir.path(), "TOP");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "top.txt");
        assert!(cache.filter(Path::new("/not/cached"), "top").is_empty());
    }

    #[test]
    fn test_precache_all() {
        let dir = make_tree();
        let cache = FolderCache::new();
        let reports = Mutex::new(Vec::new());
        let sink = |p: f64| reports.lock().push(p);

        let cached = cache
            .precache_all(
                dir.path(),
                EnumerateOptions::default(),
                &sink,
                &CancellationToken::new(),
            )
            .completed()
            .unwrap();

        assert_eq!(cached, 4);
        assert!(cache.get(&dir.path().join("a").join("deep")).is_some());
        let reports = reports.lock();
        assert!(reports.iter().all(|p| *p <= 100.0));
        assert_eq!(reports.last(), Some(&100.0));
    }

    #[test]
    fn test_precache_cancelled_keeps_existing_entries() {
        let dir = make_tree();
        let cache = FolderCache::new();
        cache.put(dir.path().join("b"), Vec::new());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = cache.precache_all(dir.path(), EnumerateOptions::default(), &NoProgress, &cancel);

        assert!(outcome.is_cancelled());
        assert!(cache.get(&dir.path().join("b")).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_precache_cancelled_mid_walk_keeps_cached_folders() {
        let dir = make_tree();
        let cache = FolderCache::new();
        let cancel = CancellationToken::new();
        let sink = |_: f64| cancel.cancel();

        let outcome = cache.precache_all(dir.path(), EnumerateOptions::default(), &sink, &cancel);

        assert!(outcome.is_cancelled());
        // The root and the first child folder were cached before the stop.
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(dir.path()).unwrap().len(), 3);
        assert!(cache.get(&dir.path().join("a").join("deep")).is_none());
    }

    #[test]
    fn test_cached_stats_match_disk_walk() {
        let dir = make_tree();
        let cache = FolderCache::new();
        assert!(cache.cached_stats(dir.path()).is_none());

        let _ = cache.precache_all(
            dir.path(),
            EnumerateOptions::default(),
            &NoProgress,
            &CancellationToken::new(),
        );

        let from_cache = cache.cached_stats(dir.path()).unwrap();
        let from_disk = compute_stats(dir.path(), EnumerateOptions::default(), &CancellationToken::new());
        assert_eq!(ScanOutcome::Completed(from_cache), from_disk);
        assert_eq!(from_cache.files, 3);
        assert_eq!(from_cache.total_bytes, 60);

        let a = cache.cached_stats(&dir.path().join("a")).unwrap();
        assert_eq!((a.folders, a.files, a.total_bytes), (1, 2, 50));
    }

    #[test]
    fn test_cached_stats_skip_uncached_subfolders() {
        let dir = make_tree();
        let cache = FolderCache::new();
        cache.list(dir.path(), EnumerateOptions::default());

        let stats = cache.cached_stats(dir.path()).unwrap();
        assert_eq!((stats.folders, stats.files, stats.total_bytes), (2, 1, 10));
    }

    #[test]
    fn test_clear() {
        let cache = FolderCache::new();
        cache.put("/p", Vec::new());
        cache.put_stats("/p", FolderStats::default());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats_len(), 0);
    }
}
