//! Whole-system checks: crawl real trees, query, rebuild under load, reload.

use folio_core::{
    discover_projects, sort_for_display, CancellationToken, ContentPaths, EnumerateOptions,
    IndexState, NoProgress, Project, RebuildEvent, RebuildRequest, ScanOutcome, SearchIndex,
    SnapshotStore,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("folio_core=debug")
        .with_test_writer()
        .try_init();
}

fn touch(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Alpha: Invoice_2024.pdf, readme.txt. Beta: Invoice_Draft.docx.
fn alpha_beta() -> TempDir {
    let dir = TempDir::new().unwrap();
    touch(&dir.path().join("Alpha").join("Invoice_2024.pdf"), "");
    touch(&dir.path().join("Alpha").join("readme.txt"), "torque values for flange");
    touch(&dir.path().join("Beta").join("Invoice_Draft.docx"), "");
    dir
}

fn names(index: &SearchIndex, query: &str) -> BTreeSet<String> {
    index.search(query).into_iter().map(|d| d.name).collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn rebuild(index: &SearchIndex, request: &RebuildRequest) {
    let outcome = index
        .rebuild(request, &NoProgress, &CancellationToken::new())
        .unwrap();
    assert!(!outcome.is_cancelled());
}

#[test]
fn alpha_beta_scenario() {
    init_tracing();
    let root = alpha_beta();
    let projects = discover_projects(root.path(), EnumerateOptions::default());
    assert_eq!(projects.len(), 2);

    let index = SearchIndex::new();
    rebuild(&index, &RebuildRequest::new(projects));

    assert_eq!(
        names(&index, "invoice"),
        set(&["Invoice_2024.pdf", "Invoice_Draft.docx"])
    );
    assert_eq!(names(&index, "2024"), set(&["Invoice_2024.pdf"]));
    assert!(names(&index, "xyz").is_empty());

    let alpha_hit = index.search("2024");
    assert_eq!(alpha_hit[0].project, "Alpha");
}

#[test]
fn results_sort_for_display() {
    let root = TempDir::new().unwrap();
    touch(&root.path().join("P").join("plan_b.pdf"), "");
    touch(&root.path().join("P").join("Plan_A.pdf"), "");
    fs::create_dir_all(root.path().join("P").join("plans")).unwrap();

    let index = SearchIndex::new();
    rebuild(
        &index,
        &RebuildRequest::new(vec![Project::new("P", root.path().join("P"))]),
    );

    let mut found = index.search("plan");
    sort_for_display(&mut found);
    let ordered: Vec<_> = found.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(ordered, vec!["plans", "Plan_A.pdf", "plan_b.pdf"]);
}

#[test]
fn rebuild_is_idempotent() {
    let root = alpha_beta();
    let projects = discover_projects(root.path(), EnumerateOptions::default());
    let request = RebuildRequest::new(projects);

    let index = SearchIndex::new();
    rebuild(&index, &request);
    let first: Vec<_> = ["invoice", "2024", "read", "inv dra", "beta"]
        .iter()
        .map(|q| names(&index, q))
        .collect();

    rebuild(&index, &request);
    let second: Vec<_> = ["invoice", "2024", "read", "inv dra", "beta"]
        .iter()
        .map(|q| names(&index, q))
        .collect();

    assert_eq!(first, second);
}

#[test]
fn content_paths_drive_content_indexing() {
    let root = alpha_beta();
    let data = TempDir::new().unwrap();

    let mut paths = ContentPaths::load(data.path().join(ContentPaths::FILE_NAME));
    paths
        .add(root.path().join("Alpha").to_string_lossy().into_owned())
        .unwrap();

    let projects = discover_projects(root.path(), EnumerateOptions::default());
    let request =
        RebuildRequest::new(projects).with_content_prefixes(paths.list().to_vec());

    let index = SearchIndex::new();
    rebuild(&index, &request);

    assert_eq!(names(&index, "flange torque"), set(&["readme.txt"]));
    assert!(names(&index, "flange invoice").is_empty());
}

#[test]
fn cancelled_rebuild_leaves_previous_results() {
    let root = alpha_beta();
    let projects = discover_projects(root.path(), EnumerateOptions::default());

    let index = SearchIndex::new();
    rebuild(&index, &RebuildRequest::new(projects.clone()));
    let before = names(&index, "invoice");

    touch(&root.path().join("Beta").join("Invoice_Final.pdf"), "");

    // Alpha completes, then the scan is stopped before Beta is crawled.
    let cancel = CancellationToken::new();
    let stop_after_first_project = |_: f64| cancel.cancel();
    let outcome = index
        .rebuild(&RebuildRequest::new(projects), &stop_after_first_project, &cancel)
        .unwrap();

    assert_eq!(outcome, ScanOutcome::Cancelled);
    assert_eq!(names(&index, "invoice"), before);
    assert!(names(&index, "final").is_empty());
}

#[test]
fn cancelled_first_rebuild_leaves_index_empty() {
    let root = alpha_beta();
    let projects = discover_projects(root.path(), EnumerateOptions::default());

    let index = SearchIndex::new();
    let cancel = CancellationToken::new();
    let stop_after_first_project = |_: f64| cancel.cancel();
    let outcome = index
        .rebuild(&RebuildRequest::new(projects), &stop_after_first_project, &cancel)
        .unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(index.state(), IndexState::Empty);
    assert!(names(&index, "invoice").is_empty());
}

#[test]
fn cancelled_background_rebuild_reports_cancelled() {
    let root = TempDir::new().unwrap();
    let mut projects = Vec::new();
    for p in 0..20 {
        let dir = root.path().join(format!("project_{:02}", p));
        for f in 0..50 {
            touch(&dir.join(format!("sub_{}", f % 5)).join(format!("file_{}.txt", f)), "");
        }
        projects.push(Project::new(format!("project_{:02}", p), dir));
    }

    let index = Arc::new(SearchIndex::new());
    let handle = index.spawn_rebuild(RebuildRequest::new(projects)).unwrap();
    handle.cancel();

    let finished = handle
        .progress()
        .iter()
        .find_map(|e| match e {
            RebuildEvent::Finished(outcome) => Some(outcome),
            RebuildEvent::Progress(_) => None,
        })
        .unwrap();
    let joined = handle.join();

    assert_eq!(finished, joined);
    // Either way the published state matches the outcome exactly.
    match joined {
        ScanOutcome::Cancelled => {
            assert_eq!(index.state(), IndexState::Empty);
            assert!(index.search("file").is_empty());
        }
        ScanOutcome::Completed(stats) => {
            assert_eq!(stats.documents, 20 * (5 + 50));
            assert_eq!(index.search("file").len(), 20 * 50);
        }
    }
}

#[test]
fn concurrent_readers_see_whole_snapshots() {
    init_tracing();
    let root = TempDir::new().unwrap();
    for i in 0..40 {
        touch(&root.path().join("Small").join(format!("report_{}.txt", i)), "");
    }
    for i in 0..120 {
        touch(
            &root.path().join("Large").join(format!("d{}", i % 6)).join(format!("report_{}.txt", i)),
            "",
        );
    }

    let small = RebuildRequest::new(vec![Project::new("Small", root.path().join("Small"))]);
    let large = RebuildRequest::new(vec![Project::new("Large", root.path().join("Large"))]);

    let index = Arc::new(SearchIndex::new());
    rebuild(&index, &small);

    let stop = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut observed = 0usize;
                loop {
                    let found = index.search("report");
                    let projects: BTreeSet<_> = found.iter().map(|d| d.project.clone()).collect();
                    assert_eq!(projects.len(), 1, "results mixed two snapshots");
                    match projects.iter().next().map(String::as_str) {
                        Some("Small") => assert_eq!(found.len(), 40),
                        Some("Large") => assert_eq!(found.len(), 120),
                        other => panic!("unexpected project {:?}", other),
                    }
                    observed += 1;
                    if stop.load(Ordering::Acquire) {
                        break;
                    }
                }
                observed
            })
        })
        .collect();

    for round in 0..10 {
        let request = if round % 2 == 0 { &large } else { &small };
        rebuild(&index, request);
    }

    stop.store(true, Ordering::Release);
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
}

#[test]
fn persisted_snapshot_survives_restart() {
    let root = alpha_beta();
    let data = TempDir::new().unwrap();
    let projects = discover_projects(root.path(), EnumerateOptions::default());

    {
        let index = SearchIndex::with_store(SnapshotStore::new(data.path()));
        rebuild(&index, &RebuildRequest::new(projects));
    }

    let index = SearchIndex::with_store(SnapshotStore::new(data.path()));
    assert_eq!(index.state(), IndexState::Empty);
    assert!(index.load_from_disk());
    assert_eq!(index.state(), IndexState::Ready);
    assert_eq!(
        names(&index, "invoice"),
        set(&["Invoice_2024.pdf", "Invoice_Draft.docx"])
    );
}
