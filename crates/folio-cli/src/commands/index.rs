//! Index command - build or rebuild the search index.

use super::progress_sink;
use crate::app::App;
use folio_core::{Config, RebuildEvent, ScanOutcome};
use std::path::PathBuf;
use std::time::Instant;

/// Run the index command.
///
/// A root with no projects still rebuilds, replacing any stale snapshot
/// with an empty one.
pub fn run(config: Config, root: Option<PathBuf>, quiet: bool) -> anyhow::Result<()> {
    let mut app = App::new(config)?;
    let projects = app.projects(root.as_deref())?;

    if !quiet {
        if projects.is_empty() {
            println!("No projects found. Publishing an empty index.");
        } else {
            println!("Indexing {} projects...", projects.len());
        }
        if !app.content_paths.is_empty() {
            println!(
                "Content indexing enabled for {} path(s)",
                app.content_paths.list().len()
            );
        }
        println!();
    }

    let start = Instant::now();
    let request = app.rebuild_request(projects);
    let handle = app.index.spawn_rebuild(request)?;
    let sink = progress_sink("index", quiet);

    for event in handle.progress().iter() {
        match event {
            RebuildEvent::Progress(percent) => sink.report(percent),
            RebuildEvent::Finished(_) => break,
        }
    }
    if !quiet {
        eprintln!();
    }

    let stats = match handle.join() {
        ScanOutcome::Completed(stats) => stats,
        ScanOutcome::Cancelled => {
            println!("Indexing cancelled. The previous index is unchanged.");
            return Ok(());
        }
    };
    if quiet {
        return Ok(());
    }
    let elapsed = start.elapsed();

    println!();
    println!("Indexing complete!");
    println!("  Documents:   {}", stats.documents);
    println!("  Folders:     {}", stats.folders);
    println!("  Files:       {}", stats.files);
    println!("  Tokens:      {}", stats.tokens);
    println!("  Projects:    {}", stats.projects);
    println!("  Time:        {:.2}s", elapsed.as_secs_f64());
    println!(
        "  Rate:        {:.0} entries/sec",
        stats.documents as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    Ok(())
}
