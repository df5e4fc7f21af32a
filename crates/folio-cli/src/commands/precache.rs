//! Precache command - walk a tree and report what a warm cache holds.
//!
//! The folder cache lives in memory, so the walk only benefits this run.
//! What it leaves behind is the per-folder breakdown printed at the end.

use super::progress_sink;
use crate::app::App;
use folio_core::{CancellationToken, Config, FolderCache, FolderStats, ScanOutcome};
use std::path::Path;
use std::time::Instant;

/// Run the precache command.
pub fn run(config: Config, dir: &Path, quiet: bool) -> anyhow::Result<()> {
    let app = App::new(config)?;

    if !dir.is_dir() {
        anyhow::bail!("{} is not a folder", dir.display());
    }

    if !quiet {
        println!("Walking {}...", dir.display());
    }

    let start = Instant::now();
    let sink = progress_sink("precache", quiet);
    let outcome = app.cache.precache_all(
        dir,
        app.config.enumerate_options(),
        sink.as_ref(),
        &CancellationToken::new(),
    );
    if !quiet {
        eprintln!();
    }

    let folders = match outcome {
        ScanOutcome::Completed(folders) => folders,
        ScanOutcome::Cancelled => {
            println!("Pre-cache cancelled.");
            return Ok(());
        }
    };
    if quiet {
        return Ok(());
    }

    println!();
    println!("{:<40} {:>8} {:>10} {:>14}", "Folder", "Folders", "Files", "Bytes");
    for (name, stats) in top_level_stats(&app.cache, dir) {
        println!(
            "{:<40} {:>8} {:>10} {:>14}",
            name, stats.folders, stats.files, stats.total_bytes
        );
    }

    println!();
    println!("Pre-cache complete!");
    println!("  Folders:     {}", folders);
    if let Some(total) = app.cache.cached_stats(dir) {
        println!("  Files:       {}", total.files);
        println!("  Total size:  {:.3} GiB", total.total_gib());
    }
    println!("  Time:        {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}

/// Totals for each immediate child folder of `dir`, read from the cache.
fn top_level_stats(cache: &FolderCache, dir: &Path) -> Vec<(String, FolderStats)> {
    let Some(listing) = cache.get(dir) else {
        return Vec::new();
    };
    let mut rows: Vec<_> = listing
        .iter()
        .filter(|item| item.is_dir)
        .filter_map(|item| Some((item.name.clone(), cache.cached_stats(&item.path)?)))
        .collect();
    rows.sort_by_key(|(name, _)| name.to_lowercase());
    rows
}
