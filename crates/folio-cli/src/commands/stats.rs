//! Stats command - aggregate totals for a folder.

use crate::app::App;
use folio_core::{CancellationToken, Config, ScanOutcome};
use std::path::Path;
use std::time::Instant;

/// Run the stats command.
pub fn run(config: Config, dir: &Path) -> anyhow::Result<()> {
    let app = App::new(config)?;

    if !dir.is_dir() {
        anyhow::bail!("{} is not a folder", dir.display());
    }

    let start = Instant::now();
    let outcome = app.cache.stats_or_compute(
        dir,
        app.config.enumerate_options(),
        &CancellationToken::new(),
    );

    let ScanOutcome::Completed(stats) = outcome else {
        println!("Cancelled.");
        return Ok(());
    };

    println!("{}", dir.display());
    println!("  Folders:     {}", stats.folders);
    println!("  Files:       {}", stats.files);
    println!(
        "  Total size:  {} bytes ({:.3} GiB)",
        stats.total_bytes,
        stats.total_gib()
    );
    println!("  Time:        {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
