//! Query command - search for files and folders.

use crate::app::App;
use crate::OutputFormat;
use folio_core::{sort_for_display, Config};
use std::time::Instant;

/// Run the query command.
pub fn run(config: Config, query: &str, limit: usize, output: OutputFormat) -> anyhow::Result<()> {
    let app = App::new(config)?;

    if !app.index.is_ready() {
        eprintln!("Index is empty. Run 'folio index' first.");
        return Ok(());
    }

    let start = Instant::now();
    let mut results = app.index.search_limited(query, limit);
    let elapsed = start.elapsed();
    sort_for_display(&mut results);

    match output {
        OutputFormat::Text => {
            for doc in &results {
                let type_indicator = if doc.is_dir { "📁" } else { "📄" };
                println!("{} {}  [{}]", type_indicator, doc.path, doc.project);
            }

            eprintln!();
            eprintln!(
                "Found {} results in {:.3}ms",
                results.len(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
