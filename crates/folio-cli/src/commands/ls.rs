//! Ls command - list a folder, folders first.

use crate::app::App;
use crate::OutputFormat;
use chrono::{DateTime, Local, Utc};
use folio_core::{sort_for_display, Config, FileItem};
use serde::Serialize;
use std::path::Path;

/// One row of a listing, as printed in JSON output.
#[derive(Serialize)]
struct ListingRow<'a> {
    name: &'a str,
    path: String,
    #[serde(rename = "type")]
    type_label: &'a str,
    size: Option<u64>,
    modified: Option<DateTime<Utc>>,
}

impl<'a> From<&'a FileItem> for ListingRow<'a> {
    fn from(item: &'a FileItem) -> Self {
        ListingRow {
            name: &item.name,
            path: item.path.to_string_lossy().into_owned(),
            type_label: item.type_label,
            size: item.size,
            modified: item.modified,
        }
    }
}

/// Run the ls command.
pub fn run(
    config: Config,
    dir: &Path,
    filter: Option<&str>,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let app = App::new(config)?;

    let Some(listing) = app.cache.list(dir, app.config.enumerate_options()) else {
        anyhow::bail!("Cannot open folder {}", dir.display());
    };

    let mut items = match filter {
        Some(text) => app.cache.filter(dir, text),
        None => (*listing).clone(),
    };
    sort_for_display(&mut items);

    match output {
        OutputFormat::Text => {
            for item in &items {
                let modified = item
                    .modified
                    .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                let size = item.size.map(|s| s.to_string()).unwrap_or_default();
                println!(
                    "{:<6} {:>16} {:>12}  {}",
                    item.type_label, modified, size, item.name
                );
            }
            eprintln!();
            eprintln!("{} entries", items.len());
        }
        OutputFormat::Json => {
            let rows: Vec<ListingRow> = items.iter().map(ListingRow::from).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
