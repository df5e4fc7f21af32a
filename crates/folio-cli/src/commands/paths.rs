//! Paths command - manage content-indexed path prefixes.

use crate::app::App;
use crate::PathsAction;
use folio_core::Config;

/// Run the paths command.
pub fn run(config: Config, action: PathsAction) -> anyhow::Result<()> {
    let mut app = App::new(config)?;

    match action {
        PathsAction::List => {
            if app.content_paths.is_empty() {
                println!("No content-indexed paths.");
            }
            for prefix in app.content_paths.list() {
                println!("{}", prefix);
            }
        }
        PathsAction::Add { prefix } => {
            let covered = app.content_paths.contains_path(&prefix);
            if app.content_paths.add(prefix.as_str())? {
                println!("Added {}", prefix);
                if covered {
                    println!("Note: a broader prefix already covers this path.");
                } else {
                    println!("Run 'folio index' to index its contents.");
                }
            } else {
                println!("{} is already content-indexed.", prefix);
            }
        }
        PathsAction::Remove { prefix } => {
            if app.content_paths.remove(&prefix)? {
                println!("Removed {}", prefix);
            } else {
                println!("{} was not content-indexed.", prefix);
            }
        }
    }

    Ok(())
}
