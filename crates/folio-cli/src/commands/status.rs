//! Status command - show index status and statistics.

use crate::app::App;
use chrono::Local;
use folio_core::Config;

/// Run the status command.
pub fn run(config: Config) -> anyhow::Result<()> {
    let app = App::new(config)?;

    let stats = app.index.stats();

    println!("Folio Index Status");
    println!("==================");
    println!();
    println!("State: {}", app.index.state());
    println!();

    if !app.index.is_ready() {
        println!("Index is empty. Run 'folio index' to build the index.");
    } else {
        println!("Summary:");
        println!("  Documents:   {}", stats.documents);
        println!("  Folders:     {}", stats.folders);
        println!("  Files:       {}", stats.files);
        println!("  Tokens:      {}", stats.tokens);
        println!("  Projects:    {}", stats.projects);

        if let Some(built) = stats.built_at {
            println!(
                "  Built:       {}",
                built.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    println!();
    println!("Content-indexed paths:");
    if app.content_paths.is_empty() {
        println!("  (none)");
    }
    for prefix in app.content_paths.list() {
        println!("  {}", prefix);
    }

    println!();
    println!("Known projects: {}", app.project_list.len());
    for project in app.project_list.projects() {
        println!("  {}", project);
    }

    println!();
    match &app.config.general.projects_root {
        Some(root) => println!("Projects root:  {}", root.display()),
        None => println!("Projects root:  (not configured)"),
    }
    println!("Data directory: {}", app.data_dir.display());

    Ok(())
}
