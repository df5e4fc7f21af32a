//! Clear command - delete persisted index data.

use crate::app::store_for;
use folio_core::{Config, ContentPaths, ProjectList};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Run the clear command.
///
/// Deletes the snapshot (and its backup) along with the remembered project
/// list. With `include_paths` the content-indexed path list goes too.
pub fn run(config: Config, yes: bool, include_paths: bool) -> anyhow::Result<()> {
    let data_dir = config.data_dir()?;
    let store = store_for(&config, &data_dir);
    let paths_file = data_dir.join(ContentPaths::FILE_NAME);
    let projects_file = data_dir.join(ProjectList::FILE_NAME);

    let clear_index = store.exists() || projects_file.exists();
    let clear_paths = include_paths && paths_file.exists();
    if !clear_index && !clear_paths {
        println!("Nothing to clear in {}.", data_dir.display());
        return Ok(());
    }

    let what = match (clear_index, clear_paths) {
        (true, true) => "the search index and the content-indexed path list",
        (true, false) => "the search index",
        _ => "the content-indexed path list",
    };
    if !yes && !confirm(&format!("Delete {}?", what), io::stdin().lock())? {
        println!("Cancelled.");
        return Ok(());
    }

    if clear_index {
        store.clear()?;
        remove_file(&projects_file)?;
        println!("Removed search index from {}", data_dir.display());
    }
    if clear_paths {
        remove_file(&paths_file)?;
        println!("Removed {}", paths_file.display());
    } else if clear_index {
        println!("Content-indexed paths were kept. Use --paths to remove them too.");
    }

    Ok(())
}

/// Ask a yes/no question; anything but "y" or "yes" is a no.
fn confirm(question: &str, mut input: impl BufRead) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

fn remove_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
