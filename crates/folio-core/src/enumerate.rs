//! Lazy directory enumeration.
//!
//! [`enumerate`] lists the immediate children of one folder as an iterator
//! backed directly by the OS directory cursor, so the first entry is
//! available before the rest of the folder has been read. It never builds a
//! path tree and keeps no state between calls.
//!
//! ## Failure behaviour
//!
//! - A folder that cannot be opened yields an empty sequence.
//! - An error while advancing the cursor (permission revoked, folder removed)
//!   ends the sequence; entries already yielded stay valid.
//! - An entry whose type cannot be read is skipped.
//!
//! ## Hidden entries
//!
//! One policy applies to every caller: hidden and system entries are skipped
//! unless [`EnumerateOptions::include_hidden`] is set. On Unix an entry is
//! hidden when its name starts with a dot; on Windows when it carries the
//! HIDDEN or SYSTEM attribute.
//!
//! Symbolic links are reported with the type of the link itself, so a link
//! to a folder is listed as a file and never followed.

use crate::types::FileItem;
use chrono::{DateTime, Utc};
use std::fs::{self, DirEntry, Metadata, ReadDir};
use std::path::Path;
use tracing::debug;

/// Options shared by every enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerateOptions {
    /// Yield hidden and system entries too
    pub include_hidden: bool,
}

impl EnumerateOptions {
    /// Options that also yield hidden and system entries.
    pub fn with_hidden() -> Self {
        EnumerateOptions {
            include_hidden: true,
        }
    }
}

/// Enumerate the immediate children of `path`.
pub fn enumerate(path: impl AsRef<Path>, options: EnumerateOptions) -> Entries {
    let path = path.as_ref();
    let inner = match fs::read_dir(path) {
        Ok(reader) => Some(reader),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Cannot open folder");
            None
        }
    };
    Entries {
        opened: inner.is_some(),
        inner,
        options,
    }
}

/// Iterator over the children of one folder. See [`enumerate`].
pub struct Entries {
    inner: Option<ReadDir>,
    opened: bool,
    options: EnumerateOptions,
}

impl Entries {
    /// True if the folder itself could be opened.
    ///
    /// Lets callers tell an empty folder from an inaccessible one.
    pub fn is_opened(&self) -> bool {
        self.opened
    }

    fn convert(&self, entry: DirEntry) -> Option<FileItem> {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == "." || name == ".." {
            return None;
        }

        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                return None;
            }
        };
        let metadata = entry.metadata().ok();

        if !self.options.include_hidden && is_hidden(&name, metadata.as_ref()) {
            return None;
        }

        let is_dir = file_type.is_dir();
        let mut item = FileItem::new(name, entry.path(), is_dir);
        if let Some(meta) = metadata {
            if !is_dir {
                item = item.with_size(meta.len());
            }
            if let Ok(modified) = meta.modified() {
                item = item.with_modified(DateTime::<Utc>::from(modified));
            }
        }
        Some(item)
    }
}

impl Iterator for Entries {
    type Item = FileItem;

    fn next(&mut self) -> Option<FileItem> {
        loop {
            let next = self.inner.as_mut()?.next();
            match next {
                None => {
                    self.inner = None;
                    return None;
                }
                Some(Err(e)) => {
                    debug!(error = %e, "Folder enumeration stopped early");
                    self.inner = None;
                    return None;
                }
                Some(Ok(entry)) => {
                    if let Some(item) = self.convert(entry) {
                        return Some(item);
                    }
                }
            }
        }
    }
}

#[cfg(windows)]
fn is_hidden(_name: &str, metadata: Option<&Metadata>) -> bool {
    use std::os::windows::fs::MetadataExt;

    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;

    metadata
        .map(|m| m.file_attributes() & (FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM) != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn is_hidden(name: &str, _metadata: Option<&Metadata>) -> bool {
    name.starts_with('.')
}
