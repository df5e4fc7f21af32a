//! Text extraction for content indexing.
//!
//! [`ContentExtractor::extract_text`] returns the searchable text of one file
//! and never fails: a missing, empty, oversized, unreadable or unsupported
//! file yields an empty string. It runs synchronously inside the index
//! builder's scan loop and does no background work of its own.
//!
//! Supported content:
//!
//! - Plain-text formats (`txt`, `csv`, `log`, ... and extensionless files):
//!   decoded as UTF-8, or UTF-16 when a byte-order mark says so, then
//!   re-joined line by line with `\n`.
//! - PDF: text of each page in order, pages separated by a space.

use crate::config::IndexConfig;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Kind of content a file holds, decided from its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Read verbatim as text
    Text,
    /// Extracted page by page
    Pdf,
    /// Nothing to extract
    Unsupported,
}

/// Extracts searchable text from files.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    max_bytes: u64,
    text_extensions: Vec<String>,
    extract_pdf: bool,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        ContentExtractor::from_config(&IndexConfig::default())
    }
}

impl ContentExtractor {
    /// Files larger than this are never read (100 MiB).
    pub const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;

    pub fn new() -> Self {
        Self::default()
    }

    /// Build an extractor from the `[index]` configuration section.
    pub fn from_config(config: &IndexConfig) -> Self {
        ContentExtractor {
            max_bytes: config.max_content_bytes,
            text_extensions: config
                .text_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            extract_pdf: config.extract_pdf,
        }
    }

    /// Set the size ceiling in bytes
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Classify a path by its extension.
    pub fn kind(&self, path: &Path) -> ContentKind {
        let ext = match path.extension() {
            None => return ContentKind::Text,
            Some(ext) => ext.to_string_lossy().to_lowercase(),
        };
        if ext == "pdf" {
            return if self.extract_pdf {
                ContentKind::Pdf
            } else {
                ContentKind::Unsupported
            };
        }
        if self.text_extensions.iter().any(|e| *e == ext) {
            ContentKind::Text
        } else {
            ContentKind::Unsupported
        }
    }

    /// Return the extractable text of `path`, or an empty string.
    pub fn extract_text(&self, path: &Path) -> String {
        let kind = self.kind(path);
        if kind == ContentKind::Unsupported {
            return String::new();
        }

        let len = match fs::metadata(path) {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return String::new(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cannot stat file for extraction");
                return String::new();
            }
        };
        if len == 0 || len > self.max_bytes {
            return String::new();
        }

        match kind {
            ContentKind::Text => read_text_file(path),
            ContentKind::Pdf => read_pdf_file(path),
            ContentKind::Unsupported => String::new(),
        }
    }
}

fn read_text_file(path: &Path) -> String {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Cannot read text file");
            return String::new();
        }
    };

    let decoded = decode_text(&bytes);
    let mut out = String::with_capacity(decoded.len() + 1);
    for line in decoded.lines() {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Decode bytes as text, honouring a UTF-8 or UTF-16 byte-order mark.
/// Invalid sequences are replaced rather than rejected.
fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn read_pdf_file(path: &Path) -> String {
    // pdf-extract panics on some malformed documents instead of erroring.
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_by_pages(path));

    let pages = match result {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            debug!(path = %path.display(), error = %e, "PDF text extraction failed");
            return String::new();
        }
        Err(_) => {
            warn!(path = %path.display(), "PDF extractor panicked, skipping content");
            return String::new();
        }
    };

    join_pages(&pages)
}

/// Page texts joined by spaces; empty when no page has any visible text.
fn join_pages(pages: &[String]) -> String {
    let mut out = String::new();
    for page in pages {
        out.push_str(page);
        out.push(' ');
    }
    if out.trim().is_empty() {
        return String::new();
    }
    out
}
