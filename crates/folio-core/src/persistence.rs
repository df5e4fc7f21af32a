//! Persistence layer for index snapshots.
//!
//! A snapshot is written as one file so that loading is all-or-nothing: any
//! damage anywhere in the file rejects the whole snapshot. The format is
//! designed for:
//!
//! - Fast loading: Binary format with optional compression
//! - Versioning: Format changes are detected and handled
//! - Atomic writes: Prevent corruption on crash
//! - Integrity: Checksum over the body plus structural validation
//!
//! ## Snapshot File Format
//!
//! ```text
//! [Header: 32 bytes]
//!   - Magic: "FLIX" (4 bytes)
//!   - Version: u32 (4 bytes)
//!   - Flags: u32 (4 bytes) - compression
//!   - Document count: u64 (8 bytes)
//!   - Reserved: 12 bytes
//!
//! [Body: variable]
//!   - bincode(Snapshot), LZ4-compressed when the flag is set
//!
//! [Footer: 8 bytes]
//!   - CRC32 checksum of the body: u32
//!   - Magic: "XILF" (4 bytes)
//! ```

use crate::error::{FolioError, Result};
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Magic bytes at the start of snapshot files
pub const MAGIC_HEADER: &[u8; 4] = b"FLIX";
/// Magic bytes at the end of snapshot files (reversed)
pub const MAGIC_FOOTER: &[u8; 4] = b"XILF";
/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

const HEADER_LEN: usize = 32;
const FOOTER_LEN: usize = 8;

/// Flags for snapshot file format
#[derive(Debug, Clone, Copy)]
pub struct SnapshotFlags(u32);

impl SnapshotFlags {
    /// No compression
    pub const NONE: Self = SnapshotFlags(0);
    /// LZ4 compression
    pub const COMPRESSED_LZ4: Self = SnapshotFlags(1);

    fn is_compressed(&self) -> bool {
        self.0 & 1 != 0
    }
}

/// Header structure for the snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotHeader {
    magic: [u8; 4],
    version: u32,
    flags: u32,
    document_count: u64,
    reserved: [u8; 12],
}

impl SnapshotHeader {
    fn new(document_count: u64, flags: SnapshotFlags) -> Self {
        SnapshotHeader {
            magic: *MAGIC_HEADER,
            version: SNAPSHOT_VERSION,
            flags: flags.0,
            document_count,
            reserved: [0; 12],
        }
    }

    fn validate(&self) -> Result<()> {
        if self.magic != *MAGIC_HEADER {
            return Err(FolioError::corrupted("Invalid magic bytes in header"));
        }
        if self.version != SNAPSHOT_VERSION {
            return Err(FolioError::SnapshotVersionMismatch {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }
}

/// Manages persistence of index snapshots to disk.
///
/// ## Example
///
/// ```rust,ignore
/// use folio_core::SnapshotStore;
///
/// let store = SnapshotStore::new("./data");
/// store.save(&snapshot)?;
/// let loaded = store.load()?;
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Base directory for storing snapshot files
    base_dir: PathBuf,

    /// Whether to use compression
    use_compression: bool,
}

impl SnapshotStore {
    /// Create a new SnapshotStore with the given base directory.
    ///
    /// The directory is created on first save.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        SnapshotStore {
            base_dir: base_dir.as_ref().to_path_buf(),
            use_compression: true,
        }
    }

    /// Set whether to use compression when saving.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.use_compression = compress;
        self
    }

    /// Get the path to the main snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.base_dir.join("folio.idx")
    }

    fn backup_path(&self) -> PathBuf {
        self.base_dir.join("folio.idx.bak")
    }

    fn temp_path(&self) -> PathBuf {
        self.base_dir.join("folio.idx.tmp")
    }

    /// Check if a snapshot file exists.
    pub fn exists(&self) -> bool {
        self.snapshot_path().exists()
    }

    /// Save a snapshot to disk.
    ///
    /// Uses atomic write (write to temp, then rename) to prevent corruption.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;

        let document_count = snapshot.len() as u64;
        info!(
            path = %self.snapshot_path().display(),
            documents = document_count,
            "Saving index snapshot"
        );

        let flags = if self.use_compression {
            SnapshotFlags::COMPRESSED_LZ4
        } else {
            SnapshotFlags::NONE
        };

        let raw = bincode::serialize(snapshot)?;
        let body = if flags.is_compressed() {
            lz4_flex::compress_prepend_size(&raw)
        } else {
            raw
        };

        let temp_path = self.temp_path();
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);

            let header = SnapshotHeader::new(document_count, flags);
            writer.write_all(&bincode::serialize(&header)?)?;
            writer.write_all(&body)?;

            let checksum = crc32fast::hash(&body);
            writer.write_all(&checksum.to_le_bytes())?;
            writer.write_all(MAGIC_FOOTER)?;

            writer.flush()?;
        }

        // Keep the previous snapshot as a backup
        let snapshot_path = self.snapshot_path();
        let backup_path = self.backup_path();
        if snapshot_path.exists() {
            let _ = fs::remove_file(&backup_path);
            let _ = fs::rename(&snapshot_path, &backup_path);
        }

        fs::rename(&temp_path, &snapshot_path)?;

        debug!(compressed = flags.is_compressed(), bytes = body.len(), "Snapshot saved");
        Ok(())
    }

    /// Load the snapshot from disk.
    ///
    /// Every check must pass for the snapshot to be returned; there is no
    /// partial load.
    pub fn load(&self) -> Result<Snapshot> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Err(FolioError::SnapshotNotFound { path });
        }

        info!(path = %path.display(), "Loading index snapshot");
        let bytes = fs::read(&path)?;
        let snapshot = decode(&bytes)?;

        info!(
            documents = snapshot.len(),
            tokens = snapshot.token_count(),
            "Index snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Load the snapshot, or `None` if it is missing or unusable.
    ///
    /// Logs a warning if a snapshot exists but cannot be loaded.
    pub fn load_or_none(&self) -> Option<Snapshot> {
        match self.load() {
            Ok(snapshot) => Some(snapshot),
            Err(FolioError::SnapshotNotFound { .. }) => {
                debug!("No index snapshot on disk");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to load index snapshot, ignoring it");
                None
            }
        }
    }

    /// Delete all stored snapshot data.
    pub fn clear(&self) -> Result<()> {
        for path in [self.snapshot_path(), self.backup_path(), self.temp_path()] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> Result<Snapshot> {
    if bytes.len() < HEADER_LEN + FOOTER_LEN {
        return Err(FolioError::corrupted("File too short"));
    }

    let header: SnapshotHeader = bincode::deserialize(&bytes[..HEADER_LEN])
        .map_err(|e| FolioError::corrupted(format!("Header unreadable: {}", e)))?;
    header.validate()?;
    let flags = SnapshotFlags(header.flags);

    let body = &bytes[HEADER_LEN..bytes.len() - FOOTER_LEN];
    let footer = &bytes[bytes.len() - FOOTER_LEN..];

    if &footer[4..8] != MAGIC_FOOTER {
        return Err(FolioError::corrupted("Invalid footer magic bytes"));
    }

    let stored_checksum = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let computed_checksum = crc32fast::hash(body);
    if stored_checksum != computed_checksum {
        return Err(FolioError::corrupted(format!(
            "Checksum mismatch: expected {:08x}, got {:08x}",
            stored_checksum, computed_checksum
        )));
    }

    let decompressed;
    let raw = if flags.is_compressed() {
        decompressed = lz4_flex::decompress_size_prepended(body)
            .map_err(|e| FolioError::corrupted(format!("Decompression failed: {}", e)))?;
        &decompressed[..]
    } else {
        body
    };

    let snapshot: Snapshot = bincode::deserialize(raw)
        .map_err(|e| FolioError::corrupted(format!("Deserialization failed: {}", e)))?;

    if snapshot.len() as u64 != header.document_count {
        return Err(FolioError::corrupted(format!(
            "Header says {} documents, body has {}",
            header.document_count,
            snapshot.len()
        )));
    }
    snapshot.validate()?;

    Ok(snapshot)
}
