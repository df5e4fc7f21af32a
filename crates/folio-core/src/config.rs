//! Configuration management for Folio.
//!
//! This module provides configuration loading, saving, and defaults.
//! Configuration is stored in TOML format in a platform-appropriate location.

use crate::enumerate::EnumerateOptions;
use crate::error::{FolioError, Result};
use crate::extract::ContentExtractor;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure for Folio.
///
/// ## Example Configuration File (folio.toml)
///
/// ```toml
/// [general]
/// projects_root = "/srv/group-files/projects"
/// log_level = "info"
///
/// [index]
/// max_content_bytes = 104857600
/// text_extensions = ["txt", "csv", "log"]
/// extract_pdf = true
///
/// [browse]
/// show_hidden = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Search index settings
    pub index: IndexConfig,

    /// Folder browsing settings
    pub browse: BrowseConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Folder whose immediate children are the projects
    pub projects_root: Option<PathBuf>,

    /// Data file location (None = default location)
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            projects_root: None,
            data_dir: None,
            log_level: "info".to_string(),
        }
    }
}

/// Search index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Files larger than this are not content-indexed
    pub max_content_bytes: u64,

    /// Extensions read as plain text (extensionless files always are)
    pub text_extensions: Vec<String>,

    /// Extract text from PDF files
    pub extract_pdf: bool,

    /// Compress the persisted snapshot
    pub compress_snapshot: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            max_content_bytes: ContentExtractor::DEFAULT_MAX_BYTES,
            text_extensions: ["txt", "csv", "log", "prg", "p-2", "files"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extract_pdf: true,
            compress_snapshot: true,
        }
    }
}

/// Browsing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    /// Show hidden and system entries. Applies to listings, pre-cache,
    /// statistics, project discovery and index rebuilds alike.
    pub show_hidden: bool,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| FolioError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
        })?;

        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Saving configuration");
        let contents = toml::to_string_pretty(self)
            .map_err(|e| FolioError::serialization(format!("config: {}", e)))?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("folio.toml"))
    }

    /// Get the default data directory path.
    pub fn default_data_dir() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Get the data directory (from config or default).
    pub fn data_dir(&self) -> Result<PathBuf> {
        match self.general.data_dir {
            Some(ref path) => Ok(path.clone()),
            None => Self::default_data_dir(),
        }
    }

    /// Enumeration options implied by the browse policy.
    pub fn enumerate_options(&self) -> EnumerateOptions {
        EnumerateOptions {
            include_hidden: self.browse.show_hidden,
        }
    }

    /// Content extractor configured from the `[index]` section.
    pub fn extractor(&self) -> ContentExtractor {
        ContentExtractor::from_config(&self.index)
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "folio").ok_or_else(|| FolioError::ConfigError {
        reason: "Could not determine config directory".to_string(),
    })
}
