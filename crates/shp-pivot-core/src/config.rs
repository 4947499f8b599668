// crates/shp-pivot-core/src/config.rs

//! # Configuration
//!
//! All sections are optional in the TOML file; anything omitted falls back
//! to the defaults below.
//!
//! ```toml
//! [loader]
//! preview_rows = 5
//! descriptor_policy = "reject-ambiguous"
//!
//! [cache]
//! capacity = 8
//! snapshot_dir = "/var/cache/shp-pivot"
//!
//! [widget]
//! max_cells = 2000000
//! spec_path = "gw_config.json"
//!
//! [server]
//! addr = "127.0.0.1:8501"
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted when no explicit config path is given.
pub const CONFIG_ENV: &str = "SHP_PIVOT_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub loader: LoaderConfig,
    pub cache: CacheConfig,
    pub widget: WidgetConfig,
    pub server: ServerConfig,
}

/// What to do when an archive holds more than one `.shp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptorPolicy {
    /// Take the first candidate in lexicographic path order.
    #[default]
    First,
    /// Refuse to guess and report every candidate.
    RejectAmbiguous,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Rows shown in the preview table.
    pub preview_rows: usize,
    pub descriptor_policy: DescriptorPolicy,
    /// Parent directory for scratch extraction; system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
    pub max_archive_bytes: u64,
    pub max_entries: usize,
    pub max_extracted_bytes: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            descriptor_policy: DescriptorPolicy::First,
            scratch_dir: None,
            max_archive_bytes: 1 << 30,
            max_entries: 10_000,
            max_extracted_bytes: 4 << 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of load outcomes kept in memory. `0` disables the cache.
    pub capacity: usize,
    /// Directory for bincode snapshots of parsed record sets.
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            snapshot_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Upper bound on rows × columns handed to the pivot widget.
    pub max_cells: usize,
    /// Where the widget persists its view configuration.
    pub spec_path: PathBuf,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            max_cells: 5_000_000,
            spec_path: PathBuf::from("gw_config.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Upload body limit for the HTTP surface.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8501".to_string(),
            max_upload_bytes: 1 << 30,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// **Resolve:** explicit path, then `SHP_PIVOT_CONFIG`, then defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load_from_path(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }
}
