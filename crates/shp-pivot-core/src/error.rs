// crates/shp-pivot-core/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between receiving archive bytes and handing
/// back a [`RecordSet`](crate::RecordSet).
///
/// "No `.shp` in the archive" is not an error; see
/// [`LoadOutcome::NotFound`](crate::LoadOutcome::NotFound).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsafe entry path in archive: {0}")]
    UnsafeEntry(String),

    #[error("Archive exceeds {limit}: {actual} > {max}")]
    ArchiveTooLarge {
        limit: &'static str,
        actual: u64,
        max: u64,
    },

    #[error("Multiple .shp files found, cannot choose between: {}", display_paths(.0))]
    AmbiguousDescriptor(Vec<PathBuf>),

    #[error("Missing companion file {extension} for {descriptor}")]
    MissingCompanion {
        descriptor: PathBuf,
        extension: &'static str,
    },

    #[error("Invalid data in {file}: {reason}")]
    InvalidData { file: PathBuf, reason: String },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used for user-facing status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The upload could not be read or unpacked.
    Archive,
    /// The shapefile bundle was found but could not be decoded.
    Parse,
    /// More than one descriptor and the policy refuses to guess.
    Ambiguous,
    /// Snapshot store or configuration failure.
    Internal,
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::Archive(_)
            | LoadError::Io(_)
            | LoadError::UnsafeEntry(_)
            | LoadError::ArchiveTooLarge { .. } => ErrorKind::Archive,
            LoadError::MissingCompanion { .. } | LoadError::InvalidData { .. } => ErrorKind::Parse,
            LoadError::AmbiguousDescriptor(_) => ErrorKind::Ambiguous,
            LoadError::Snapshot(_) | LoadError::Config(_) => ErrorKind::Internal,
            #[cfg(feature = "json")]
            LoadError::Json(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid(file: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoadError::InvalidData {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, LoadError>;
