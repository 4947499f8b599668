// crates/shp-pivot-core/src/archive.rs

//! # Archive extraction
//!
//! Unpacks an uploaded zip into a [`ScratchDir`] that lives exactly as long
//! as the load that created it.

use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tempfile::TempDir;
use zip::ZipArchive;

/// A uniquely named extraction directory, removed when dropped.
///
/// Removal happens on every exit path of the owning scope, including early
/// `?` returns and unwinding.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Creates the directory under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("shp-pivot-");
        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        tracing::debug!(path = %dir.path().display(), "allocated scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        tracing::debug!(path = %self.dir.path().display(), "releasing scratch directory");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub bytes: u64,
}

/// Decompresses every entry of `bytes` into `dest`, preserving relative
/// paths.
///
/// Entries that would land outside `dest` are rejected rather than skipped,
/// and the configured size limits are enforced against the bytes actually
/// written, not the sizes the archive claims.
pub fn extract(bytes: &[u8], dest: &Path, limits: &LoaderConfig) -> Result<ExtractSummary> {
    let archive_len = bytes.len() as u64;
    if archive_len > limits.max_archive_bytes {
        return Err(LoadError::ArchiveTooLarge {
            limit: "max_archive_bytes",
            actual: archive_len,
            max: limits.max_archive_bytes,
        });
    }

    let mut archive = ZipArchive::new(io::Cursor::new(bytes))?;
    if archive.len() > limits.max_entries {
        return Err(LoadError::ArchiveTooLarge {
            limit: "max_entries",
            actual: archive.len() as u64,
            max: limits.max_entries as u64,
        });
    }

    let mut summary = ExtractSummary::default();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let rel = entry
            .enclosed_name()
            .ok_or_else(|| LoadError::UnsafeEntry(entry.name().to_string()))?;
        let out = dest.join(&rel);

        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }

        let budget = limits.max_extracted_bytes.saturating_sub(summary.bytes);
        let mut file = File::create(&out)?;
        let written = io::copy(&mut (&mut entry).take(budget.saturating_add(1)), &mut file)?;
        if written > budget {
            return Err(LoadError::ArchiveTooLarge {
                limit: "max_extracted_bytes",
                actual: summary.bytes + written,
                max: limits.max_extracted_bytes,
            });
        }
        summary.bytes += written;
        summary.files += 1;
    }

    tracing::debug!(
        files = summary.files,
        bytes = summary.bytes,
        dest = %dest.display(),
        "archive extracted"
    );
    Ok(summary)
}
