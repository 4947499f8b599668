// crates/shp-pivot-core/src/loader/snapshot.rs

//! On-disk copies of parsed record sets, so a restarted process does not
//! re-extract and re-parse an archive it has already seen.

use super::cache::CacheKey;
use crate::error::{LoadError, Result};
use crate::model::RecordSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "compact")]
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

/// Directory of bincode snapshots, one file per [`CacheKey`].
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Returns the stored record set, or `None` when absent or unreadable.
    ///
    /// A corrupt snapshot is removed so the next write replaces it.
    pub fn read(&self, key: &CacheKey) -> Option<RecordSet> {
        let path = self.path_for(key);
        let file = File::open(&path).ok()?;
        match decode(BufReader::new(file)) {
            Ok(rs) => Some(rs),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable snapshot");
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Writes atomically: a temp file in the same directory is renamed over
    /// the final name once fully flushed.
    pub fn write(&self, key: &CacheKey, rs: &RecordSet) -> Result<()> {
        let tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let writer = BufWriter::new(tmp.as_file());
            encode(writer, rs)?;
        }
        tmp.persist(self.path_for(key)).map_err(|e| LoadError::Io(e.error))?;
        Ok(())
    }
}

fn encode<W: Write>(writer: W, rs: &RecordSet) -> Result<()> {
    #[cfg(feature = "compact")]
    let mut encoder = GzEncoder::new(writer, Compression::default());
    #[cfg(not(feature = "compact"))]
    let mut encoder = writer;

    bincode::serialize_into(&mut encoder, rs)?;
    encoder.flush()?;
    #[cfg(feature = "compact")]
    encoder.finish()?.flush()?;
    Ok(())
}

fn decode<R: Read>(reader: R) -> Result<RecordSet> {
    #[cfg(feature = "compact")]
    let reader = GzDecoder::new(reader);

    Ok(bincode::deserialize_from(reader)?)
}
