// crates/shp-pivot-core/src/loader/mod.rs

//! # Archive Loader
//!
//! Turns uploaded zip bytes into a [`RecordSet`]:
//!
//! 1. extract into a fresh [`ScratchDir`],
//! 2. pick the `.shp` descriptor,
//! 3. decode it together with its siblings,
//! 4. release the scratch directory.
//!
//! [`ArchiveLoader`] adds the in-memory cache and optional snapshots on top
//! of the free [`load`] function.

use crate::archive::{self, ScratchDir};
use crate::codec::{dbf, shp, shx, Bundle, TextEncoding};
use crate::config::{AppConfig, LoaderConfig};
use crate::error::{LoadError, Result};
use crate::locate;
use crate::model::{Column, ColumnKind, RecordSet, SourceInfo, Value, GEOMETRY_COLUMN};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub mod cache;
pub mod snapshot;

pub use cache::{fingerprint, CacheKey, CacheStats, LoadCache};
pub use snapshot::SnapshotStore;

/// Result of a load that did not fail.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(Arc<RecordSet>),
    /// The archive was readable but held no `.shp`.
    NotFound,
}

impl LoadOutcome {
    pub fn record_set(&self) -> Option<&RecordSet> {
        match self {
            LoadOutcome::Loaded(rs) => Some(rs),
            LoadOutcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

/// **One-shot load** with default limits and no caching.
pub fn load(archive_bytes: &[u8], include_geometry: bool) -> Result<LoadOutcome> {
    load_uncached(
        archive_bytes,
        include_geometry,
        &LoaderConfig::default(),
        fingerprint(archive_bytes),
    )
}

/// Loader with cache and optional snapshot store.
///
/// Safe to share between threads; loads themselves never hold the cache
/// lock while extracting or parsing.
pub struct ArchiveLoader {
    config: LoaderConfig,
    cache: Mutex<LoadCache>,
    snapshots: Option<SnapshotStore>,
}

impl ArchiveLoader {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let snapshots = config
            .cache
            .snapshot_dir
            .as_ref()
            .map(SnapshotStore::open)
            .transpose()?;
        Ok(Self {
            config: config.loader.clone(),
            cache: Mutex::new(LoadCache::new(config.cache.capacity)),
            snapshots,
        })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    /// Forget everything cached for these archive bytes.
    pub fn invalidate(&self, archive_bytes: &[u8]) {
        self.lock_cache().invalidate(&fingerprint(archive_bytes));
    }

    pub fn load_path(&self, path: impl AsRef<Path>, include_geometry: bool) -> Result<LoadOutcome> {
        let bytes = fs::read(path.as_ref())?;
        self.load(&bytes, include_geometry)
    }

    pub fn load(&self, archive_bytes: &[u8], include_geometry: bool) -> Result<LoadOutcome> {
        let key = CacheKey::new(archive_bytes, include_geometry);

        // 1. Memory
        if let Some(hit) = self.lock_cache().get(&key) {
            tracing::debug!(fingerprint = %key.fingerprint, "load cache hit");
            return Ok(hit);
        }

        // 2. Snapshot
        if let Some(rs) = self.snapshots.as_ref().and_then(|s| s.read(&key)) {
            tracing::debug!(fingerprint = %key.fingerprint, "snapshot hit");
            let outcome = LoadOutcome::Loaded(Arc::new(rs));
            self.lock_cache().put(key, outcome.clone());
            return Ok(outcome);
        }

        // 3. Extract + parse
        let outcome = load_uncached(
            archive_bytes,
            include_geometry,
            &self.config,
            key.fingerprint.clone(),
        )?;

        // 4. Best-effort persist
        if let (Some(store), LoadOutcome::Loaded(rs)) = (&self.snapshots, &outcome) {
            if let Err(e) = store.write(&key, rs) {
                tracing::warn!(error = %e, "failed to write snapshot");
            }
        }
        self.lock_cache().put(key, outcome.clone());
        Ok(outcome)
    }

    fn lock_cache(&self) -> MutexGuard<'_, LoadCache> {
        // A panic while holding the lock cannot leave the LRU half-updated
        // in a way that matters here; keep serving.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn load_uncached(
    archive_bytes: &[u8],
    include_geometry: bool,
    config: &LoaderConfig,
    fingerprint: String,
) -> Result<LoadOutcome> {
    let scratch = ScratchDir::create(config.scratch_dir.as_deref())?;
    archive::extract(archive_bytes, scratch.path(), config)?;

    let Some(descriptor) = locate::select_descriptor(scratch.path(), config.descriptor_policy)? else {
        tracing::info!(fingerprint = %fingerprint, "no .shp file in archive");
        return Ok(LoadOutcome::NotFound);
    };

    let bundle = Bundle::discover(&scratch.path().join(&descriptor))?;
    let source = SourceInfo {
        descriptor,
        fingerprint,
    };
    let rs = read_bundle(&bundle, include_geometry, source)
        .map_err(|e| relative_to(e, scratch.path()))?;

    tracing::info!(
        descriptor = %rs.source().descriptor.display(),
        rows = rs.len(),
        columns = rs.columns().len(),
        include_geometry,
        "loaded record set"
    );
    Ok(LoadOutcome::Loaded(Arc::new(rs)))
}

/// Reports parse failures against archive-relative paths instead of the
/// scratch location, which no longer exists once the error reaches a user.
fn relative_to(err: LoadError, root: &Path) -> LoadError {
    match err {
        LoadError::InvalidData { file, reason } => LoadError::InvalidData {
            file: file.strip_prefix(root).map(Path::to_path_buf).unwrap_or(file),
            reason,
        },
        other => other,
    }
}

/// Decodes a located bundle into rows.
///
/// Without geometry the `.shp` is only header-checked; records are counted
/// from it only when there is no `.dbf` to supply rows.
fn read_bundle(bundle: &Bundle, include_geometry: bool, source: SourceInfo) -> Result<RecordSet> {
    let encoding = match &bundle.cpg {
        Some(p) => TextEncoding::from_cpg(&fs::read_to_string(p)?),
        None => TextEncoding::Auto,
    };
    let crs = match &bundle.prj {
        Some(p) => Some(fs::read_to_string(p)?.trim().to_string()).filter(|s| !s.is_empty()),
        None => None,
    };
    let table = match &bundle.dbf {
        Some(p) => Some(dbf::read_table(&fs::read(p)?, p, encoding)?),
        None => None,
    };

    let geometries = if include_geometry {
        Some(shp::read_geometries(&fs::read(&bundle.shp)?, &bundle.shp)?)
    } else {
        check_descriptor_header(&bundle.shp)?;
        None
    };

    let record_count = match (&geometries, &table) {
        (Some(g), Some(t)) if g.len() != t.records.len() => {
            return Err(LoadError::invalid(
                &bundle.shp,
                format!(
                    "{} shapes but {} attribute records",
                    g.len(),
                    t.records.len()
                ),
            ));
        }
        (Some(g), _) => g.len(),
        (None, Some(t)) => t.records.len(),
        (None, None) => shp::count_records(&fs::read(&bundle.shp)?, &bundle.shp)?,
    };
    cross_check_index(bundle, record_count);

    let (mut columns, mut records) = match table {
        Some(t) => (t.columns(), Some(t.records)),
        None => (Vec::new(), None),
    };
    if include_geometry {
        columns.push(Column {
            name: GEOMETRY_COLUMN.to_string(),
            kind: ColumnKind::Geometry,
        });
    }

    let mut shapes = geometries.map(Vec::into_iter);
    let mut rows = Vec::with_capacity(record_count);
    for i in 0..record_count {
        let shape = shapes.as_mut().and_then(|it| it.next()).flatten();
        let mut row = match records.as_mut() {
            Some(records) => match records[i].take() {
                Some(row) => row,
                None => continue,
            },
            None => Vec::new(),
        };
        if include_geometry {
            row.push(shape.map_or(Value::Null, |g| Value::Geometry(Box::new(g))));
        }
        rows.push(row);
    }

    Ok(RecordSet::new(columns, rows, crs, source))
}

fn check_descriptor_header(path: &Path) -> Result<()> {
    let mut head = Vec::with_capacity(shp::HEADER_LEN);
    File::open(path)?
        .take(shp::HEADER_LEN as u64)
        .read_to_end(&mut head)?;
    shp::parse_header(&head, path).map(|_| ())
}

/// The index is optional; a disagreeing one is worth a warning, not a
/// failed upload.
fn cross_check_index(bundle: &Bundle, record_count: usize) {
    let Some(path) = &bundle.shx else {
        return;
    };
    match fs::read(path).map_err(LoadError::from).and_then(|d| shx::record_count(&d, path)) {
        Ok(n) if n != record_count => {
            tracing::warn!(index = n, records = record_count, "shx record count disagrees");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable shx"),
    }
}
