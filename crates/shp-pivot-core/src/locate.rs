// crates/shp-pivot-core/src/locate.rs

//! # Descriptor lookup
//!
//! Finds the `.shp` to load inside an extracted archive. Candidates are
//! ordered by their path relative to the extraction root so the choice does
//! not depend on filesystem iteration order.

use crate::config::DescriptorPolicy;
use crate::error::{LoadError, Result};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory that macOS Archive Utility adds next to the real content.
const MACOS_METADATA_DIR: &str = "__MACOSX";

fn is_noise(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name == MACOS_METADATA_DIR || name.starts_with("._")
}

fn is_descriptor(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case("shp"))
}

/// Every `.shp` under `root`, as paths relative to it, sorted.
pub fn find_descriptors(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_noise(e)) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && is_descriptor(entry.path()) {
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            found.push(rel.to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}

/// Applies `policy` to the candidates under `root`.
///
/// `Ok(None)` means no descriptor exists; that is an outcome, not an error.
pub fn select_descriptor(root: &Path, policy: DescriptorPolicy) -> Result<Option<PathBuf>> {
    let mut candidates = find_descriptors(root)?;
    match (candidates.len(), policy) {
        (0, _) => Ok(None),
        (1, _) => Ok(candidates.pop()),
        (_, DescriptorPolicy::RejectAmbiguous) => Err(LoadError::AmbiguousDescriptor(candidates)),
        (n, DescriptorPolicy::First) => {
            let chosen = candidates.swap_remove(0);
            tracing::warn!(
                candidates = n,
                chosen = %chosen.display(),
                "archive holds several .shp files; using the first in path order"
            );
            Ok(Some(chosen))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            let p = dir.path().join(f);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, b"").unwrap();
        }
        dir
    }

    #[test]
    fn none_found_is_not_an_error() {
        let dir = tree(&["notes.txt", "data/table.dbf"]);
        assert_eq!(select_descriptor(dir.path(), DescriptorPolicy::First).unwrap(), None);
    }

    #[test]
    fn order_is_lexicographic_and_case_insensitive() {
        let dir = tree(&["z/last.shp", "b/ROADS.SHP", "b/a.shp"]);
        let found = find_descriptors(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![PathBuf::from("b/ROADS.SHP"), PathBuf::from("b/a.shp"), PathBuf::from("z/last.shp")]
        );
        assert_eq!(
            select_descriptor(dir.path(), DescriptorPolicy::First).unwrap(),
            Some(PathBuf::from("b/ROADS.SHP"))
        );
    }

    #[test]
    fn macos_resource_forks_are_skipped() {
        let dir = tree(&["__MACOSX/._parcels.shp", "._parcels.shp", "parcels.shp"]);
        assert_eq!(find_descriptors(dir.path()).unwrap(), vec![PathBuf::from("parcels.shp")]);
    }

    #[test]
    fn reject_policy_lists_candidates() {
        let dir = tree(&["a.shp", "b.shp"]);
        match select_descriptor(dir.path(), DescriptorPolicy::RejectAmbiguous) {
            Err(LoadError::AmbiguousDescriptor(c)) => assert_eq!(c.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
