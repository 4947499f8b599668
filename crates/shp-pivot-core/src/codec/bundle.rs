// crates/shp-pivot-core/src/codec/bundle.rs

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// The component files of one shapefile, located next to its `.shp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub shp: PathBuf,
    pub shx: Option<PathBuf>,
    pub dbf: Option<PathBuf>,
    pub prj: Option<PathBuf>,
    pub cpg: Option<PathBuf>,
}

impl Bundle {
    /// Collects siblings sharing the descriptor's stem.
    ///
    /// Extensions match case-insensitively; an exact stem match wins over a
    /// case-insensitive one (`Parcels.DBF` is only used when `Parcels.dbf`
    /// and `parcels.dbf` are both absent).
    pub fn discover(shp: &Path) -> Result<Self> {
        let dir = shp.parent().unwrap_or_else(|| Path::new("."));
        let stem = shp
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut siblings = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path != shp {
                siblings.push(path);
            }
        }
        siblings.sort();

        let find = |ext: &str| -> Option<PathBuf> {
            let matches_ext = |p: &&PathBuf| {
                p.extension()
                    .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
            };
            let stem_of = |p: &PathBuf| p.file_stem().map(|s| s.to_string_lossy().into_owned());
            siblings
                .iter()
                .filter(matches_ext)
                .find(|p| stem_of(*p).as_deref() == Some(stem.as_str()))
                .or_else(|| {
                    siblings.iter().filter(matches_ext).find(|p| {
                        stem_of(*p).is_some_and(|s| s.eq_ignore_ascii_case(&stem))
                    })
                })
                .cloned()
        };

        Ok(Bundle {
            shp: shp.to_path_buf(),
            shx: find("shx"),
            dbf: find("dbf"),
            prj: find("prj"),
            cpg: find("cpg"),
        })
    }
}
