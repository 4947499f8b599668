// crates/shp-pivot-core/tests/loader.rs

mod common;

use common::{parcels_zip, point_layer, zip_of};
use shp_pivot_core::{
    load, AppConfig, ArchiveLoader, ColumnKind, DescriptorPolicy, ErrorKind, LoadError, LoadOutcome,
    LoaderConfig, Preview, StatusMessage, Value,
};
use std::path::{Path, PathBuf};

fn loaded(outcome: LoadOutcome) -> std::sync::Arc<shp_pivot_core::RecordSet> {
    match outcome {
        LoadOutcome::Loaded(rs) => rs,
        LoadOutcome::NotFound => panic!("expected a record set"),
    }
}

fn loader_in(scratch: &Path, capacity: usize) -> ArchiveLoader {
    let mut config = AppConfig::default();
    config.loader.scratch_dir = Some(scratch.to_path_buf());
    config.cache.capacity = capacity;
    ArchiveLoader::new(&config).unwrap()
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

#[test]
fn row_count_matches_feature_count() {
    let rs = loaded(load(&parcels_zip("", 37), true).unwrap());
    assert_eq!(rs.len(), 37);
    assert_eq!(rs.source().descriptor, PathBuf::from("parcels.shp"));
    let names: Vec<&str> = rs.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["ID", "NAME", "geometry"]);
    assert_eq!(rs.rows()[2][0], Value::Integer(3));
    assert_eq!(rs.rows()[2][1], Value::Text("parcel 3".into()));
    assert_eq!(rs.rows()[2][2].display(), "POINT (2 -2)");
}

#[test]
fn archive_without_shp_is_not_found() {
    let bytes = zip_of(&[("notes.txt", b"nothing to see")]);
    let outcome = load(&bytes, true).unwrap();
    assert!(!outcome.is_found());
    assert_eq!(
        StatusMessage::for_outcome(&outcome).text,
        "No valid .shp file found in the ZIP."
    );
}

#[test]
fn geometry_flag_only_drops_the_geometry_column() {
    let bytes = parcels_zip("nested/dir/", 12);
    let with = loaded(load(&bytes, true).unwrap());
    let without = loaded(load(&bytes, false).unwrap());
    assert!(with.has_geometry());
    assert!(!without.has_geometry());
    assert!(without.columns().iter().all(|c| c.kind != ColumnKind::Geometry));
    assert_eq!(with.len(), without.len());
    assert_eq!(without.source().descriptor, PathBuf::from("nested/dir/parcels.shp"));
}

#[test]
fn truncated_archive_is_an_archive_error() {
    let mut bytes = parcels_zip("", 10);
    bytes.truncate(bytes.len() / 2);
    let err = load(&bytes, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Archive, "{err}");
}

#[test]
fn twelve_hundred_parcels_end_to_end() {
    let outcome = load(&parcels_zip("", 1200), false).unwrap();
    let status = StatusMessage::for_outcome(&outcome);
    assert!(status.text.contains("1,200"), "{}", status.text);
    let rs = loaded(outcome);
    let preview = Preview::new(&rs, LoaderConfig::default().preview_rows);
    assert_eq!(preview.rows.len(), 5);
    assert_eq!(preview.total_rows, 1200);
}

#[test]
fn renamed_text_file_is_an_archive_read_error() {
    let err = load(b"this is a csv, not a zip\n1,2,3\n", true).unwrap_err();
    assert!(matches!(err, LoadError::Archive(_)), "{err}");
    assert!(StatusMessage::load_failed(&err).text.starts_with("Error reading file:"));
}

#[test]
fn scratch_directory_is_released_on_every_path() {
    let root = tempfile::tempdir().unwrap();
    let loader = loader_in(root.path(), 0);

    loader.load(&parcels_zip("", 3), true).unwrap();
    assert!(is_empty_dir(root.path()), "after success");

    loader.load(&zip_of(&[("notes.txt", b"x")]), true).unwrap();
    assert!(is_empty_dir(root.path()), "after not-found");

    let layer = point_layer(3);
    let broken = zip_of(&[("parcels.shp", &layer.shp[..50]), ("parcels.dbf", &layer.dbf)]);
    assert!(loader.load(&broken, true).is_err());
    assert!(is_empty_dir(root.path()), "after parse error");
}

#[test]
fn parse_errors_name_the_archive_path() {
    let layer = point_layer(2);
    let broken = zip_of(&[("layers/roads.shp", &layer.shp[..60]), ("layers/roads.dbf", &layer.dbf)]);
    let err = load(&broken, true).unwrap_err();
    match &err {
        LoadError::InvalidData { file, .. } => assert_eq!(file, &PathBuf::from("layers/roads.shp")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn shape_and_attribute_counts_must_agree() {
    let three = point_layer(3);
    let two = point_layer(2);
    let bytes = zip_of(&[("p.shp", &three.shp), ("p.dbf", &two.dbf)]);
    assert!(matches!(load(&bytes, true), Err(LoadError::InvalidData { .. })));
}

#[test]
fn shapefile_without_attribute_table_still_counts_rows() {
    let layer = point_layer(4);
    let bytes = zip_of(&[("bare.shp", &layer.shp), ("bare.shx", &layer.shx)]);
    let attrs = loaded(load(&bytes, false).unwrap());
    assert_eq!(attrs.len(), 4);
    assert!(attrs.columns().is_empty());
    let geoms = loaded(load(&bytes, true).unwrap());
    assert_eq!(geoms.len(), 4);
    assert_eq!(geoms.columns().len(), 1);
}

#[test]
fn multiple_descriptors_follow_the_policy() {
    let a = point_layer(1);
    let b = point_layer(2);
    let bytes = zip_of(&[
        ("z_second.shp", &b.shp),
        ("z_second.dbf", &b.dbf),
        ("a_first.shp", &a.shp),
        ("a_first.dbf", &a.dbf),
    ]);

    let rs = loaded(load(&bytes, false).unwrap());
    assert_eq!(rs.source().descriptor, PathBuf::from("a_first.shp"));
    assert_eq!(rs.len(), 1);

    let mut config = AppConfig::default();
    config.loader.descriptor_policy = DescriptorPolicy::RejectAmbiguous;
    config.cache.capacity = 0;
    let strict = ArchiveLoader::new(&config).unwrap();
    let err = strict.load(&bytes, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ambiguous);
}

#[test]
fn path_traversal_entries_are_rejected() {
    let layer = point_layer(1);
    let bytes = zip_of(&[("../escape.shp", &layer.shp)]);
    let err = load(&bytes, true).unwrap_err();
    assert!(matches!(err, LoadError::UnsafeEntry(_)), "{err}");
}

#[test]
fn cache_hit_skips_extraction() {
    let root = tempfile::tempdir().unwrap();
    let loader = loader_in(root.path(), 4);
    let bytes = parcels_zip("", 5);

    let first = loaded(loader.load(&bytes, true).unwrap());
    let second = loaded(loader.load(&bytes, true).unwrap());
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    let stats = loader.cache_stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));

    // Different flag, different entry.
    let attrs = loaded(loader.load(&bytes, false).unwrap());
    assert!(!attrs.has_geometry());
    assert_eq!(loader.cache_stats().entries, 2);

    loader.invalidate(&bytes);
    assert_eq!(loader.cache_stats().entries, 0);
}

#[test]
fn snapshots_survive_a_new_loader() {
    let snapshots = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.cache.snapshot_dir = Some(snapshots.path().to_path_buf());
    let bytes = parcels_zip("", 6);

    let first = loaded(ArchiveLoader::new(&config).unwrap().load(&bytes, true).unwrap());
    assert!(!is_empty_dir(snapshots.path()));
    let second = loaded(ArchiveLoader::new(&config).unwrap().load(&bytes, true).unwrap());
    assert_eq!(*first, *second);
}

#[test]
fn prj_and_cpg_siblings_are_honoured() {
    let layer = point_layer(1);
    let mut dbf = layer.dbf.clone();
    // Rewrite "parcel 1" as Latin-1 "parcél 1".
    let at = dbf.windows(8).position(|w| w == b"parcel 1").unwrap();
    dbf[at + 4] = 0xE9;
    let bytes = zip_of(&[
        ("p.shp", &layer.shp),
        ("p.dbf", &dbf),
        ("p.prj", b"GEOGCS[\"GCS_WGS_1984\"]\n"),
        ("p.cpg", b"ISO-8859-1"),
    ]);
    let rs = loaded(load(&bytes, false).unwrap());
    assert_eq!(rs.crs(), Some("GEOGCS[\"GCS_WGS_1984\"]"));
    assert_eq!(rs.rows()[0][1], Value::Text("parcél 1".into()));
}

#[test]
fn deleted_attribute_rows_are_dropped_in_both_modes() {
    let layer = point_layer(3);
    let mut dbf = layer.dbf.clone();
    // 97-byte header, 25-byte records: flag the second record as deleted.
    dbf[97 + 25] = b'*';
    let bytes = zip_of(&[("p.shp", &layer.shp), ("p.dbf", &dbf)]);

    let attrs = loaded(load(&bytes, false).unwrap());
    let geoms = loaded(load(&bytes, true).unwrap());
    assert_eq!(attrs.len(), 2);
    assert_eq!(geoms.len(), 2);

    assert_eq!(geoms.rows()[0][0], Value::Integer(1));
    assert_eq!(geoms.rows()[1][0], Value::Integer(3));
    // Shapes stay paired with their own attribute row after the gap.
    assert_eq!(geoms.rows()[1][2].display(), "POINT (2 -2)");
    assert_eq!(attrs.rows()[1][1], Value::Text("parcel 3".into()));
}

#[test]
fn implausible_dbf_record_count_is_a_parse_error() {
    let layer = point_layer(1);
    let mut dbf = layer.dbf.clone();
    dbf[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
    let bytes = zip_of(&[("p.shp", &layer.shp), ("p.dbf", &dbf)]);
    let err = load(&bytes, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse, "{err}");
    assert!(matches!(err, LoadError::InvalidData { .. }));
}
