// crates/shp-pivot-core/src/model/mod.rs

pub mod geometry;
pub mod record;

pub use geometry::{Coord, Geometry, Patch, PatchKind};
pub use record::{Column, ColumnKind, RecordSet, RecordStats, SourceInfo, Value, GEOMETRY_COLUMN};
