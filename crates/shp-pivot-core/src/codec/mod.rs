// crates/shp-pivot-core/src/codec/mod.rs

//! # Shapefile codecs
//!
//! Decoders for the component files of a shapefile bundle. They work on
//! whole-file byte buffers; the loader reads each file once.

pub mod bundle;
mod cursor;
pub mod dbf;
pub mod shp;
pub mod shx;

pub use bundle::Bundle;
pub use dbf::{DbfField, DbfTable, TextEncoding};
pub use shp::{ShapeType, ShpHeader};
