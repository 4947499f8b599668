//! # shp-pivot-rs
//!
//! Workspace crate. Re-exports [`shp_pivot_core`] so the demos can pull
//! everything from one prelude.

pub use shp_pivot_core::*;

pub mod prelude {
    pub use shp_pivot_core::{
        load, AppConfig, ArchiveLoader, ColumnKind, DescriptorPolicy, ErrorKind, LoadError,
        LoadOutcome, Preview, RecordSet, Result, StatusMessage, Value,
    };
}
