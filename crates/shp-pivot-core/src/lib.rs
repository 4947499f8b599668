// crates/shp-pivot-core/src/lib.rs

//! # shp-pivot-core
//!
//! Load a zipped shapefile bundle into an in-memory [`RecordSet`] and get it
//! ready for a pivot/visualization widget.
//!
//! ```no_run
//! use shp_pivot_core::{load, LoadOutcome, StatusMessage};
//!
//! let bytes = std::fs::read("parcels.zip")?;
//! let outcome = load(&bytes, false)?;
//! println!("{}", StatusMessage::for_outcome(&outcome));
//! if let LoadOutcome::Loaded(rs) = outcome {
//!     assert!(!rs.has_geometry());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod archive;
pub mod codec;
pub mod config;
pub mod error;
pub mod loader;
pub mod locate;
pub mod model;
pub mod report;
pub mod text;
pub mod widget;

// Re-exports
pub use crate::config::{AppConfig, DescriptorPolicy, LoaderConfig};
pub use crate::error::{ErrorKind, LoadError, Result};
pub use crate::loader::{load, ArchiveLoader, LoadOutcome};
pub use crate::model::{Column, ColumnKind, Geometry, RecordSet, RecordStats, Value};
pub use crate::report::{Preview, StatusMessage};
#[cfg(feature = "json")]
pub use crate::widget::{RenderError, WidgetPayload, WidgetSpecStore};
