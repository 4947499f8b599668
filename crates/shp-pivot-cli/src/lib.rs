//! shp-pivot-cli
//! =============
//!
//! Command-line interface and upload server for `shp-pivot-core`.
//!
//! This crate primarily provides a binary (`shp-pivot`). We include a small
//! library target so that docs.rs renders a documentation page and shows this
//! overview.
//!
//! Quick start
//! -----------
//!
//! ```text
//! shp-pivot inspect parcels.zip
//! shp-pivot --geometry export parcels.zip --format csv -o parcels.csv
//! shp-pivot search parcels.zip "main st" --column ADDRESS
//! shp-pivot serve --addr 0.0.0.0:8501
//! ```
//!
//! For programmatic access use the `shp-pivot-core` crate directly.
#![cfg_attr(docsrs, feature(doc_cfg))]

// No public API here; everything lives in the `shp-pivot` binary.
