//! Basic usage example for shp-pivot-rs
//!
//! This example demonstrates how to:
//! - Load a zipped shapefile with and without geometry
//! - Print the status line and a preview
//! - Search attribute text
//! - Reuse a cached load through `ArchiveLoader`
//!
//! Pass a path to use your own archive:
//!   cargo run --example basic_usage -- parcels.zip

#[path = "sample.rs"]
mod sample;

use shp_pivot_rs::prelude::*;
use std::time::Instant;

fn main() -> Result<()> {
    println!("=== shp-pivot-rs Basic Usage Example ===\n");

    let bytes = match std::env::args().nth(1) {
        Some(path) => std::fs::read(path)?,
        None => sample::cities_zip(),
    };

    // Example 1: Attributes only
    println!("--- Example 1: Load attributes only ---");
    let outcome = load(&bytes, false)?;
    println!("{}", StatusMessage::for_outcome(&outcome));
    let Some(rs) = outcome.record_set() else {
        return Ok(());
    };
    print!("{}", Preview::new(rs, 5));
    println!();

    // Example 2: With geometry
    println!("--- Example 2: Load with geometry ---");
    let with_geometry = load(&bytes, true)?;
    if let Some(rs) = with_geometry.record_set() {
        let stats = rs.stats();
        println!("Columns: {}", stats.columns);
        println!("Geometry types: {:?}", stats.geometry_types);
        println!("CRS: {}", rs.crs().unwrap_or("(none)"));
        if let Some(first) = rs.rows().first().and_then(|row| row.last()) {
            println!("First shape: {}", first.display());
        }
    }
    println!();

    // Example 3: Search text (accents and case are ignored)
    println!("--- Example 3: Search for 'geneve' ---");
    for row in rs.find_rows_containing("geneve", None) {
        let cells: Vec<String> = row.iter().map(Value::display).collect();
        println!("  {}", cells.join(" | "));
    }
    println!();

    // Example 4: Cached loads
    println!("--- Example 4: Cached loads ---");
    let loader = ArchiveLoader::new(&AppConfig::default())?;
    let start = Instant::now();
    loader.load(&bytes, false)?;
    let cold = start.elapsed();
    let start = Instant::now();
    loader.load(&bytes, false)?;
    let warm = start.elapsed();
    println!("First load:  {:?}", cold);
    println!("Second load: {:?} (cache {:?})", warm, loader.cache_stats());

    Ok(())
}
