//! Error handling example for shp-pivot-rs
//!
//! This example demonstrates how load failures surface and how to turn
//! them into user-facing status lines.

#[path = "sample.rs"]
mod sample;

use shp_pivot_rs::prelude::*;

fn main() -> Result<()> {
    println!("=== shp-pivot-rs Error Handling Example ===\n");

    // Example 1: An archive with no shapefile is not an error
    println!("--- Example 1: Archive without a .shp ---");
    let notes = sample::zip_of(&[("notes.txt", b"field survey notes")]);
    match load(&notes, false)? {
        LoadOutcome::Loaded(rs) => println!("  Loaded {} rows", rs.len()),
        LoadOutcome::NotFound => println!("  {}", StatusMessage::not_found()),
    }
    println!();

    // Example 2: Bytes that are not a ZIP at all
    println!("--- Example 2: Not a ZIP ---");
    report(load(b"PK but not really", false));
    println!();

    // Example 3: A truncated upload
    println!("--- Example 3: Truncated archive ---");
    let mut cut = sample::cities_zip();
    cut.truncate(cut.len() / 2);
    report(load(&cut, false));
    println!();

    // Example 4: More than one shapefile under a strict policy
    println!("--- Example 4: Ambiguous archive ---");
    let mut config = AppConfig::default();
    config.loader.descriptor_policy = DescriptorPolicy::RejectAmbiguous;
    let loader = ArchiveLoader::new(&config)?;
    let shp = sample::cities_shp();
    let two_layers = sample::zip_of(&[("a/one.shp", &shp), ("b/two.shp", &shp)]);
    report(loader.load(&two_layers, false));

    Ok(())
}

fn report(result: Result<LoadOutcome>) {
    match result {
        Ok(outcome) => println!("  {}", StatusMessage::for_outcome(&outcome)),
        Err(e) => {
            println!("  [{:?}] {}", e.kind(), StatusMessage::load_failed(&e));
        }
    }
}
