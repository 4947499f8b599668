//! shp-pivot: command-line interface for shp-pivot-core
//!
//! Load a zipped shapefile into a table from your terminal, or run the
//! upload server that hands the table to the pivot widget.
//!
//! Usage examples
//! --------------
//!
//! - Status line, summary and a 5-row preview
//!   $ shp-pivot inspect parcels.zip
//!   $ shp-pivot inspect parcels.zip --rows 20
//!
//! - Keep geometry (rendered as WKT in exports)
//!   $ shp-pivot --geometry inspect parcels.zip
//!
//! - Export everything as JSON rows or CSV
//!   $ shp-pivot export parcels.zip
//!   $ shp-pivot export parcels.zip --format csv -o parcels.csv
//!
//! - Search text cells (case- and accent-insensitive)
//!   $ shp-pivot search parcels.zip "sao joao" --column STREET
//!
//! - Run the upload server
//!   $ shp-pivot serve --addr 0.0.0.0:8501
//!
//! Configuration
//! -------------
//!
//! Settings come from `--config <file>`, then `$SHP_PIVOT_CONFIG`, then the
//! built-in defaults. Log verbosity follows `RUST_LOG` (default `info`).
mod args;
mod serve;

use crate::args::{CliArgs, Commands, ExportFormat};
use anyhow::Context;
use clap::Parser;
use shp_pivot_core::{AppConfig, ArchiveLoader, LoadOutcome, Preview, RecordSet, StatusMessage};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = AppConfig::resolve(args.config.as_deref())?;

    match args.command {
        Commands::Inspect { archive, rows } => {
            let loader = ArchiveLoader::new(&config)?;
            let Some(rs) = load_or_report(&loader, &archive, args.geometry)? else {
                return Ok(());
            };
            let stats = rs.stats();
            println!("{}", StatusMessage::loaded(rs.len()));
            println!("  Descriptor: {}", rs.source().descriptor.display());
            println!("  Columns:    {}", stats.columns);
            if stats.has_geometry {
                for (kind, count) in &stats.geometry_types {
                    println!("  {:<11} {}", format!("{}:", kind), count);
                }
            }
            if let Some(crs) = rs.crs() {
                println!("  CRS:        {}", crs);
            }
            println!();
            let n = rows.unwrap_or(config.loader.preview_rows);
            print!("{}", Preview::new(&rs, n));
        }

        Commands::Export {
            archive,
            format,
            output,
        } => {
            let loader = ArchiveLoader::new(&config)?;
            let Some(rs) = load_or_report(&loader, &archive, args.geometry)? else {
                return Ok(());
            };
            let out: Box<dyn Write> = match &output {
                Some(path) => Box::new(
                    File::create(path).with_context(|| format!("creating {}", path.display()))?,
                ),
                None => Box::new(io::stdout().lock()),
            };
            let mut out = BufWriter::new(out);
            match format {
                ExportFormat::Json => {
                    serde_json::to_writer_pretty(&mut out, &rs.to_json_rows())?;
                    writeln!(out)?;
                }
                ExportFormat::Csv => rs.write_csv(&mut out)?,
            }
            out.flush()?;
            if let Some(path) = output {
                eprintln!("Wrote {} rows to {}", rs.len(), path.display());
            }
        }

        Commands::Search {
            archive,
            query,
            column,
        } => {
            let loader = ArchiveLoader::new(&config)?;
            let Some(rs) = load_or_report(&loader, &archive, args.geometry)? else {
                return Ok(());
            };
            if let Some(name) = &column {
                if rs.column_index(name).is_none() {
                    anyhow::bail!("No column named '{}'", name);
                }
            }
            let hits = rs.find_rows_containing(&query, column.as_deref());
            if hits.is_empty() {
                println!("No rows match '{}'", query);
            } else {
                for row in &hits {
                    let cells: Vec<String> = row.iter().map(|v| v.display()).collect();
                    println!("{}", cells.join(" | "));
                }
                println!("{} matching rows", hits.len());
            }
        }

        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve::run(&addr, config))?;
        }
    }

    Ok(())
}

/// Loads an archive from disk. A missing `.shp` is reported and yields
/// `None`; load failures become the same status text the server shows.
fn load_or_report(
    loader: &ArchiveLoader,
    archive: &Path,
    include_geometry: bool,
) -> anyhow::Result<Option<Arc<RecordSet>>> {
    match loader.load_path(archive, include_geometry) {
        Ok(LoadOutcome::Loaded(rs)) => Ok(Some(rs)),
        Ok(LoadOutcome::NotFound) => {
            eprintln!("{}", StatusMessage::not_found());
            Ok(None)
        }
        Err(e) => anyhow::bail!("{}", StatusMessage::load_failed(&e)),
    }
}
