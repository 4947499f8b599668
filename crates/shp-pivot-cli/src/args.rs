use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for shp-pivot
#[derive(Debug, Parser)]
#[command(
    name = "shp-pivot",
    version,
    about = "Load zipped shapefiles into tables for preview, export and pivot analysis"
)]
pub struct CliArgs {
    /// Path to a TOML config file (default: $SHP_PIVOT_CONFIG, then built-in defaults)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Load shape geometry as well (heavy for archives over ~100MB)
    #[arg(short = 'g', long = "geometry", global = true)]
    pub geometry: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load an archive and show the status line, a summary and a preview
    Inspect {
        /// Path to the .zip archive
        archive: PathBuf,

        /// Number of preview rows (default: loader.preview_rows)
        #[arg(short = 'n', long = "rows")]
        rows: Option<usize>,
    },

    /// Export the whole table
    Export {
        /// Path to the .zip archive
        archive: PathBuf,

        #[arg(short = 'f', long = "format", value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Output file (default: stdout)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },

    /// Find rows whose text contains a substring (case- and accent-insensitive)
    Search {
        /// Path to the .zip archive
        archive: PathBuf,

        /// Substring to search
        query: String,

        /// Restrict the search to one column
        #[arg(long = "column")]
        column: Option<String>,
    },

    /// Run the upload server with the pivot workspace
    Serve {
        /// Listen address (default: server.addr)
        #[arg(short = 'a', long = "addr")]
        addr: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}
