use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::GridSource;

/// Geoid height lookup CLI tool
#[derive(Parser)]
#[command(name = "geoid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a .pgm geoid grid (takes precedence over --data-dir/--model)
    #[arg(short, long, env = "GEOID_GRID", global = true)]
    grid: Option<PathBuf>,

    /// Directory containing .pgm grids
    #[arg(short, long, env = "GEOID_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Model to load from the data directory
    #[arg(
        short,
        long,
        env = "GEOID_MODEL",
        default_value = geoid::DEFAULT_MODEL,
        global = true
    )]
    model: String,

    /// Grid rows kept in memory
    #[arg(
        long,
        env = "GEOID_CACHE_ROWS",
        default_value_t = geoid::DEFAULT_CACHE_ROWS,
        global = true
    )]
    cache_rows: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print grid information and the geoid height at a coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add geoid heights to every row of a CSV file
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file (defaults to <input>_geoid.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude
        #[arg(long, default_value = "lon")]
        lon_col: String,

        /// Use bilinear instead of cubic interpolation
        #[arg(short, long)]
        bilinear: bool,
    },

    /// Display grid geometry, calibration and metadata
    Info,

    /// List geoid models in the data directory
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let source = GridSource {
        grid: cli.grid,
        data_dir: cli.data_dir,
        model: cli.model,
        cache_rows: cli.cache_rows,
    };

    match cli.command {
        Commands::Query { lat, lon, json } => {
            commands::query::run(&source, lat.zip(lon), json)
        }
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
            bilinear,
        } => commands::batch::run(&source, input, output, &lat_col, &lon_col, bilinear),
        Commands::Info => commands::info::run(&source),
        Commands::List => commands::list::run(source.data_dir),
    }
}
