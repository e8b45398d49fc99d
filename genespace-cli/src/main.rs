use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use commands::tile::TileOverrides;
use config::Config;
use error::{print_error_and_exit, CliError};

#[derive(Parser)]
#[command(name = "genespace")]
#[command(about = "GeneSpace - quadtree tiles for gene-space explorer maps")]
#[command(version)]
#[command(long_about = "
GeneSpace turns a 2-D gene embedding into a zoomable tile pyramid. Sparse tiles
are written as JSON point lists, dense tiles as PNG images of translucent dots.

Examples:
  genespace tile --data genes.json --out tiles --max-zoom 6 --threshold 2000
  genespace inspect --tiles tiles --zoom 3 --x 2 --y 5
  genespace view --tiles tiles --data genes.json --where hypothetical=YES
  genespace config --example > genespace.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of threads to use
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the tile pyramid for a point dataset (.json, .csv or .tsv)
    Tile {
        /// Point dataset
        #[arg(short, long)]
        data: PathBuf,

        /// Output tile directory (overrides output.dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// First zoom level allowed to claim points
        #[arg(long)]
        min_zoom: Option<u8>,

        /// Zoom level at which every remaining point is placed
        #[arg(long)]
        max_zoom: Option<u8>,

        /// Tiles with fewer points become vector tiles; -1 removes the limit
        #[arg(long, allow_negative_numbers = true)]
        threshold: Option<i64>,

        /// Tile edge in pixels
        #[arg(long)]
        tile_size: Option<u32>,

        /// Also render overview rasters for deferred tiles
        #[arg(long)]
        preview_deferred: bool,

        /// Write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show what was materialized at one tile address
    Inspect {
        /// Tile directory
        #[arg(long)]
        tiles: PathBuf,

        #[arg(short, long)]
        zoom: u8,

        #[arg(short, long)]
        x: u32,

        #[arg(short, long)]
        y: u32,
    },

    /// Select points and print their map positions with a suggested view
    View {
        /// Tile directory written by `genespace tile`
        #[arg(long)]
        tiles: PathBuf,

        /// Point dataset the tiles were built from
        #[arg(short, long)]
        data: PathBuf,

        /// Attribute filter as key=value (repeatable)
        #[arg(long = "where", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Point id to include (repeatable)
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,
    },

    /// Print the effective configuration
    Config {
        /// Print the default configuration instead
        #[arg(long)]
        example: bool,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())?;

    let threads = cli
        .threads
        .or(Some(config.general.threads).filter(|&n| n > 0));
    if let Some(threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to set thread count")?;
    }

    match cli.command {
        Commands::Tile {
            data,
            out,
            min_zoom,
            max_zoom,
            threshold,
            tile_size,
            preview_deferred,
            report,
        } => {
            let overrides = TileOverrides {
                out,
                min_zoom,
                max_zoom,
                threshold,
                tile_size,
                preview_deferred,
            };
            commands::tile::execute(&config, data, overrides, report)
        }
        Commands::Inspect { tiles, zoom, x, y } => commands::inspect::execute(tiles, zoom, x, y),
        Commands::View {
            tiles,
            data,
            filters,
            ids,
        } => commands::view::execute(&config, tiles, data, filters, ids),
        Commands::Config { example } => commands::config::execute(&config, example),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<CliError>() {
            Some(cli_err) => {
                for cause in err.chain().skip(1) {
                    log::debug!("caused by: {}", cause);
                }
                print_error_and_exit(cli_err)
            }
            None => {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}
