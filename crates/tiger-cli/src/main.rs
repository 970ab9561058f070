//! Command-line interface for `tiger`, a Census TIGER/Line to PostGIS loader.
//!
//! This binary provides a CLI over the [`tiger_fetch`] and [`tiger_core`] libraries:
//! archives are fetched from the Census server and extracted into dataset directories,
//! which are then grouped by geography and year and loaded into one PostGIS table per
//! group.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for structured logging.
//! It parses arguments, configures logging, and delegates to command handlers.
//!
//! # Available Commands
//!
//! - `fetch` - Download and extract TIGER/Line archives
//! - `groups` - Show how extracted dataset directories group into tables
//! - `load` - Load every group into PostGIS
//! - `geographies` - List the known geography types

mod display;

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use tiger_core::config::{
    ConnectionConfig, DEFAULT_SOURCE_SRID, DEFAULT_TARGET_SRID, LoadConfig,
};
use tiger_core::discovery::discover_groups;
use tiger_core::error::TigerError;
use tiger_core::geography::get_geography_types;
use tiger_core::pipeline;
use tiger_core::postgis::PostgisStore;
use tiger_fetch::{DEFAULT_BASE_URL, FetchConfig};

#[derive(Parser)]
#[command(
    name = "tiger",
    version,
    about = "Load Census TIGER/Line shapefiles into PostGIS",
    long_about = "tiger downloads Census TIGER/Line archives, groups the extracted shapefiles\n\
                  by geography and year, and loads each group into its own PostGIS table."
)]
/// Command-line arguments and options for the `tiger` CLI.
///
/// This struct defines the top-level CLI interface, including global flags for
/// logging verbosity and the subcommand to execute.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `tiger` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Downloads TIGER/Line archives and extracts them into dataset directories.
    ///
    /// Without --geo, every geography marked for automatic download is fetched.
    /// With --state, national files covering the state are fetched too.
    Fetch {
        /// Data year.
        #[arg(short, long, default_value_t = 2014)]
        year: u16,

        /// State postal abbreviations (e.g. OR WA).
        #[arg(short, long = "state", value_name = "STATE", num_args = 1..)]
        states: Vec<String>,

        /// Geography codes or remote directories (e.g. tract bg tabblock).
        #[arg(short, long = "geo", value_name = "GEOGRAPHY", num_args = 1..)]
        geographies: Vec<String>,

        /// Directory archives are downloaded into.
        #[arg(long, value_name = "DIR", default_value = "downloads")]
        download_dir: PathBuf,

        /// Directory archives are extracted into.
        #[arg(long, value_name = "DIR", default_value = "extracted_files")]
        extract_dir: PathBuf,

        /// Census server root.
        #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },

    /// Shows how the extracted dataset directories group into tables.
    ///
    /// Makes no database connection.
    Groups {
        /// Directory holding the extracted dataset directories.
        #[arg(long, value_name = "DIR", default_value = "extracted_files")]
        data_dir: PathBuf,
    },

    /// Loads every table group into PostGIS.
    ///
    /// Each group's table is dropped and recreated, so re-running replaces
    /// previously loaded rows.
    Load {
        /// Directory holding the extracted dataset directories.
        #[arg(long, value_name = "DIR", default_value = "extracted_files")]
        data_dir: PathBuf,

        /// Database host.
        #[arg(short = 'H', long, default_value = "localhost")]
        host: String,

        /// Database port.
        #[arg(long, default_value_t = 5432)]
        port: u16,

        /// Database role.
        #[arg(short, long)]
        user: String,

        /// Database password.
        #[arg(short, long, env = "PGPASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Database name.
        #[arg(short, long, default_value = "census")]
        dbname: String,

        /// Target schema.
        #[arg(short, long, default_value = "tiger")]
        schema: String,

        /// SRID of the shapefile geometries.
        #[arg(long, default_value_t = DEFAULT_SOURCE_SRID)]
        source_srid: i32,

        /// SRID the geometries are stored in.
        #[arg(long, default_value_t = DEFAULT_TARGET_SRID)]
        target_srid: i32,

        /// Rows committed per transaction.
        #[arg(long, default_value_t = 1000)]
        batch_size: usize,
    },

    /// Lists the known geography types and the tables they load into.
    Geographies,
}

/// Entry point for the `tiger` command-line interface.
///
/// This function parses command-line arguments, configures the logging system based on
/// verbosity flags, and dispatches to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system cannot be initialized.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity flags
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true) // Show module paths for better context
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Fetch {
            year,
            states,
            geographies,
            download_dir,
            extract_dir,
            base_url,
        } => {
            let config = FetchConfig {
                base_url,
                year,
                states,
                geographies,
                download_dir,
                extract_dir,
            };
            handle_fetch(&config).await?;
        },
        Commands::Groups { data_dir } => {
            handle_groups(&data_dir)?;
        },
        Commands::Load {
            data_dir,
            host,
            port,
            user,
            password,
            dbname,
            schema,
            source_srid,
            target_srid,
            batch_size,
        } => {
            let connection = ConnectionConfig {
                host,
                port,
                user,
                password,
                dbname,
            };
            let config = LoadConfig {
                data_dir,
                schema,
                source_srid,
                target_srid,
                batch_size,
            };
            handle_load(&connection, &config).await?;
        },
        Commands::Geographies => {
            display::display_geographies(&get_geography_types());
        },
    }

    Ok(())
}

async fn handle_fetch(config: &FetchConfig) -> Result<()> {
    info!(
        "Fetching TIGER{} into {}",
        config.year,
        config.extract_dir.display()
    );
    let report = tiger_fetch::fetch(config).await?;
    display::display_fetch_report(&report);
    Ok(())
}

fn handle_groups(data_dir: &Path) -> Result<()> {
    let discovery = discover_groups(data_dir).map_err(describe)?;
    display::display_discovery(data_dir, &discovery);
    Ok(())
}

async fn handle_load(connection: &ConnectionConfig, config: &LoadConfig) -> Result<()> {
    config.validate().map_err(|e| describe(e.into()))?;

    info!("Loading {} into {}", config.data_dir.display(), connection.describe());
    let mut store = PostgisStore::connect(connection).await.map_err(describe)?;
    let report = pipeline::load(config, &mut store)
        .await
        .map_err(describe)?;

    display::display_load_report(&report);

    let failed = report.failed_groups().len();
    if failed > 0 {
        return Err(anyhow!(
            "{failed} of {} group(s) failed to load",
            report.groups.len()
        ));
    }
    if !report.rejected.is_empty() {
        warn!(
            "{} dataset director(ies) were skipped",
            report.rejected.len()
        );
    }
    Ok(())
}

/// Converts a library error into a CLI error carrying its recovery suggestion.
fn describe(error: TigerError) -> anyhow::Error {
    match error.recovery_suggestion() {
        Some(hint) => anyhow!("{}\n{hint}", error.user_message()),
        None => anyhow!(error.user_message()),
    }
}
