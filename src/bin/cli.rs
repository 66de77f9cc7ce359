//! porchmap CLI
//!
//! Resolves street addresses into building-entrance records by querying the
//! mapping service and extracting the embedded state document.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use porchmap::{
    error::Result,
    models::{AddressRow, Config},
    pipeline::run_resolver,
    services::HttpFetcher,
    storage::LocalSink,
};

/// porchmap - Building Entrance Resolver
#[derive(Parser, Debug)]
#[command(
    name = "porchmap",
    version,
    about = "Resolves street addresses into building-entrance records"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a delimited file of address rows (id,address,lat,lon,porch)
    Resolve {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Success output file, appended across resumed runs
        #[arg(short, long, default_value = "results.csv")]
        output: PathBuf,

        /// Accumulated failure file, merged across runs
        #[arg(long, default_value = "failures.json")]
        failures: PathBuf,
    },

    /// Resolve a newline-delimited list of bare addresses
    Lookup {
        /// Input address list, one address per line
        #[arg(short, long)]
        input: PathBuf,

        /// Success output file, appended across resumed runs
        #[arg(short, long, default_value = "results.csv")]
        output: PathBuf,

        /// Accumulated failure file, merged across runs
        #[arg(long, default_value = "failures.json")]
        failures: PathBuf,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("porchmap starting...");

    let config = Config::load_or_default(&cli.config);
    config.validate()?;
    let config = Arc::new(config);

    match cli.command {
        Command::Resolve {
            input,
            output,
            failures,
        } => {
            let rows = AddressRow::load_csv(&input)?;
            log::info!("Loaded {} rows from {}", rows.len(), input.display());
            run(config, rows, output, failures).await?;
        }

        Command::Lookup {
            input,
            output,
            failures,
        } => {
            let rows = AddressRow::load_list(&input)?;
            log::info!("Loaded {} addresses from {}", rows.len(), input.display());
            run(config, rows, output, failures).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            log::info!(
                "✓ Config OK ({} proxy entries, {} block signatures)",
                config.proxies.len(),
                config.blocks.captcha_url_markers.len()
                    + config.blocks.captcha_content_markers.len()
                    + config.blocks.outdated_phrases.len()
            );
        }
    }

    log::info!("Done!");

    Ok(())
}

/// Drive one resolution run against local output files.
async fn run(
    config: Arc<Config>,
    rows: Vec<AddressRow>,
    output: PathBuf,
    failures: PathBuf,
) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.fetcher);
    let mut sink = LocalSink::new(&output, &failures, config.output.clone());

    let stats = run_resolver(Arc::clone(&config), rows, fetcher, &mut sink).await?;

    log::info!("Saved successes to {}", output.display());
    if stats.failure_rows > 0 {
        log::info!("Saved failures to {}", failures.display());
    }
    log::info!(
        "Success: {}/{} ({}%)",
        stats.matched_rows,
        stats.rows,
        stats.success_percent()
    );
    Ok(())
}
