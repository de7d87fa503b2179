//! Agri-Ledger - Development Tools

use std::path::PathBuf;

use agri_core::random::SeededRandom;
use agri_core::simulation::Farm;
use agri_tools::simulate::{self, Strategy};
use agri_tools::validate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agri-tools")]
#[command(about = "Development tools for Agri-Ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// One line per year
    Text,
    /// The whole run as RON
    Ron,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },
    /// Run a headless simulation
    Simulate {
        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Years to simulate
        #[arg(long, default_value_t = 20)]
        years: u32,
        /// Player behaviour between turns
        #[arg(long, value_enum, default_value_t = Strategy::Diversified)]
        strategy: Strategy,
        /// Load catalogs from this directory instead of the built-in ones
        #[arg(long)]
        data: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            match validate::validate_data_directory(&path) {
                Ok(summary) => tracing::info!(
                    crops = summary.crops,
                    animals = summary.animals,
                    structures = summary.structures,
                    instruments = summary.instruments,
                    events = summary.events,
                    "Validation passed"
                ),
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Simulate {
            seed,
            years,
            strategy,
            data,
            format,
        } => {
            let farm = match data {
                Some(dir) => validate::load_catalogs(&dir).map(|(economy, events)| {
                    Farm::new(economy, events, SeededRandom::new(seed))
                }),
                None => Farm::builtin(seed).map_err(validate::ValidationError::from),
            };
            let mut farm = match farm {
                Ok(farm) => farm,
                Err(e) => {
                    tracing::error!("Failed to load catalogs: {e}");
                    std::process::exit(1);
                }
            };

            tracing::info!(seed, years, ?strategy, "Simulating");
            let summary = simulate::run(&mut farm, years, strategy);
            match format {
                Format::Text => {
                    for line in &summary.years {
                        println!("{line}");
                    }
                    if summary.game_over {
                        println!("game over");
                    }
                    println!("state hash {:016x}", summary.final_hash);
                }
                Format::Ron => {
                    let pretty = ron::ser::PrettyConfig::default();
                    match ron::ser::to_string_pretty(&summary, pretty) {
                        Ok(text) => println!("{text}"),
                        Err(e) => {
                            tracing::error!("Failed to encode summary: {e}");
                            std::process::exit(1);
                        }
                    }
                }
            }
        }
    }
}
