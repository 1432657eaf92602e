mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::snapshot::SnapshotArgs;
use commands::valuation::{DiscountRateArgs, ValueArgs};

/// Discounted cash flow intrinsic-value estimates
#[derive(Parser)]
#[command(
    name = "ivx",
    version,
    about = "Discounted cash flow intrinsic-value estimates",
    long_about = "Estimate a company's intrinsic value per share from its operating \
                  cash flow, growth estimates and beta, with decimal precision. \
                  Inputs come from flags, a JSON/YAML file, or piped stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log to stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a beta coefficient to a discount rate
    DiscountRate(DiscountRateArgs),
    /// Value a company from USD-normalised inputs
    Value(ValueArgs),
    /// Normalise a raw market-data snapshot into valuation inputs
    Prepare(SnapshotArgs),
    /// Prepare a market-data snapshot and value it
    Analyze(SnapshotArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::DiscountRate(args) => commands::valuation::run_discount_rate(args),
        Commands::Value(args) => commands::valuation::run_value(args),
        Commands::Prepare(args) => commands::snapshot::run_prepare(args),
        Commands::Analyze(args) => commands::snapshot::run_analyze(args),
        Commands::Version => {
            println!("ivx {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
