use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use intrinsic_core::acquisition::{self, SnapshotInput};

use crate::input;

/// Arguments for commands that start from a raw market-data snapshot
#[derive(Args)]
pub struct SnapshotArgs {
    /// Path to a JSON or YAML snapshot file (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Forecast horizon in years (overrides the file)
    #[arg(long)]
    pub years: Option<u32>,

    /// Discount factor used when the snapshot has no beta (overrides the file)
    #[arg(long)]
    pub fallback_discount_rate: Option<Decimal>,
}

pub fn run_prepare(args: SnapshotArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = load_snapshot(&args)?;
    let result = acquisition::prepare_inputs(&snapshot)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_analyze(args: SnapshotArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = load_snapshot(&args)?;
    let result = acquisition::analyze_snapshot(&snapshot)?;
    Ok(serde_json::to_value(result)?)
}

fn load_snapshot(args: &SnapshotArgs) -> Result<SnapshotInput, Box<dyn std::error::Error>> {
    let mut snapshot: SnapshotInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file (or piped JSON) is required for a market snapshot".into());
    };

    if args.years.is_some() {
        snapshot.forecast_years = args.years;
    }
    if args.fallback_discount_rate.is_some() {
        snapshot.fallback_discount_rate = args.fallback_discount_rate;
    }
    Ok(snapshot)
}
