pub mod prepare;
pub mod snapshot;

pub use prepare::{analyze_snapshot, prepare_inputs};
pub use snapshot::{CashFlowPeriod, MarketSnapshot, SnapshotInput};
