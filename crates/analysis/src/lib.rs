pub mod funnel;
pub mod indicators;
pub mod scorer;
pub mod stops;
pub mod trend;

pub use funnel::{FunnelConfig, FunnelOutcome, ScanBias, StageAnalysis, TrendFunnel};
pub use scorer::{score_outcomes, ScoreConfig};
pub use stops::derive_stop_target;
pub use trend::classify;

#[cfg(test)]
pub(crate) mod testutil;
