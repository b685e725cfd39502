//! File-backed scanner configuration. Every section has defaults, so an
//! absent file means "run with the stock tuning".

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use analysis::{FunnelConfig, ScoreConfig};
use common::{Error, Result};
use trader::TraderConfig;

use crate::scheduler::SchedulerConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScannerFileConfig {
    pub funnel: FunnelConfig,
    pub score: ScoreConfig,
    pub trader: TraderConfig,
    pub scheduler: SchedulerConfig,
}

impl ScannerFileConfig {
    /// Load from a TOML file; a missing file yields the defaults, a present
    /// but malformed file is a hard error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no scanner config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|err| Error::Permanent(format!("bad scanner config {}: {err}", path.display())))
    }
}
