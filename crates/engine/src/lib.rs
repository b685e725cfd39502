//! Scan orchestration: the Binance public-data client, the file-backed
//! scanner configuration, and the sequential scan scheduler.

pub mod binance;
pub mod config;
pub mod scheduler;

pub use binance::BinanceData;
pub use config::ScannerFileConfig;
pub use scheduler::{ScanScheduler, SchedulerConfig};
