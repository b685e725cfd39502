pub mod collab;
pub mod config;
pub mod error;
pub mod types;

pub use collab::{Advisor, HistorySink, MarketData, Notifier, NullNotifier, OrderGateway};
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
