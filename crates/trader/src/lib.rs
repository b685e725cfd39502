//! Leveraged position lifecycle: open, monitor, force-close.

pub mod manager;

pub use manager::{PositionManager, TraderConfig};
