use async_trait::async_trait;
use tracing::debug;

use crate::{AdvisorView, Candle, OrderSide, Result, Ticker, Timeframe, TradeRecord};

/// Candle and ticker source for the scanner.
///
/// Implementations must map rate limits and timeouts to `Error::Transient`
/// and invalid instruments to `Error::Permanent` so the funnel's retry/skip
/// policy can tell them apart.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Last `limit` candles for the pair, oldest first.
    async fn candles(&self, symbol: &str, timeframe: Timeframe, limit: usize)
        -> Result<Vec<Candle>>;

    /// 24h ticker snapshot.
    async fn ticker(&self, symbol: &str) -> Result<Ticker>;

    /// The scan universe: up to `limit` instruments ranked by 24h quote
    /// volume, highest first.
    async fn universe(&self, limit: usize) -> Result<Vec<String>>;
}

/// Order execution collaborator. The position manager treats any error as
/// "open/close failed" and leaves its own state untouched.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()>;

    /// Submit a market order; returns the exchange order id on acknowledgment.
    async fn market_order(&self, symbol: &str, side: OrderSide, amount: f64) -> Result<String>;
}

/// Fire-and-forget append of trade-history records. The core never reads
/// back within a cycle.
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn append(&self, record: &TradeRecord) -> Result<()>;
}

/// Best-effort outbound notification. Implementations swallow delivery
/// failures; nothing here may propagate into the scan loop.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str);
}

/// Notifier for headless runs; logs at debug and drops the message.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, text: &str) {
        debug!(text, "notification dropped (no notifier configured)");
    }
}

/// Optional AI-advisory input to leverage selection and opportunity gating.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn confidence(&self, symbol: &str) -> Result<AdvisorView>;
}
