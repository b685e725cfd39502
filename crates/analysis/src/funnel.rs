//! Multi-timeframe trend funnel.
//!
//! Candidates cascade coarse to fine: every stage before the finest one must
//! agree with the scan bias or the instrument is dropped for the cycle. Any
//! fetch or data problem also drops the instrument (exclusion, never a crash);
//! the next cycle re-evaluates from scratch.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::debug;

use common::{Candle, MarketData, Result, Ticker, Timeframe, Trend, TrendAssessment};

use crate::{indicators, trend};

/// Which directional setups a scan is hunting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanBias {
    Long,
    Short,
    Both,
}

impl ScanBias {
    fn admits(&self, trend: Trend) -> bool {
        match self {
            ScanBias::Long => trend.is_bullish(),
            ScanBias::Short => trend.is_bearish(),
            ScanBias::Both => !matches!(trend, Trend::Neutral),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    /// Cascade stages, coarse first. The last entry is the entry timeframe.
    pub timeframes: Vec<Timeframe>,
    /// Candles fetched per stage.
    pub candle_limit: usize,
    /// Instruments analyzed concurrently.
    pub fetch_concurrency: usize,
    /// Delay before the single retry of a transient fetch failure.
    pub retry_delay_ms: u64,
    pub bias: ScanBias,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            timeframes: vec![Timeframe::Weekly, Timeframe::Hourly, Timeframe::Min15],
            candle_limit: 100,
            fetch_concurrency: 8,
            retry_delay_ms: 500,
            bias: ScanBias::Long,
        }
    }
}

/// One funnel stage's verdict plus the data that produced it.
#[derive(Debug, Clone)]
pub struct StageAnalysis {
    pub assessment: TrendAssessment,
    pub indicators: common::IndicatorSet,
    pub last_close: f64,
}

/// A survivor of the full cascade, ready for scoring.
#[derive(Debug, Clone)]
pub struct FunnelOutcome {
    pub symbol: String,
    /// Stage analyses, coarse first; same length as the configured cascade.
    pub stages: Vec<StageAnalysis>,
    /// The finest-timeframe candle window, kept for stop/target derivation.
    pub fine_candles: Vec<Candle>,
    pub ticker: Ticker,
}

pub struct TrendFunnel {
    cfg: FunnelConfig,
    market: Arc<dyn MarketData>,
}

impl TrendFunnel {
    pub fn new(cfg: FunnelConfig, market: Arc<dyn MarketData>) -> Self {
        Self { cfg, market }
    }

    /// Run the cascade over `symbols` and return the survivors. Order of the
    /// result is completion order; the scorer re-sorts.
    pub async fn run(&self, symbols: &[String]) -> Vec<FunnelOutcome> {
        stream::iter(symbols.iter().cloned())
            .map(|symbol| self.analyze(symbol))
            .buffer_unordered(self.cfg.fetch_concurrency.max(1))
            .filter_map(|outcome| async move { outcome })
            .collect()
            .await
    }

    async fn analyze(&self, symbol: String) -> Option<FunnelOutcome> {
        let last = self.cfg.timeframes.len().checked_sub(1)?;
        let mut stages = Vec::with_capacity(self.cfg.timeframes.len());
        let mut fine_candles = Vec::new();

        for (i, timeframe) in self.cfg.timeframes.iter().copied().enumerate() {
            let candles = match self.candles_with_retry(&symbol, timeframe).await {
                Ok(candles) => candles,
                Err(err) => {
                    debug!(%symbol, %timeframe, %err, "dropping candidate: candle fetch failed");
                    return None;
                }
            };
            let snapshot = match indicators::compute(&candles) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    debug!(%symbol, %timeframe, %err, "dropping candidate: indicator window");
                    return None;
                }
            };
            let last_close = candles.last()?.close;
            let assessment = trend::classify(&symbol, timeframe, last_close, &snapshot);

            // Gate every stage except the entry timeframe; the finest stage
            // only informs scoring and stop placement.
            if i < last && !self.cfg.bias.admits(assessment.trend) {
                debug!(%symbol, %timeframe, trend = %assessment.trend, "funnel gate rejected");
                return None;
            }

            stages.push(StageAnalysis {
                assessment,
                indicators: snapshot,
                last_close,
            });
            if i == last {
                fine_candles = candles;
            }
        }

        let ticker = match self.market.ticker(&symbol).await {
            Ok(ticker) => ticker,
            Err(err) => {
                debug!(%symbol, %err, "dropping candidate: ticker fetch failed");
                return None;
            }
        };

        Some(FunnelOutcome {
            symbol,
            stages,
            fine_candles,
            ticker,
        })
    }

    /// One fetch plus one delayed retry for transient failures. Permanent
    /// errors surface immediately.
    async fn candles_with_retry(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>> {
        match self
            .market
            .candles(symbol, timeframe, self.cfg.candle_limit)
            .await
        {
            Err(err) if err.is_transient() => {
                debug!(%symbol, %timeframe, %err, "transient fetch failure, retrying once");
                tokio::time::sleep(Duration::from_millis(self.cfg.retry_delay_ms)).await;
                self.market
                    .candles(symbol, timeframe, self.cfg.candle_limit)
                    .await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use common::Error;

    use crate::testutil::{downtrend, uptrend};

    struct MockMarket {
        candles: HashMap<(String, Timeframe), Vec<Candle>>,
        transient_until: AtomicUsize,
        calls: AtomicUsize,
    }

    impl MockMarket {
        fn new() -> Self {
            Self {
                candles: HashMap::new(),
                transient_until: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        fn with(mut self, symbol: &str, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
            self.candles
                .insert((symbol.to_string(), timeframe), candles);
            self
        }

        fn failing_first(self, n: usize) -> Self {
            self.transient_until.store(n, Ordering::SeqCst);
            self
        }
    }

    #[async_trait]
    impl MarketData for MockMarket {
        async fn candles(
            &self,
            symbol: &str,
            timeframe: Timeframe,
            _limit: usize,
        ) -> Result<Vec<Candle>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.transient_until.load(Ordering::SeqCst) {
                return Err(Error::Transient("simulated rate limit".into()));
            }
            self.candles
                .get(&(symbol.to_string(), timeframe))
                .cloned()
                .ok_or_else(|| Error::Permanent(format!("no data for {symbol} {timeframe}")))
        }

        async fn ticker(&self, _symbol: &str) -> Result<Ticker> {
            Ok(Ticker {
                last_price: 100.0,
                quote_volume: 1_000_000.0,
                pct_change_24h: 2.5,
            })
        }

        async fn universe(&self, _limit: usize) -> Result<Vec<String>> {
            Ok(vec![])
        }
    }

    fn cfg() -> FunnelConfig {
        FunnelConfig {
            retry_delay_ms: 0,
            ..FunnelConfig::default()
        }
    }

    #[tokio::test]
    async fn aligned_uptrend_survives_the_cascade() {
        let market = MockMarket::new()
            .with("BTCUSDT", Timeframe::Weekly, uptrend(80, 100.0, 0.5))
            .with("BTCUSDT", Timeframe::Hourly, uptrend(80, 100.0, 0.5))
            .with("BTCUSDT", Timeframe::Min15, uptrend(80, 100.0, 0.5));
        let funnel = TrendFunnel::new(cfg(), Arc::new(market));

        let outcomes = funnel.run(&["BTCUSDT".to_string()]).await;
        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert_eq!(outcome.stages.len(), 3);
        assert_eq!(outcome.fine_candles.len(), 80);
        assert!(outcome.stages[0].assessment.trend.is_bullish());
    }

    #[tokio::test]
    async fn bearish_coarse_stage_excludes_a_long_scan() {
        let market = MockMarket::new()
            .with("BTCUSDT", Timeframe::Weekly, downtrend(80, 200.0, 0.5))
            .with("BTCUSDT", Timeframe::Hourly, uptrend(80, 100.0, 0.5))
            .with("BTCUSDT", Timeframe::Min15, uptrend(80, 100.0, 0.5));
        let funnel = TrendFunnel::new(cfg(), Arc::new(market));

        let outcomes = funnel.run(&["BTCUSDT".to_string()]).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn bearish_entry_stage_is_not_gated() {
        // Only stages before the finest are bias-gated
        let market = MockMarket::new()
            .with("BTCUSDT", Timeframe::Weekly, uptrend(80, 100.0, 0.5))
            .with("BTCUSDT", Timeframe::Hourly, uptrend(80, 100.0, 0.5))
            .with("BTCUSDT", Timeframe::Min15, downtrend(80, 200.0, 0.5));
        let funnel = TrendFunnel::new(cfg(), Arc::new(market));

        let outcomes = funnel.run(&["BTCUSDT".to_string()]).await;
        assert_eq!(outcomes.len(), 1);
    }

    #[tokio::test]
    async fn insufficient_data_excludes_without_error() {
        let market = MockMarket::new()
            .with("NEWUSDT", Timeframe::Weekly, uptrend(10, 100.0, 0.5))
            .with("NEWUSDT", Timeframe::Hourly, uptrend(80, 100.0, 0.5))
            .with("NEWUSDT", Timeframe::Min15, uptrend(80, 100.0, 0.5));
        let funnel = TrendFunnel::new(cfg(), Arc::new(market));

        let outcomes = funnel.run(&["NEWUSDT".to_string()]).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let market = MockMarket::new()
            .with("BTCUSDT", Timeframe::Weekly, uptrend(80, 100.0, 0.5))
            .with("BTCUSDT", Timeframe::Hourly, uptrend(80, 100.0, 0.5))
            .with("BTCUSDT", Timeframe::Min15, uptrend(80, 100.0, 0.5))
            .failing_first(1);
        let funnel = TrendFunnel::new(cfg(), Arc::new(market));

        let outcomes = funnel.run(&["BTCUSDT".to_string()]).await;
        assert_eq!(outcomes.len(), 1, "first transient failure should be retried");
    }

    #[tokio::test]
    async fn one_bad_symbol_does_not_poison_the_batch() {
        let market = MockMarket::new()
            .with("BTCUSDT", Timeframe::Weekly, uptrend(80, 100.0, 0.5))
            .with("BTCUSDT", Timeframe::Hourly, uptrend(80, 100.0, 0.5))
            .with("BTCUSDT", Timeframe::Min15, uptrend(80, 100.0, 0.5));
        // ETHUSDT has no data at all: Permanent error, silently dropped
        let funnel = TrendFunnel::new(cfg(), Arc::new(market));

        let outcomes = funnel
            .run(&["ETHUSDT".to_string(), "BTCUSDT".to_string()])
            .await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].symbol, "BTCUSDT");
    }
}
