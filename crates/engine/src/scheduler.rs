//! The scan scheduler: one strictly sequential loop per process.
//!
//! A cycle monitors open positions, refreshes the universe, runs the funnel,
//! scores the survivors, and opens at most one new position. Anything that
//! goes wrong inside a cycle is logged and the loop carries on; only the
//! shutdown flag stops it.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::watch;
use tracing::{info, warn};

use analysis::{score_outcomes, ScoreConfig, TrendFunnel};
use common::{Advisor, MarketData, Opportunity};
use trader::PositionManager;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Pause between cycles, in seconds.
    pub scan_interval_secs: u64,
    /// How many top-volume instruments to scan each cycle.
    pub universe_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 300,
            universe_size: 100,
        }
    }
}

pub struct ScanScheduler {
    cfg: SchedulerConfig,
    funnel: TrendFunnel,
    score_cfg: ScoreConfig,
    manager: PositionManager,
    market: Arc<dyn MarketData>,
    advisor: Option<Arc<dyn Advisor>>,
    shutdown: watch::Receiver<bool>,
}

impl ScanScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cfg: SchedulerConfig,
        funnel: TrendFunnel,
        score_cfg: ScoreConfig,
        manager: PositionManager,
        market: Arc<dyn MarketData>,
        advisor: Option<Arc<dyn Advisor>>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            cfg,
            funnel,
            score_cfg,
            manager,
            market,
            advisor,
            shutdown,
        }
    }

    /// Run until the shutdown flag flips. No new cycle starts after a stop
    /// request; the in-flight cycle finishes first.
    pub async fn run(mut self) {
        info!(
            interval_secs = self.cfg.scan_interval_secs,
            universe = self.cfg.universe_size,
            "scan scheduler started"
        );
        loop {
            if *self.shutdown.borrow() {
                break;
            }
            self.run_cycle().await;

            let sleep = Duration::from_secs(self.cfg.scan_interval_secs);
            tokio::select! {
                _ = tokio::time::sleep(sleep) => {}
                changed = self.shutdown.changed() => {
                    // Sender gone means nobody can ever request a stop
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("scan scheduler stopped");
    }

    /// One full scan cycle. Public for tests and one-shot runs.
    pub async fn run_cycle(&mut self) {
        let closed = self.manager.check_positions(self.market.as_ref()).await;
        if !closed.is_empty() {
            info!(count = closed.len(), "positions closed this cycle");
        }

        let symbols = match self.market.universe(self.cfg.universe_size).await {
            Ok(symbols) => symbols,
            Err(err) => {
                warn!(%err, "universe fetch failed, skipping cycle");
                return;
            }
        };
        if symbols.is_empty() {
            warn!("empty scan universe, skipping cycle");
            return;
        }

        let outcomes = self.funnel.run(&symbols).await;
        let opportunities = score_outcomes(&outcomes, &self.score_cfg);
        info!(
            scanned = symbols.len(),
            survivors = outcomes.len(),
            qualified = opportunities.len(),
            "scan cycle complete"
        );

        if !self.manager.has_capacity() {
            return;
        }

        // Walk the ranked list until one position opens; one entry per cycle.
        for opp in &opportunities {
            if self.manager.is_open(&opp.symbol) {
                continue;
            }
            let confidence = match self.gated_confidence(opp).await {
                Some(confidence) => confidence,
                None => continue,
            };
            match self.manager.try_open(opp, confidence).await {
                Ok(()) => break,
                Err(err) => {
                    warn!(symbol = %opp.symbol, %err, "open failed, trying next candidate");
                }
            }
        }
    }

    /// Advisor gate. Agreement substitutes the advisor's confidence for the
    /// technical one; disagreement skips the candidate; no advisor or a
    /// failing advisor discounts the technical score.
    async fn gated_confidence(&self, opp: &Opportunity) -> Option<f64> {
        let advisor = match &self.advisor {
            Some(advisor) => advisor,
            None => return Some(opp.score * 0.75),
        };
        match advisor.confidence(&opp.symbol).await {
            Ok(view) if view.direction == opp.direction => Some(view.confidence),
            Ok(view) => {
                info!(
                    symbol = %opp.symbol,
                    ours = %opp.direction,
                    theirs = %view.direction,
                    "advisor disagrees, skipping candidate"
                );
                None
            }
            Err(err) => {
                warn!(symbol = %opp.symbol, %err, "advisor unavailable, discounting score");
                Some(opp.score * 0.75)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    use analysis::FunnelConfig;
    use common::{
        AdvisorView, Candle, Direction, Error, HistorySink, NullNotifier, Result, Ticker,
        Timeframe, TradeRecord,
    };
    use paper::PaperGateway;
    use trader::TraderConfig;

    fn uptrend(len: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| {
                let close = 100.0 + 0.5 * i as f64;
                Candle {
                    open_time: start + ChronoDuration::minutes(15 * i as i64),
                    open: close,
                    high: close * 1.001,
                    low: close * 0.999,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    struct StaticMarket {
        symbols: Vec<String>,
        candles: Vec<Candle>,
    }

    #[async_trait]
    impl MarketData for StaticMarket {
        async fn candles(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            _limit: usize,
        ) -> Result<Vec<Candle>> {
            Ok(self.candles.clone())
        }

        async fn ticker(&self, _symbol: &str) -> Result<Ticker> {
            Ok(Ticker {
                last_price: self.candles.last().map(|c| c.close).unwrap_or(0.0),
                quote_volume: 1_000_000.0,
                pct_change_24h: 2.0,
            })
        }

        async fn universe(&self, limit: usize) -> Result<Vec<String>> {
            Ok(self.symbols.iter().take(limit).cloned().collect())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<TradeRecord>>,
    }

    #[async_trait]
    impl HistorySink for MemorySink {
        async fn append(&self, record: &TradeRecord) -> Result<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    struct FixedAdvisor {
        views: HashMap<String, AdvisorView>,
    }

    #[async_trait]
    impl Advisor for FixedAdvisor {
        async fn confidence(&self, symbol: &str) -> Result<AdvisorView> {
            self.views
                .get(symbol)
                .cloned()
                .ok_or_else(|| Error::Transient("advisor offline".into()))
        }
    }

    fn scheduler_with(
        market: Arc<dyn MarketData>,
        advisor: Option<Arc<dyn Advisor>>,
        shutdown: watch::Receiver<bool>,
    ) -> (ScanScheduler, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let manager = PositionManager::new(
            TraderConfig::default(),
            Arc::new(PaperGateway::new()),
            sink.clone(),
            Arc::new(NullNotifier),
        );
        let funnel_cfg = FunnelConfig {
            retry_delay_ms: 0,
            ..FunnelConfig::default()
        };
        let scheduler = ScanScheduler::new(
            SchedulerConfig::default(),
            TrendFunnel::new(funnel_cfg, market.clone()),
            ScoreConfig::default(),
            manager,
            market,
            advisor,
            shutdown,
        );
        (scheduler, sink)
    }

    #[tokio::test]
    async fn a_cycle_opens_at_most_one_position() {
        let market = Arc::new(StaticMarket {
            symbols: ["BTCUSDT", "ETHUSDT", "XRPUSDT", "SOLUSDT", "ADAUSDT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            candles: uptrend(80),
        });
        let (_tx, rx) = watch::channel(false);
        let (mut scheduler, sink) = scheduler_with(market, None, rx);

        scheduler.run_cycle().await;

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1, "five qualifying candidates, one entry");
    }

    #[tokio::test]
    async fn consecutive_cycles_fill_up_to_the_cap() {
        let market = Arc::new(StaticMarket {
            symbols: ["BTCUSDT", "ETHUSDT", "XRPUSDT", "SOLUSDT", "ADAUSDT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            candles: uptrend(80),
        });
        let (_tx, rx) = watch::channel(false);
        let (mut scheduler, sink) = scheduler_with(market, None, rx);

        for _ in 0..5 {
            scheduler.run_cycle().await;
        }

        // max_positions = 3; later cycles must not exceed the cap
        let opens = sink.records.lock().unwrap().len();
        assert_eq!(opens, 3);
        assert_eq!(scheduler.manager.open_count(), 3);
    }

    #[tokio::test]
    async fn conflicting_advisor_blocks_every_entry() {
        let market = Arc::new(StaticMarket {
            symbols: vec!["BTCUSDT".to_string()],
            candles: uptrend(80),
        });
        let advisor = Arc::new(FixedAdvisor {
            views: HashMap::from([(
                "BTCUSDT".to_string(),
                AdvisorView {
                    direction: Direction::Short,
                    confidence: 95.0,
                },
            )]),
        });
        let (_tx, rx) = watch::channel(false);
        let (mut scheduler, sink) = scheduler_with(market, Some(advisor), rx);

        scheduler.run_cycle().await;
        assert!(sink.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_advisor_falls_back_to_discounted_score() {
        let market = Arc::new(StaticMarket {
            symbols: vec!["BTCUSDT".to_string()],
            candles: uptrend(80),
        });
        // Advisor knows nothing about BTCUSDT, so every query errors
        let advisor = Arc::new(FixedAdvisor {
            views: HashMap::new(),
        });
        let (_tx, rx) = watch::channel(false);
        let (mut scheduler, sink) = scheduler_with(market, Some(advisor), rx);

        scheduler.run_cycle().await;
        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        // score 100 discounted to 75, which misses the >75 band → 5x
        assert_eq!(records[0].leverage, 5);
    }

    #[tokio::test]
    async fn shutdown_flag_stops_the_loop_before_a_cycle() {
        let market = Arc::new(StaticMarket {
            symbols: vec!["BTCUSDT".to_string()],
            candles: uptrend(80),
        });
        let (tx, rx) = watch::channel(true);
        let (scheduler, sink) = scheduler_with(market, None, rx);

        scheduler.run().await;
        drop(tx);
        assert!(sink.records.lock().unwrap().is_empty());
    }
}
