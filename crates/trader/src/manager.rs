//! The position manager is the only writer of position state. Exchange
//! acknowledgment comes first, local commit second: a failed order leaves the
//! book exactly as it was, and the next cycle retries from scratch.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use common::{
    CloseReason, Direction, Error, HistorySink, MarketData, Notifier, Opportunity, OrderGateway,
    Position, PositionStatus, Result, TradeRecord,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TraderConfig {
    /// Margin committed per position, in quote currency.
    pub position_size_usd: f64,
    /// Concurrent open-position cap across all instruments.
    pub max_positions: usize,
    /// Hard ceiling on the score-derived leverage.
    pub max_leverage: u32,
    /// Positions older than this are force-closed regardless of price.
    pub max_position_age_secs: i64,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            position_size_usd: 10.0,
            max_positions: 3,
            max_leverage: 10,
            max_position_age_secs: 86_400,
        }
    }
}

pub struct PositionManager {
    cfg: TraderConfig,
    gateway: Arc<dyn OrderGateway>,
    history: Arc<dyn HistorySink>,
    notifier: Arc<dyn Notifier>,
    open: HashMap<String, Position>,
}

impl PositionManager {
    pub fn new(
        cfg: TraderConfig,
        gateway: Arc<dyn OrderGateway>,
        history: Arc<dyn HistorySink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            cfg,
            gateway,
            history,
            notifier,
            open: HashMap::new(),
        }
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn has_capacity(&self) -> bool {
        self.open.len() < self.cfg.max_positions
    }

    pub fn is_open(&self, symbol: &str) -> bool {
        self.open.contains_key(symbol)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.open.values()
    }

    /// Score-stepped leverage, capped by config.
    pub fn leverage_for(&self, score: f64) -> u32 {
        let stepped = if score > 85.0 {
            10
        } else if score > 75.0 {
            7
        } else if score > 65.0 {
            5
        } else {
            3
        };
        stepped.min(self.cfg.max_leverage)
    }

    /// Open a position for a scored opportunity. `confidence` is the
    /// advisor-adjusted confidence that drives leverage selection. The
    /// exchange must acknowledge both the leverage change and the entry
    /// order before any local state changes.
    pub async fn try_open(&mut self, opp: &Opportunity, confidence: f64) -> Result<()> {
        if self.open.contains_key(&opp.symbol) {
            return Err(Error::InvariantViolation(format!(
                "position already open for {}",
                opp.symbol
            )));
        }
        if !self.has_capacity() {
            return Err(Error::Permanent(format!(
                "position cap {} reached",
                self.cfg.max_positions
            )));
        }
        if opp.entry_price <= 0.0 {
            return Err(Error::Permanent(format!(
                "non-positive entry price for {}",
                opp.symbol
            )));
        }

        let leverage = self.leverage_for(confidence);
        let amount = self.cfg.position_size_usd * f64::from(leverage) / opp.entry_price;

        self.gateway.set_leverage(&opp.symbol, leverage).await?;
        let order_id = self
            .gateway
            .market_order(&opp.symbol, opp.direction.entry_side(), amount)
            .await?;

        let now = Utc::now();
        let position = Position {
            symbol: opp.symbol.clone(),
            side: opp.direction,
            entry_price: opp.entry_price,
            amount,
            leverage,
            stop_price: opp.stop_price,
            target_price: opp.target_price,
            opened_at: now,
            status: PositionStatus::Open,
        };

        info!(
            symbol = %position.symbol,
            side = %position.side,
            entry = position.entry_price,
            stop = position.stop_price,
            target = position.target_price,
            leverage,
            %order_id,
            "position opened"
        );

        if let Err(err) = self.history.append(&TradeRecord::opened(&position, now)).await {
            warn!(symbol = %position.symbol, %err, "failed to record trade open");
        }
        self.notifier
            .notify(&format!(
                "OPEN {} {} @ {:.6} (lev {}x, stop {:.6}, target {:.6})",
                position.side,
                position.symbol,
                position.entry_price,
                leverage,
                position.stop_price,
                position.target_price
            ))
            .await;

        self.open.insert(position.symbol.clone(), position);
        Ok(())
    }

    /// Re-check every open position against the current price. A failed
    /// ticker fetch skips that position for this cycle; nothing is ever
    /// auto-closed on missing data. Returns the symbols closed.
    pub async fn check_positions(&mut self, market: &dyn MarketData) -> Vec<(String, CloseReason)> {
        let symbols: Vec<String> = self.open.keys().cloned().collect();
        let mut closed = Vec::new();

        for symbol in symbols {
            let price = match market.ticker(&symbol).await {
                Ok(ticker) => ticker.last_price,
                Err(err) => {
                    warn!(%symbol, %err, "ticker unavailable, skipping position check");
                    continue;
                }
            };

            let reason = match self.open.get(&symbol) {
                Some(position) => close_reason(position, price, self.cfg.max_position_age_secs),
                None => continue,
            };

            if let Some(reason) = reason {
                match self.close(&symbol, price, reason).await {
                    Ok(pnl) => {
                        info!(%symbol, %reason, exit = price, pnl, "position closed");
                        closed.push((symbol, reason));
                    }
                    Err(err) => {
                        warn!(%symbol, %err, "close failed, will retry next cycle");
                    }
                }
            }
        }
        closed
    }

    /// Close an open position with a reverse market order. The position
    /// stays on the book until the exchange acknowledges. Returns the PnL.
    pub async fn close(&mut self, symbol: &str, exit_price: f64, reason: CloseReason) -> Result<f64> {
        let position = self
            .open
            .get(symbol)
            .ok_or_else(|| Error::InvariantViolation(format!("no open position for {symbol}")))?
            .clone();

        self.gateway
            .market_order(symbol, position.side.exit_side(), position.amount)
            .await?;
        self.open.remove(symbol);

        let pnl = position_pnl(&position, exit_price);
        let now = Utc::now();
        if let Err(err) = self
            .history
            .append(&TradeRecord::closed(&position, exit_price, pnl, reason, now))
            .await
        {
            warn!(%symbol, %err, "failed to record trade close");
        }
        self.notifier
            .notify(&format!(
                "CLOSE {} {} @ {:.6} ({}, pnl {:+.4})",
                position.side, symbol, exit_price, reason, pnl
            ))
            .await;

        Ok(pnl)
    }
}

/// Stop beats target beats age when several triggers fire in one check.
fn close_reason(position: &Position, price: f64, max_age_secs: i64) -> Option<CloseReason> {
    let (stop_hit, target_hit) = match position.side {
        Direction::Long => (price <= position.stop_price, price >= position.target_price),
        Direction::Short => (price >= position.stop_price, price <= position.target_price),
    };
    if stop_hit {
        return Some(CloseReason::StopLoss);
    }
    if target_hit {
        return Some(CloseReason::TakeProfit);
    }
    if Utc::now() - position.opened_at > Duration::seconds(max_age_secs) {
        return Some(CloseReason::MaxDurationExceeded);
    }
    None
}

fn position_pnl(position: &Position, exit_price: f64) -> f64 {
    let raw = (exit_price - position.entry_price) * position.amount * f64::from(position.leverage);
    match position.side {
        Direction::Long => raw,
        Direction::Short => -raw,
    }
}
