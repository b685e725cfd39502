use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bar. Immutable once fetched; series are ordered oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// 24h ticker snapshot for an instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub last_price: f64,
    pub quote_volume: f64,
    pub pct_change_24h: f64,
}

/// Candle aggregation period, ordered coarse to fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1w")]
    Weekly,
    #[serde(rename = "4h")]
    FourHour,
    #[serde(rename = "1h")]
    Hourly,
    #[serde(rename = "15m")]
    Min15,
}

impl Timeframe {
    /// Exchange interval string ("1w", "4h", "1h", "15m").
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::Weekly => "1w",
            Timeframe::FourHour => "4h",
            Timeframe::Hourly => "1h",
            Timeframe::Min15 => "15m",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.interval())
    }
}

/// Read-only indicator snapshot for the most recent bar of one candle window.
/// Recomputed every scan cycle; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: f64,
    pub ema_fast: f64,
    pub ema_mid: f64,
    pub ema_slow: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub bb_upper: f64,
    pub bb_mid: f64,
    pub bb_lower: f64,
    /// %B: position of the close inside the Bollinger channel, in percent.
    pub bb_position_pct: f64,
    pub atr: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    /// Latest bar's volume vs the SMA of the prior 20 volumes, in percent.
    pub volume_change_pct: f64,
}

/// Five-state trend classification for one (instrument, timeframe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    StronglyBullish,
    Bullish,
    Neutral,
    Bearish,
    StronglyBearish,
}

impl Trend {
    /// Signed magnitude in {-2..2} used by the weighted scorer.
    pub fn signed(&self) -> i8 {
        match self {
            Trend::StronglyBullish => 2,
            Trend::Bullish => 1,
            Trend::Neutral => 0,
            Trend::Bearish => -1,
            Trend::StronglyBearish => -2,
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Trend::Bullish | Trend::StronglyBullish)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Trend::Bearish | Trend::StronglyBearish)
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Trend::StronglyBullish => "STRONGLY_BULLISH",
            Trend::Bullish => "BULLISH",
            Trend::Neutral => "NEUTRAL",
            Trend::Bearish => "BEARISH",
            Trend::StronglyBearish => "STRONGLY_BEARISH",
        };
        write!(f, "{s}")
    }
}

/// Trend verdict for one (instrument, timeframe) in one cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAssessment {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub trend: Trend,
    /// Normalized vote magnitude in [0, 1].
    pub strength: f64,
}

/// Trade direction of an opportunity or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn entry_side(&self) -> OrderSide {
        match self {
            Direction::Long => OrderSide::Buy,
            Direction::Short => OrderSide::Sell,
        }
    }

    pub fn exit_side(&self) -> OrderSide {
        match self {
            Direction::Long => OrderSide::Sell,
            Direction::Short => OrderSide::Buy,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Side of an order sent to the execution gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// A scored, directional trade candidate not yet committed to a position.
/// Created fresh each scan cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub symbol: String,
    pub direction: Direction,
    /// Composite score in [0, 100].
    pub score: f64,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub risk_reward: f64,
    /// Weighted trend score in [-2, 2]; sign decided the direction.
    pub weighted_trend: f64,
    /// The per-timeframe assessments that produced this candidate, coarse first.
    pub trends: Vec<TrendAssessment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// A live, sized, leveraged exposure. Owned exclusively by the position
/// manager from open to close; identity is the instrument symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Direction,
    pub entry_price: f64,
    pub amount: f64,
    pub leverage: u32,
    pub stop_price: f64,
    pub target_price: f64,
    pub opened_at: DateTime<Utc>,
    pub status: PositionStatus,
}

/// Why a position was force-closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    MaxDurationExceeded,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::StopLoss => write!(f, "stop_loss"),
            CloseReason::TakeProfit => write!(f, "take_profit"),
            CloseReason::MaxDurationExceeded => write!(f, "max_duration_exceeded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Open,
    Close,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Open => write!(f, "OPEN"),
            TradeAction::Close => write!(f, "CLOSE"),
        }
    }
}

/// Append-only trade-history entry: a flattened position snapshot plus exit
/// fields for CLOSE records. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub action: TradeAction,
    pub symbol: String,
    pub side: Direction,
    pub entry_price: f64,
    pub amount: f64,
    pub leverage: u32,
    pub stop_price: f64,
    pub target_price: f64,
    pub opened_at: DateTime<Utc>,
    pub exit_price: Option<f64>,
    pub pnl: Option<f64>,
    pub reason: Option<CloseReason>,
    pub recorded_at: DateTime<Utc>,
}

impl TradeRecord {
    /// OPEN record for a freshly committed position.
    pub fn opened(position: &Position, now: DateTime<Utc>) -> Self {
        Self {
            action: TradeAction::Open,
            symbol: position.symbol.clone(),
            side: position.side,
            entry_price: position.entry_price,
            amount: position.amount,
            leverage: position.leverage,
            stop_price: position.stop_price,
            target_price: position.target_price,
            opened_at: position.opened_at,
            exit_price: None,
            pnl: None,
            reason: None,
            recorded_at: now,
        }
    }

    /// CLOSE record merging the original position fields with exit fields.
    pub fn closed(
        position: &Position,
        exit_price: f64,
        pnl: f64,
        reason: CloseReason,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            action: TradeAction::Close,
            exit_price: Some(exit_price),
            pnl: Some(pnl),
            reason: Some(reason),
            recorded_at: now,
            ..Self::opened(position, now)
        }
    }
}

/// Directional confidence returned by the optional AI advisory collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorView {
    pub direction: Direction,
    /// Confidence in [0, 100].
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_signed_is_antisymmetric() {
        assert_eq!(Trend::StronglyBullish.signed(), -Trend::StronglyBearish.signed());
        assert_eq!(Trend::Bullish.signed(), -Trend::Bearish.signed());
        assert_eq!(Trend::Neutral.signed(), 0);
    }

    #[test]
    fn direction_sides_invert_on_exit() {
        assert_eq!(Direction::Long.entry_side(), OrderSide::Buy);
        assert_eq!(Direction::Long.exit_side(), OrderSide::Sell);
        assert_eq!(Direction::Short.entry_side(), OrderSide::Sell);
        assert_eq!(Direction::Short.exit_side(), OrderSide::Buy);
    }

    #[test]
    fn close_record_keeps_the_open_snapshot() {
        let now = Utc::now();
        let position = Position {
            symbol: "BTCUSDT".into(),
            side: Direction::Long,
            entry_price: 100.0,
            amount: 0.5,
            leverage: 5,
            stop_price: 98.0,
            target_price: 104.0,
            opened_at: now,
            status: PositionStatus::Open,
        };
        let record = TradeRecord::closed(&position, 104.0, 10.0, CloseReason::TakeProfit, now);
        assert_eq!(record.action, TradeAction::Close);
        assert_eq!(record.entry_price, 100.0);
        assert_eq!(record.leverage, 5);
        assert_eq!(record.exit_price, Some(104.0));
        assert_eq!(record.reason, Some(CloseReason::TakeProfit));
    }

    #[test]
    fn timeframe_serde_uses_exchange_intervals() {
        let parsed: Vec<Timeframe> = serde_json::from_str(r#"["1w","4h","1h","15m"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Timeframe::Weekly,
                Timeframe::FourHour,
                Timeframe::Hourly,
                Timeframe::Min15
            ]
        );
        assert_eq!(Timeframe::Min15.to_string(), "15m");
    }
}
