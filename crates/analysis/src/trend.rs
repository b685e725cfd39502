//! Per-timeframe trend classification.
//!
//! Three integer votes — EMA ordering, RSI zone, MACD histogram sign — sum to
//! a total in [-4, 4] that maps onto the five-state [`Trend`] enum. Strength
//! is the normalized vote magnitude.

use common::{IndicatorSet, Timeframe, Trend, TrendAssessment};

/// Largest possible absolute vote total (EMA ±2, RSI ±1, MACD ±1).
const MAX_VOTES: f64 = 4.0;

/// Classify one (instrument, timeframe) from its indicator snapshot and the
/// latest close.
pub fn classify(
    symbol: &str,
    timeframe: Timeframe,
    close: f64,
    indicators: &IndicatorSet,
) -> TrendAssessment {
    let total = ema_vote(close, indicators) + rsi_vote(indicators.rsi) + macd_vote(indicators);

    let trend = if total >= 2 {
        Trend::StronglyBullish
    } else if total > 0 {
        Trend::Bullish
    } else if total <= -2 {
        Trend::StronglyBearish
    } else if total < 0 {
        Trend::Bearish
    } else {
        Trend::Neutral
    };

    TrendAssessment {
        symbol: symbol.to_string(),
        timeframe,
        trend,
        strength: (total.abs() as f64 / MAX_VOTES).min(1.0),
    }
}

/// Close vs fast vs mid EMA ordering: fully stacked is ±2, close on the
/// right side of the fast EMA alone is ±1.
fn ema_vote(close: f64, ind: &IndicatorSet) -> i32 {
    if close > ind.ema_fast && ind.ema_fast > ind.ema_mid {
        2
    } else if close < ind.ema_fast && ind.ema_fast < ind.ema_mid {
        -2
    } else if close > ind.ema_fast {
        1
    } else if close < ind.ema_fast {
        -1
    } else {
        0
    }
}

/// RSI zones: overbought/oversold vote against the move, the 55/45 momentum
/// bands vote with it.
fn rsi_vote(rsi: f64) -> i32 {
    if rsi >= 70.0 {
        -1
    } else if rsi <= 30.0 {
        1
    } else if rsi > 55.0 {
        1
    } else if rsi < 45.0 {
        -1
    } else {
        0
    }
}

fn macd_vote(ind: &IndicatorSet) -> i32 {
    if ind.macd_hist > 0.0 {
        1
    } else if ind.macd_hist < 0.0 {
        -1
    } else {
        0
    }
}
