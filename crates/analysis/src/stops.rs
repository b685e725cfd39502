//! Volatility-scaled stop-loss and take-profit derivation.

use common::{Candle, Direction, Trend};

use crate::indicators::{self, ATR_PERIOD};

/// Bars considered when locating the most recent adverse extreme.
const EXTREME_LOOKBACK: usize = 12;

/// Derive (stop, target) for an entry at `entry` in `direction`, given the
/// finest-timeframe candle window and that timeframe's trend.
///
/// Stop distance = min(k · ATR, extreme_distance · f). A stronger trend gets
/// a wider multiplier: pullbacks are expected to be shallower, and the
/// position should not be stopped prematurely. The stop is floored at 1%
/// beyond the recent extreme, and the target sits at `risk × reward_ratio`.
///
/// Returns (0.0, 0.0) when the inputs are degenerate (too few bars for ATR,
/// non-positive entry, or price already beyond the recent extreme); callers
/// read that as "do not trade this instrument this cycle".
pub fn derive_stop_target(
    candles: &[Candle],
    direction: Direction,
    trend: Trend,
    entry: f64,
) -> (f64, f64) {
    if entry <= 0.0 {
        return (0.0, 0.0);
    }
    let atr = match indicators::volatility::atr(candles, ATR_PERIOD) {
        Ok(v) if v > 0.0 => v,
        _ => return (0.0, 0.0),
    };

    let (atr_mult, extreme_frac) = stop_multipliers(trend);
    let reward_ratio = if trend == Trend::StronglyBullish || trend == Trend::StronglyBearish {
        2.0
    } else {
        1.5
    };

    let lookback = &candles[candles.len().saturating_sub(EXTREME_LOOKBACK)..];
    match direction {
        Direction::Long => {
            let recent_low = lookback.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            let extreme_distance = entry - recent_low;
            if extreme_distance <= 0.0 {
                return (0.0, 0.0);
            }
            let stop_distance = (atr_mult * atr).min(extreme_distance * extreme_frac);
            let stop = (entry - stop_distance).max(recent_low * 0.99);
            let risk = entry - stop;
            (stop, entry + risk * reward_ratio)
        }
        Direction::Short => {
            let recent_high = lookback.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let extreme_distance = recent_high - entry;
            if extreme_distance <= 0.0 {
                return (0.0, 0.0);
            }
            let stop_distance = (atr_mult * atr).min(extreme_distance * extreme_frac);
            let stop = (entry + stop_distance).min(recent_high * 1.01);
            let risk = stop - entry;
            (stop, entry - risk * reward_ratio)
        }
    }
}

/// (ATR multiplier, extreme-distance fraction) by trend strength.
fn stop_multipliers(trend: Trend) -> (f64, f64) {
    match trend {
        Trend::StronglyBullish | Trend::StronglyBearish => (2.0, 0.9),
        Trend::Bullish | Trend::Bearish => (1.5, 0.8),
        Trend::Neutral => (1.0, 0.7),
    }
}
