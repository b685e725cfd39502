//! Pure indicator calculator: one ordered candle window in, one
//! [`IndicatorSet`] snapshot for the most recent bar out. No I/O.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod stoch;
pub mod volatility;

use common::{Candle, Error, IndicatorSet, Result};

pub const RSI_PERIOD: usize = 14;
pub const EMA_FAST: usize = 9;
pub const EMA_MID: usize = 20;
pub const EMA_SLOW: usize = 50;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BB_PERIOD: usize = 20;
pub const BB_MULT: f64 = 2.0;
pub const ATR_PERIOD: usize = 14;
pub const STOCH_K: usize = 14;
pub const STOCH_D: usize = 3;
pub const VOLUME_SMA: usize = 20;

/// Minimum window length for a full indicator set: the slowest EMA lookback
/// dominates every other requirement above.
pub const MIN_BARS: usize = EMA_SLOW;

/// Compute the full indicator set from one candle window (oldest first).
///
/// Everything is derived from the same window so the indicators cannot skew
/// in time against each other. Fails with `InsufficientData` when the window
/// is shorter than [`MIN_BARS`]; callers treat that as skip, not fatal.
pub fn compute(candles: &[Candle]) -> Result<IndicatorSet> {
    if candles.len() < MIN_BARS {
        return Err(Error::InsufficientData {
            needed: MIN_BARS,
            got: candles.len(),
        });
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let rsi = rsi::rsi(&closes, RSI_PERIOD)?;
    let ema_fast = ema::ema_last(&closes, EMA_FAST);
    let ema_mid = ema::ema_last(&closes, EMA_MID);
    let ema_slow = ema::ema_last(&closes, EMA_SLOW);
    let (macd, macd_signal, macd_hist) = macd::macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL)?;
    let (bb_upper, bb_mid, bb_lower, bb_position_pct) =
        volatility::bollinger(candles, BB_PERIOD, BB_MULT)?;
    let atr = volatility::atr(candles, ATR_PERIOD)?;
    let (stoch_k, stoch_d) = stoch::stochastic(candles, STOCH_K, STOCH_D)?;

    Ok(IndicatorSet {
        rsi,
        ema_fast,
        ema_mid,
        ema_slow,
        macd,
        macd_signal,
        macd_hist,
        bb_upper,
        bb_mid,
        bb_lower,
        bb_position_pct,
        atr,
        stoch_k,
        stoch_d,
        volume_change_pct: volume_change(candles),
    })
}

/// Latest bar's volume against the SMA of the prior `VOLUME_SMA` bars, in
/// percent. One windowing convention for the whole system.
fn volume_change(candles: &[Candle]) -> f64 {
    let n = candles.len();
    if n < VOLUME_SMA + 1 {
        return 0.0;
    }
    let prior = &candles[n - 1 - VOLUME_SMA..n - 1];
    let mean = prior.iter().map(|c| c.volume).sum::<f64>() / VOLUME_SMA as f64;
    if mean > 0.0 {
        (candles[n - 1].volume - mean) / mean * 100.0
    } else {
        0.0
    }
}
