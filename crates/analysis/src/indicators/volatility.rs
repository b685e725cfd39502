use common::{Candle, Error, Result};

/// Bollinger channel values at the most recent bar: (upper, mid, lower, %B).
///
/// Computed on the typical price (H+L+C)/3 with a sample standard deviation
/// over the trailing `period` bars. %B places the close inside the channel
/// in percent; a collapsed channel reads as 50.
pub fn bollinger(candles: &[Candle], period: usize, mult: f64) -> Result<(f64, f64, f64, f64)> {
    if candles.len() < period {
        return Err(Error::InsufficientData {
            needed: period,
            got: candles.len(),
        });
    }

    let window = &candles[candles.len() - period..];
    let typical: Vec<f64> = window
        .iter()
        .map(|c| (c.high + c.low + c.close) / 3.0)
        .collect();
    let mean = typical.iter().sum::<f64>() / period as f64;
    let var = typical.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
    let std = var.sqrt();

    let upper = mean + mult * std;
    let lower = mean - mult * std;
    let close = candles.last().map(|c| c.close).unwrap_or(mean);
    let range = upper - lower;
    let position = if range > 0.0 {
        (close - lower) / range * 100.0
    } else {
        50.0
    };

    Ok((upper, mean, lower, position))
}

/// ATR: mean of the true range over the trailing `period` bars. The true
/// range needs the previous close, so `period + 1` candles are required.
pub fn atr(candles: &[Candle], period: usize) -> Result<f64> {
    if candles.len() < period + 1 {
        return Err(Error::InsufficientData {
            needed: period + 1,
            got: candles.len(),
        });
    }

    let start = candles.len() - period;
    let sum: f64 = (start..candles.len())
        .map(|i| true_range(&candles[i], &candles[i - 1]))
        .sum();
    Ok(sum / period as f64)
}

fn true_range(bar: &Candle, prev: &Candle) -> f64 {
    let hl = bar.high - bar.low;
    let hc = (bar.high - prev.close).abs();
    let lc = (bar.low - prev.close).abs();
    hl.max(hc).max(lc)
}
