use common::{Candle, Error, Result};

/// Stochastic oscillator: %K over the trailing `k_period` high/low window,
/// %D = `d_period`-bar SMA of %K. Returns (%K, %D) for the most recent bar.
/// A flat window (high == low) reads as 50.
pub fn stochastic(candles: &[Candle], k_period: usize, d_period: usize) -> Result<(f64, f64)> {
    let needed = k_period + d_period - 1;
    if candles.len() < needed {
        return Err(Error::InsufficientData {
            needed,
            got: candles.len(),
        });
    }

    // %K for the last d_period bars, each over its own trailing window
    let ks: Vec<f64> = (0..d_period)
        .map(|back| {
            let end = candles.len() - back;
            percent_k(&candles[end - k_period..end])
        })
        .collect();

    let k = ks[0];
    let d = ks.iter().sum::<f64>() / d_period as f64;
    Ok((k, d))
}

fn percent_k(window: &[Candle]) -> f64 {
    let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let close = window.last().map(|c| c.close).unwrap_or(low);
    if high > low {
        (close - low) / (high - low) * 100.0
    } else {
        50.0
    }
}
