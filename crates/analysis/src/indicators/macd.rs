use common::{Error, Result};

use super::ema::ema_series;

/// MACD line, signal line and histogram at the most recent bar.
///
/// MACD = EMA(fast) − EMA(slow); signal = EMA(signal_period) of the MACD
/// series; histogram = MACD − signal. Needs `slow + signal_period` closes so
/// the signal line has settled past its seed.
pub fn macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<(f64, f64, f64)> {
    debug_assert!(fast < slow, "MACD fast period must be less than slow");
    let needed = slow + signal_period;
    if closes.len() < needed {
        return Err(Error::InsufficientData {
            needed,
            got: closes.len(),
        });
    }

    let fast_series = ema_series(closes, fast);
    let slow_series = ema_series(closes, slow);
    let macd_series: Vec<f64> = fast_series
        .iter()
        .zip(&slow_series)
        .map(|(f, s)| f - s)
        .collect();
    let signal_series = ema_series(&macd_series, signal_period);

    let macd_line = *macd_series.last().unwrap_or(&0.0);
    let signal_line = *signal_series.last().unwrap_or(&0.0);
    Ok((macd_line, signal_line, macd_line - signal_line))
}
