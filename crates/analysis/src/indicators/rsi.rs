use common::{Error, Result};

/// RSI with Wilder's smoothed moving average (same as TradingView / standard
/// RSI). Needs at least `period + 1` closes; all-losses-zero returns 100 by
/// convention.
pub fn rsi(closes: &[f64], period: usize) -> Result<f64> {
    if closes.len() < period + 1 {
        return Err(Error::InsufficientData {
            needed: period + 1,
            got: closes.len(),
        });
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let initial = &changes[..period];

    let mut avg_gain = initial.iter().filter(|&&c| c > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss =
        initial.iter().filter(|&&c| c < 0.0).map(|c| c.abs()).sum::<f64>() / period as f64;

    // Wilder smoothing over the remaining changes
    for &change in &changes[period..] {
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { change.abs() } else { 0.0 };
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return Ok(100.0);
    }

    let rs = avg_gain / avg_loss;
    Ok(100.0 - 100.0 / (1.0 + rs))
}
