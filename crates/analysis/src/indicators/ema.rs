/// Exponential moving average, recursive form with `alpha = 2 / (n + 1)`,
/// seeded with the first value (pandas `ewm(adjust=False)` semantics).
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() || period == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut current = values[0];
    out.push(current);
    for &v in &values[1..] {
        current = v * alpha + current * (1.0 - alpha);
        out.push(current);
    }
    out
}

/// EMA value at the most recent bar.
pub fn ema_last(values: &[f64], period: usize) -> f64 {
    ema_series(values, period).last().copied().unwrap_or(0.0)
}
