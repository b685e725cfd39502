use chrono::{Duration, TimeZone, Utc};
use common::Candle;

/// Build candles from close prices. High/low hug the close so EMA ordering
/// and true-range behavior stay predictable in tests.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                open_time: start + Duration::minutes(15 * i as i64),
                open,
                high: close.max(open) * 1.001,
                low: close.min(open) * 0.999,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

pub fn uptrend(n: usize, start: f64, step: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
    candles_from_closes(&closes)
}

pub fn downtrend(n: usize, start: f64, step: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n).map(|i| start - step * i as f64).collect();
    candles_from_closes(&closes)
}

pub fn flat(n: usize, price: f64) -> Vec<Candle> {
    candles_from_closes(&vec![price; n])
}
