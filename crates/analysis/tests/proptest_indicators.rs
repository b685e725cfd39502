use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use analysis::indicators::{self, ema, rsi};
use common::Candle;

fn candles_from(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            open_time: start + Duration::minutes(15 * i as i64),
            open: close,
            high: close * 1.001,
            low: close * 0.999,
            close,
            volume: 1_000.0,
        })
        .collect()
}

proptest! {
    #[test]
    fn rsi_stays_in_bounds(closes in prop::collection::vec(0.01f64..100_000.0, 15..200)) {
        let value = rsi::rsi(&closes, 14).unwrap();
        prop_assert!((0.0..=100.0).contains(&value), "rsi {} out of range", value);
    }

    #[test]
    fn ema_of_a_constant_series_is_the_constant(
        price in 0.01f64..100_000.0,
        len in 1usize..200,
        period in 1usize..60,
    ) {
        let closes = vec![price; len];
        let value = ema::ema_last(&closes, period);
        prop_assert!((value - price).abs() < 1e-6 * price.max(1.0));
    }

    #[test]
    fn ema_stays_inside_the_price_envelope(
        closes in prop::collection::vec(0.01f64..100_000.0, 2..200),
        period in 1usize..60,
    ) {
        let value = ema::ema_last(&closes, period);
        let min = closes.iter().cloned().fold(f64::MAX, f64::min);
        let max = closes.iter().cloned().fold(f64::MIN, f64::max);
        prop_assert!(value >= min - 1e-9 && value <= max + 1e-9);
    }

    #[test]
    fn full_snapshot_has_sane_ranges(closes in prop::collection::vec(0.01f64..100_000.0, 60..150)) {
        let candles = candles_from(&closes);
        let set = indicators::compute(&candles).unwrap();
        prop_assert!((0.0..=100.0).contains(&set.rsi));
        prop_assert!((0.0..=100.0).contains(&set.stoch_k));
        prop_assert!((0.0..=100.0).contains(&set.stoch_d));
        prop_assert!(set.bb_upper >= set.bb_mid && set.bb_mid >= set.bb_lower);
        prop_assert!(set.atr >= 0.0);
    }
}
