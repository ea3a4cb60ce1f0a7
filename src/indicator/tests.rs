use super::*;

use chrono::{Duration, TimeZone};

use crate::market::Candle;

fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle::new_simple(start + Duration::minutes(i as i64), close, 1_000.0))
        .collect()
}

#[test]
fn ema_is_seeded_by_first_close() {
    let engine = IndicatorEngine::new();
    let rows = engine.enrich(&candles_from_closes(&[120.0, 121.0, 119.5]));

    assert_eq!(rows[0].ema100, 120.0);
    assert_eq!(rows[0].ema200, 120.0);
}

#[test]
fn ema_of_constant_series_is_the_constant() {
    let engine = IndicatorEngine::new();
    let closes = vec![250.0; 300];
    let rows = engine.enrich(&candles_from_closes(&closes));

    for row in &rows {
        assert_eq!(row.ema100, 250.0);
        assert_eq!(row.ema200, 250.0);
    }
}

#[test]
fn sma_defined_once_window_is_full() {
    let engine = IndicatorEngine::new();
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let rows = engine.enrich(&candles_from_closes(&closes));

    assert_eq!(rows[7].sma9, None);
    // Mean of 100..=108
    assert_eq!(rows[8].sma9, Some(104.0));
    assert_eq!(rows[19].sma21, None);
    // Mean of 100..=120
    assert_eq!(rows[20].sma21, Some(110.0));
}

#[test]
fn rsi_undefined_during_warmup() {
    let engine = IndicatorEngine::new();
    let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
    let rows = engine.enrich(&candles_from_closes(&closes));

    for row in rows.iter().take(IndicatorEngine::RSI_PERIOD) {
        assert_eq!(row.rsi14, None);
    }
    assert!(rows[IndicatorEngine::RSI_PERIOD].rsi14.is_some());
}

#[test]
fn rsi_stays_within_bounds() {
    let engine = IndicatorEngine::new();
    let closes: Vec<f64> = (0..120)
        .map(|i| 100.0 + 5.0 * ((i as f64) * 0.7).sin() + (i % 7) as f64)
        .collect();
    let rows = engine.enrich(&candles_from_closes(&closes));

    for row in rows.iter().skip(IndicatorEngine::RSI_PERIOD) {
        let rsi = row.rsi14.expect("warmed up");
        assert!((0.0..=100.0).contains(&rsi), "rsi out of bounds: {rsi}");
    }
}

#[test]
fn rsi_is_exactly_100_when_loss_average_is_zero() {
    let engine = IndicatorEngine::new();
    // Strictly rising closes: no negative deltas in any window.
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let rows = engine.enrich(&candles_from_closes(&closes));

    for row in rows.iter().skip(IndicatorEngine::RSI_PERIOD) {
        assert_eq!(row.rsi14, Some(100.0));
    }
}

#[test]
fn rsi_balanced_gains_and_losses_is_50() {
    let engine = IndicatorEngine::new();
    // Alternating +1/-1 deltas: gain average equals loss average.
    let closes: Vec<f64> = (0..16)
        .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
        .collect();
    let rows = engine.enrich(&candles_from_closes(&closes));

    let rsi = rows[14].rsi14.expect("warmed up");
    assert!((rsi - 50.0).abs() < 1e-9);
}

#[test]
fn enrich_is_deterministic_and_preserves_order() {
    let engine = IndicatorEngine::new();
    let closes: Vec<f64> = (0..60).map(|i| 100.0 + ((i * 13) % 11) as f64).collect();
    let candles = candles_from_closes(&closes);

    let first = engine.enrich(&candles);
    let second = engine.enrich(&candles);

    assert_eq!(first, second);
    for (row, candle) in first.iter().zip(&candles) {
        assert_eq!(row.open_time, candle.open_time);
        assert_eq!(row.close, candle.close);
    }
}

#[test]
fn warmup_covers_the_slow_sma() {
    assert_eq!(IndicatorEngine::warmup_candles(), 21);

    let engine = IndicatorEngine::new();
    let closes: Vec<f64> = (0..21).map(|i| 100.0 + (i % 5) as f64).collect();
    let rows = engine.enrich(&candles_from_closes(&closes));

    assert!(rows.last().unwrap().warmed_up());
    assert!(!rows[rows.len() - 2].warmed_up());
}
