use chrono::{DateTime, Utc};

use crate::market::Candle;

#[cfg(test)]
mod tests;

/// A candle annotated with the derived indicator values for its close.
///
/// RSI and the SMAs carry an explicit "insufficient data" state (`None`)
/// until their trailing windows are full. The EMAs follow the
/// adjust-free recursive convention, seeded by the first observed close,
/// so they are defined from the first row.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub rsi14: Option<f64>,
    pub ema100: f64,
    pub ema200: f64,
    pub sma9: Option<f64>,
    pub sma21: Option<f64>,
}

impl IndicatorRow {
    /// Returns `true` once every indicator on this row is defined.
    pub fn warmed_up(&self) -> bool {
        self.rsi14.is_some() && self.sma9.is_some() && self.sma21.is_some()
    }
}

/// Computes the indicator set over a candle series.
///
/// `enrich` is a pure function of the input sequence: re-running it on the
/// same series produces the same rows and has no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Trailing window for the RSI.
    pub const RSI_PERIOD: usize = 14;

    /// Span of the fast trend-filter EMA.
    pub const EMA_FAST_SPAN: usize = 100;

    /// Span of the slow trend-filter EMA.
    pub const EMA_SLOW_SPAN: usize = 200;

    /// Window of the fast SMA.
    pub const SMA_FAST_WINDOW: usize = 9;

    /// Window of the slow SMA.
    pub const SMA_SLOW_WINDOW: usize = 21;

    pub fn new() -> Self {
        Self
    }

    /// Number of candles required before every indicator is defined.
    ///
    /// The RSI needs `RSI_PERIOD` deltas (one more close); the slow SMA
    /// needs a full window of closes.
    pub const fn warmup_candles() -> usize {
        let rsi_candles = Self::RSI_PERIOD + 1;
        if rsi_candles > Self::SMA_SLOW_WINDOW {
            rsi_candles
        } else {
            Self::SMA_SLOW_WINDOW
        }
    }

    /// Annotates the candle series with indicator values, preserving order.
    pub fn enrich(&self, candles: &[Candle]) -> Vec<IndicatorRow> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let ema100 = ema(&closes, Self::EMA_FAST_SPAN);
        let ema200 = ema(&closes, Self::EMA_SLOW_SPAN);
        let sma9 = sma(&closes, Self::SMA_FAST_WINDOW);
        let sma21 = sma(&closes, Self::SMA_SLOW_WINDOW);
        let rsi14 = rsi(&closes, Self::RSI_PERIOD);

        candles
            .iter()
            .enumerate()
            .map(|(i, candle)| IndicatorRow {
                open_time: candle.open_time,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume,
                rsi14: rsi14[i],
                ema100: ema100[i],
                ema200: ema200[i],
                sma9: sma9[i],
                sma21: sma21[i],
            })
            .collect()
    }
}

/// Recursive exponential moving average, seeded by the first close.
///
/// `ema[0] = close[0]`, `ema[i] = alpha * close[i] + (1 - alpha) * ema[i-1]`
/// with `alpha = 2 / (span + 1)`.
fn ema(closes: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);

    let mut values = Vec::with_capacity(closes.len());
    let mut prev = None;

    for &close in closes {
        let value = match prev {
            None => close,
            // Algebraically `alpha * close + (1 - alpha) * prev`; this form
            // keeps a constant series exactly constant.
            Some(prev) => prev + alpha * (close - prev),
        };
        values.push(value);
        prev = Some(value);
    }

    values
}

/// Simple trailing mean; `None` until `window` samples are available.
fn sma(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(closes.len());
    let mut running_sum = 0.0;

    for (i, &close) in closes.iter().enumerate() {
        running_sum += close;
        if i + 1 < window {
            values.push(None);
            continue;
        }
        if i + 1 > window {
            running_sum -= closes[i - window];
        }
        values.push(Some(running_sum / window as f64));
    }

    values
}

/// Relative Strength Index over period-over-period close deltas.
///
/// Average positive delta over the trailing window is the gain, average
/// magnitude of negative deltas the loss; RSI = 100 - 100 / (1 + gain/loss).
/// A zero loss average means infinite relative strength and is reported as
/// exactly 100, never NaN.
fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len().min(period)];

    if closes.len() <= period {
        return values;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    for i in period..closes.len() {
        // Deltas `i - period .. i` form the trailing window for close `i`.
        let window = &deltas[i - period..i];

        let gain: f64 = window.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
        let loss: f64 = -window.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

        let value = if loss == 0.0 {
            100.0
        } else {
            let rs = gain / loss;
            100.0 - 100.0 / (1.0 + rs)
        };

        values.push(Some(value));
    }

    values
}
