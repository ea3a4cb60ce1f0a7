use chrono::{DateTime, Utc};

use crate::market::Candle;

/// Running lowest/highest close since the tracker was constructed.
///
/// The first `update` scans the entire series it is given; every later call
/// only considers candles strictly newer than the last check, so the stored
/// extrema never relax: the lowest only decreases or stays, the highest only
/// increases or stays. A fresh hunting phase starts by constructing a new
/// tracker.
///
/// The distance between the latest close and these extrema is the
/// "pullback confirmed" filter used by the entry predicates.
#[derive(Debug, Clone, Default)]
pub struct ExtremaTracker {
    lowest_close: Option<f64>,
    highest_close: Option<f64>,
    last_check_time: Option<DateTime<Utc>>,
}

impl ExtremaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends the stored extrema with any candle newer than the last check
    /// and returns the updated `(lowest, highest)` pair.
    ///
    /// Returns `None` only if the tracker has never seen a candle.
    pub fn update(&mut self, candles: &[Candle]) -> Option<(f64, f64)> {
        for candle in candles {
            if let Some(last_check) = self.last_check_time
                && candle.open_time <= last_check
            {
                continue;
            }

            self.lowest_close = Some(match self.lowest_close {
                Some(lowest) => lowest.min(candle.close),
                None => candle.close,
            });
            self.highest_close = Some(match self.highest_close {
                Some(highest) => highest.max(candle.close),
                None => candle.close,
            });
            self.last_check_time = Some(candle.open_time);
        }

        self.extrema()
    }

    /// Returns the current `(lowest, highest)` pair without updating.
    pub fn extrema(&self) -> Option<(f64, f64)> {
        self.lowest_close.zip(self.highest_close)
    }
}
