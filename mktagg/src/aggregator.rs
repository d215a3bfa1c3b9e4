use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use saifu_model::{AggregatedBatch, Quote};

/// Tumbling-window quote aggregator (`spec.md` §4.4), grounded on
/// `original_source/mktagg/app.py::WindowAggregator`.
///
/// `now` is threaded in explicitly rather than read from the clock
/// internally, so the window-close boundary can be driven deterministically
/// from tests without sleeping.
#[derive(Debug)]
pub struct WindowAggregator {
    window: Duration,
    window_end: DateTime<Utc>,
    aggregation: HashMap<String, Quote>,
}

impl WindowAggregator {
    /// `start_immediate` resolves `spec.md` §9's open question: when
    /// `true` (the default), `window_end` starts at `now`, so the very
    /// first incoming quote closes a window; when `false`, the first
    /// window runs a full `window` before closing.
    pub fn new(window: Duration, start_immediate: bool, now: DateTime<Utc>) -> Self {
        let window_end = if start_immediate { now } else { now + window };
        Self {
            window,
            window_end,
            aggregation: HashMap::new(),
        }
    }

    /// Upserts `quote` into the current window (last-write-wins per
    /// ticker) and closes the window if `now` has reached `window_end`,
    /// returning the closed batch.
    pub fn aggregate(&mut self, quote: Quote, now: DateTime<Utc>) -> Option<AggregatedBatch> {
        self.aggregation.insert(quote.ticker.clone(), quote);

        if now >= self.window_end {
            let batch = AggregatedBatch::from(std::mem::take(&mut self.aggregation));
            self.window_end = now + self.window;
            Some(batch)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(seconds)
    }

    #[test]
    fn start_immediate_closes_on_the_first_quote() {
        let mut aggregator = WindowAggregator::new(Duration::seconds(60), true, at(0));
        let batch = aggregator.aggregate(Quote::new("BTCUSD", dec!(100), at(0)), at(0));
        assert!(batch.is_some());
        assert_eq!(batch.unwrap().len(), 1);
    }

    #[test]
    fn non_immediate_waits_a_full_window_before_the_first_close() {
        let mut aggregator = WindowAggregator::new(Duration::seconds(60), false, at(0));
        let batch = aggregator.aggregate(Quote::new("BTCUSD", dec!(100), at(0)), at(0));
        assert!(batch.is_none());

        let batch = aggregator.aggregate(Quote::new("BTCUSD", dec!(101), at(0)), at(60));
        assert!(batch.is_some());
    }

    #[test]
    fn last_write_wins_within_one_window() {
        let mut aggregator = WindowAggregator::new(Duration::seconds(60), false, at(0));
        aggregator.aggregate(Quote::new("BTCUSD", dec!(100), at(0)), at(10));
        let batch = aggregator
            .aggregate(Quote::new("BTCUSD", dec!(101), at(20)), at(60))
            .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.iter().next().unwrap().price, dec!(101));
    }

    #[test]
    fn zero_width_window_emits_one_batch_per_quote() {
        let mut aggregator = WindowAggregator::new(Duration::seconds(0), true, at(0));
        assert!(aggregator.aggregate(Quote::new("BTCUSD", dec!(1), at(0)), at(0)).is_some());
        assert!(aggregator.aggregate(Quote::new("BTCUSD", dec!(2), at(0)), at(0)).is_some());
    }

    #[test]
    fn distinct_tickers_both_survive_in_one_batch() {
        let mut aggregator = WindowAggregator::new(Duration::seconds(60), false, at(0));
        aggregator.aggregate(Quote::new("BTCUSD", dec!(100), at(0)), at(10));
        let batch = aggregator
            .aggregate(Quote::new("ETHUSD", dec!(5), at(20)), at(60))
            .unwrap();
        assert_eq!(batch.len(), 2);
    }
}
