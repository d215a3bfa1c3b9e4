use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// A single price observation for one ticker at one instant.
///
/// `ticker` is the concatenation of the source and target currency codes
/// (e.g. `"BTCUSD"`). Immutable once produced — there is no setter, only
/// the constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: String,
    pub price: Decimal,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn new(ticker: impl Into<String>, price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            ticker: ticker.into(),
            price,
            timestamp,
        }
    }
}

/// The closed contents of one aggregation window: at most one [`Quote`] per
/// ticker, the last one seen before the window closed.
///
/// Serialises as a plain JSON array of [`Quote`], matching `spec.md` §6.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregatedBatch(pub Vec<Quote>);

impl AggregatedBatch {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Quote> {
        self.0.iter()
    }
}

impl From<HashMap<String, Quote>> for AggregatedBatch {
    fn from(map: HashMap<String, Quote>) -> Self {
        Self(map.into_values().collect())
    }
}

impl IntoIterator for AggregatedBatch {
    type Item = Quote;
    type IntoIter = std::vec::IntoIter<Quote>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// `spec.md` names only the `New` status; the enum is left open for a
/// future terminal status without widening `spec.md`'s contract today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum JobStatus {
    #[serde(rename = "N")]
    New,
}

impl JobStatus {
    pub fn as_code(self) -> &'static str {
        match self {
            JobStatus::New => "N",
        }
    }
}

/// A unit of pricing work: price portfolio `portfolio_id` in `target_ccy`
/// as of `snapshot_time`.
///
/// `identifier` is assigned exactly once, at persistence — constructing a
/// job never assigns one. Persisting an already-identified job is a
/// programmer error (`spec.md` §3, §7.3) and is asserted against in
/// `saifu-repository`, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingJob {
    pub identifier: Option<Uuid>,
    pub portfolio_id: Uuid,
    pub snapshot_time: DateTime<Utc>,
    pub target_ccy: String,
    pub started_by: String,
    pub status: JobStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl PricingJob {
    /// Builds a new, not-yet-persisted job the way `schedprice` does: no
    /// identifier, status `New`, `start_time` set to the same instant the
    /// scheduler chose as `snapshot_time` for this cycle.
    pub fn new_system_job(
        portfolio_id: Uuid,
        target_ccy: impl Into<String>,
        snapshot_time: DateTime<Utc>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            identifier: None,
            portfolio_id,
            snapshot_time,
            target_ccy: target_ccy.into(),
            started_by: "SYSTEM".to_string(),
            status: JobStatus::New,
            start_time,
            end_time: None,
        }
    }
}

/// Read-only pricing configuration for one `(portfolio, target currency)`
/// pair (`spec.md` §3). Returned by
/// `saifu_repository::PricingRepository::find_portfolios_to_price`, which
/// reads it straight off the `saifu_portfolio_pricing_settings` row it
/// already joins to decide what is due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPricingSettings {
    pub portfolio_id: Uuid,
    pub target_ccy: String,
    pub pricing_interval: Duration,
}

/// One held instrument within a portfolio. The priced ticker is
/// `ticker_base || target_ccy` (`spec.md` §3). Embedded in
/// `saifu_repository::PortfolioPositionPrice`, the row
/// `PricingRepository::get_portfolio_positions_prices` returns per priced
/// position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPosition {
    pub portfolio_id: Uuid,
    pub ticker_base: String,
    pub size: Decimal,
}

/// One append-only row in the instrument price time series. Built from a
/// [`Quote`] at insert time by
/// `saifu_repository::TicksRepository::ingest_batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentHistoricalPrice {
    pub ticker: String,
    pub price: Decimal,
    pub quote_time: DateTime<Utc>,
}

/// One append-only row recording a completed pricing computation. Built by
/// `saifu_repository::PricingRepository::persist_portfolio_pricing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioHistoricalPrice {
    pub portfolio_id: Uuid,
    pub balance: Decimal,
    pub currency: String,
    pub quote_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn aggregated_batch_from_map_drops_key_keeps_values() {
        let mut map = HashMap::new();
        map.insert(
            "BTCUSD".to_string(),
            Quote::new("BTCUSD", dec!(100), Utc::now()),
        );
        let batch = AggregatedBatch::from(map);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.iter().next().unwrap().ticker, "BTCUSD");
    }

    #[test]
    fn new_system_job_has_no_identifier_and_new_status() {
        let now = Utc::now();
        let job = PricingJob::new_system_job(Uuid::new_v4(), "USD", now, now);
        assert!(job.identifier.is_none());
        assert_eq!(job.status, JobStatus::New);
        assert_eq!(job.started_by, "SYSTEM");
    }
}
