use crate::error::RepoError;
use crate::pool::Pool;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use saifu_model::{PortfolioHistoricalPrice, PortfolioPosition, PortfolioPricingSettings};
use sqlx::Row;
use std::time::Duration;
use uuid::Uuid;

/// One priced position row, as returned by
/// [`PricingRepository::get_portfolio_positions_prices`]: `spec.md` §4.7
/// step 2-3 ("Σ price × size over returned rows").
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioPositionPrice {
    pub position: PortfolioPosition,
    pub price: Decimal,
    pub total: Decimal,
}

/// Queries and persistence for the pricing computation (`spec.md` §4.6,
/// §4.7), grounded on `original_source/core/dbac.py::PricingRepository`.
#[derive(Debug, Clone)]
pub struct PricingRepository {
    pool: Pool,
}

impl PricingRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Finds every [`PortfolioPricingSettings`] due for pricing: no prior
    /// job, or the newest prior job's `start_time` is older than
    /// `pricing_interval` (`spec.md` §4.6 step 2).
    pub async fn find_portfolios_to_price(
        &self,
    ) -> Result<Vec<PortfolioPricingSettings>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT sp.id AS portfolio_id,
                   spps.target_ccy AS target_currency,
                   spps.pricing_interval_seconds AS pricing_interval_seconds
              FROM saifu_portfolios sp
              JOIN saifu_portfolio_pricing_settings spps ON sp.id = spps.portfolio_id
         LEFT JOIN (
                SELECT portfolio_id, MAX(start_time) AS last_start_time
                  FROM saifu_portfolio_pricing_jobs
              GROUP BY portfolio_id
              ) sppj ON sp.id = sppj.portfolio_id
             WHERE EXTRACT(
                       EPOCH FROM (
                           now() - coalesce(sppj.last_start_time, to_timestamp(0))
                       )
                   ) > spps.pricing_interval_seconds
            "#,
        )
        .fetch_all(&self.pool.inner)
        .await
        .map_err(RepoError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let pricing_interval_seconds: i64 = row.get("pricing_interval_seconds");
                PortfolioPricingSettings {
                    portfolio_id: row.get("portfolio_id"),
                    target_ccy: row.get("target_currency"),
                    pricing_interval: Duration::from_secs(pricing_interval_seconds.max(0) as u64),
                }
            })
            .collect())
    }

    /// Joins positions to the newest historical price with
    /// `quote_time <= snapshot_time` for the instrument ticker formed as
    /// `position.ticker_base || target_ccy` (`spec.md` §4.7 step 2).
    /// Positions with no such price row are silently excluded — the
    /// named edge case in `spec.md` §4.7, not a bug.
    pub async fn get_portfolio_positions_prices(
        &self,
        portfolio_id: Uuid,
        snapshot_time: DateTime<Utc>,
        target_ccy: &str,
    ) -> Result<Vec<PortfolioPositionPrice>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT spp.ticker_base AS ticker_base,
                   schp.price AS price,
                   spp.size AS size,
                   (schp.price * spp.size) AS total
              FROM saifu_ccy_historical_prices schp
              JOIN saifu_portfolio_positions spp ON (spp.ticker_base || $1) = schp.ticker
              JOIN (
                SELECT ticker, MAX(quote_time) AS quote_time
                  FROM saifu_ccy_historical_prices
                 WHERE quote_time <= $2
              GROUP BY ticker
              ) schp_j ON schp.ticker = schp_j.ticker AND schp.quote_time = schp_j.quote_time
             WHERE spp.portfolio_id = $3
            "#,
        )
        .bind(target_ccy)
        .bind(snapshot_time)
        .bind(portfolio_id)
        .fetch_all(&self.pool.inner)
        .await
        .map_err(RepoError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| PortfolioPositionPrice {
                position: PortfolioPosition {
                    portfolio_id,
                    ticker_base: row.get("ticker_base"),
                    size: row.get("size"),
                },
                price: row.get("price"),
                total: row.get("total"),
            })
            .collect())
    }

    /// Inserts one row recording a completed pricing computation
    /// (`spec.md` §4.7 step 4). Not deduplicated — a redelivered job
    /// produces a second row for the same snapshot, by design
    /// (`spec.md` §4.7 "Idempotence").
    pub async fn persist_portfolio_pricing(
        &self,
        portfolio_id: Uuid,
        snapshot_time: DateTime<Utc>,
        balance: Decimal,
        target_ccy: &str,
    ) -> Result<(), RepoError> {
        let row = PortfolioHistoricalPrice {
            portfolio_id,
            balance,
            currency: target_ccy.to_string(),
            quote_time: snapshot_time,
        };
        sqlx::query(
            r#"
            INSERT INTO saifu_portfolio_historical_prices
                (portfolio_id, balance, currency, quote_time)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(row.portfolio_id)
        .bind(row.balance)
        .bind(&row.currency)
        .bind(row.quote_time)
        .execute(&self.pool.inner)
        .await
        .map_err(RepoError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(ticker_base: &str, size: Decimal) -> PortfolioPosition {
        PortfolioPosition {
            portfolio_id: Uuid::new_v4(),
            ticker_base: ticker_base.to_string(),
            size,
        }
    }

    #[test]
    fn balance_is_sum_of_totals() {
        let rows = vec![
            PortfolioPositionPrice {
                position: position("BTC", dec!(2)),
                price: dec!(10),
                total: dec!(20),
            },
            PortfolioPositionPrice {
                position: position("ETH", dec!(3)),
                price: dec!(5),
                total: dec!(15),
            },
        ];
        let balance: Decimal = rows.iter().map(|row| row.total).sum();
        assert_eq!(balance, dec!(35));
    }

    #[test]
    fn balance_over_zero_positions_is_zero() {
        let rows: Vec<PortfolioPositionPrice> = Vec::new();
        let balance: Decimal = rows.iter().map(|row| row.total).sum();
        assert_eq!(balance, Decimal::ZERO);
    }
}
