use crate::error::RepoError;
use crate::pool::Pool;
use saifu_model::{InstrumentHistoricalPrice, Quote};
use tracing::warn;

/// Appends quotes to the instrument historical-price table
/// (`spec.md` §4.5).
#[derive(Debug, Clone)]
pub struct TicksRepository {
    pool: Pool,
}

impl TicksRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Inserts one row per quote. Per-row insertion failures are logged
    /// and do not abort the batch (`spec.md` §4.5, §7 kind 2) — only a
    /// transport-level failure propagates.
    pub async fn ingest_batch(&self, quotes: &[Quote]) -> Result<(), RepoError> {
        for quote in quotes {
            if let Err(err) = self.ingest_one(quote).await {
                if err.is_transient() {
                    return Err(err);
                }
                warn!(ticker = %quote.ticker, error = %err, "failed to persist tick, skipping");
            }
        }
        Ok(())
    }

    async fn ingest_one(&self, quote: &Quote) -> Result<(), RepoError> {
        let row = InstrumentHistoricalPrice {
            ticker: quote.ticker.clone(),
            price: quote.price,
            quote_time: quote.timestamp,
        };
        sqlx::query(
            r#"
            INSERT INTO saifu_ccy_historical_prices (ticker, price, quote_time)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&row.ticker)
        .bind(row.price)
        .bind(row.quote_time)
        .execute(&self.pool.inner)
        .await
        .map_err(RepoError::from)?;
        Ok(())
    }
}
