use crate::error::RepoError;
use crate::pool::Pool;
use saifu_model::PricingJob;
use uuid::Uuid;

/// Persists [`PricingJob`]s, assigning each a fresh identifier at
/// persistence time (`spec.md` §3, §4.6 step 4).
#[derive(Debug, Clone)]
pub struct JobsRepository {
    pool: Pool,
}

impl JobsRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Persists one job. See [`Self::persist_many`].
    pub async fn persist(&self, job: PricingJob) -> Result<PricingJob, RepoError> {
        let mut persisted = self.persist_many(vec![job]).await?;
        persisted
            .pop()
            .ok_or_else(|| RepoError::Invariant("persist_many returned no rows".to_string()))
    }

    /// Persists many jobs in one transaction, each assigned a fresh
    /// identifier (`spec.md` §4.6 step 4). Attempting to persist a job
    /// that already has an identifier is a programmer error — it panics
    /// rather than returning an error, matching `spec.md` §7 kind 3 and
    /// the original's `raise RuntimeError("Not implemented")`.
    pub async fn persist_many(&self, jobs: Vec<PricingJob>) -> Result<Vec<PricingJob>, RepoError> {
        let mut tx = self.pool.inner.begin().await.map_err(RepoError::from)?;
        let mut persisted = Vec::with_capacity(jobs.len());

        for mut job in jobs {
            assert!(
                job.identifier.is_none(),
                "attempted to re-persist a PricingJob that already has an identifier"
            );
            let identifier = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO saifu_portfolio_pricing_jobs
                    (id, portfolio_id, status, target_ccy, started_by, snapshot_time, start_time)
                VALUES
                    ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(identifier)
            .bind(job.portfolio_id)
            .bind(job.status.as_code())
            .bind(&job.target_ccy)
            .bind(&job.started_by)
            .bind(job.snapshot_time)
            .bind(job.start_time)
            .execute(&mut *tx)
            .await
            .map_err(RepoError::from)?;

            job.identifier = Some(identifier);
            persisted.push(job);
        }

        tx.commit().await.map_err(RepoError::from)?;
        Ok(persisted)
    }
}
