//! Pricing scheduler: on a timer, finds portfolios due for pricing,
//! persists a `PricingJob` per due `(portfolio, target currency)` pair and
//! dispatches each onto the pricing work queue (`spec.md` §4.6).

use std::process::ExitCode;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use saifu_broker::roles::{DispatchHandle, Dispatcher, DispatcherWork};
use saifu_broker::{AgentId, BrokerError, Connector, Supervisor};
use saifu_config::app::{ConfigFile, SchedPriceConfig};
use saifu_config::Cli;
use saifu_model::{codec, PricingJob};
use saifu_repository::pool::Pool;
use saifu_repository::{JobsRepository, PricingRepository};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct ScheduleDuePortfolios {
    pricing: PricingRepository,
    jobs: JobsRepository,
    pull_delay: Duration,
}

#[async_trait]
impl DispatcherWork for ScheduleDuePortfolios {
    async fn run(
        &mut self,
        dispatch: DispatchHandle,
        cancel: CancellationToken,
    ) -> Result<(), BrokerError> {
        loop {
            debug!("fetching portfolios due for pricing");
            let snapshot_time = Utc::now();

            let due = self
                .pricing
                .find_portfolios_to_price()
                .await
                .map_err(BrokerError::handler)?;

            let candidates: Vec<PricingJob> = due
                .into_iter()
                .map(|settings| {
                    PricingJob::new_system_job(
                        settings.portfolio_id,
                        settings.target_ccy,
                        snapshot_time,
                        snapshot_time,
                    )
                })
                .collect();

            let persisted = self
                .jobs
                .persist_many(candidates)
                .await
                .map_err(BrokerError::handler)?;

            debug!(count = persisted.len(), "required pricing for portfolio(s)");

            for job in persisted {
                let body = codec::encode(&job).map_err(BrokerError::handler)?;
                dispatch.dispatch(body).await?;
            }

            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.pull_delay) => {}
            }
        }
    }
}

fn spawn_shutdown_signal(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConfigFile::<SchedPriceConfig>::load(&cli.config_path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to load configuration: {error}");
            return ExitCode::from(2);
        }
    };
    saifu_config::logging::init(&config.logging);

    let pool = match Pool::connect(&config.app.database.into_database_settings()).await {
        Ok(pool) => pool,
        Err(error) => {
            eprintln!("failed to connect to database: {error}");
            return ExitCode::from(2);
        }
    };
    if let Err(error) = pool.migrate().await {
        eprintln!("failed to run migrations: {error}");
        return ExitCode::from(2);
    }

    let connector = Connector::new(config.app.mq.into_broker_settings());
    let work = ScheduleDuePortfolios {
        pricing: PricingRepository::new(pool.clone()),
        jobs: JobsRepository::new(pool),
        pull_delay: Duration::from_secs(config.app.pull_delay),
    };
    let role = Dispatcher::new(work);

    let cancel = CancellationToken::new();
    spawn_shutdown_signal(cancel.clone());
    let (events_tx, events_rx) = watch::channel(None);

    let mut supervisor = Supervisor::new();
    supervisor.watch_events("schedprice", events_rx);
    supervisor.spawn(
        "schedprice",
        cancel.clone(),
        saifu_broker::run_agent(
            AgentId("schedprice"),
            connector,
            role,
            true,
            cancel,
            events_tx,
        ),
    );

    match supervisor.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "schedprice supervisor stopped");
            ExitCode::FAILURE
        }
    }
}
