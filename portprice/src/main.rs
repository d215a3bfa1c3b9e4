//! Pricing worker: consumes the pricing work queue, prices one portfolio
//! per job and persists the result (`spec.md` §4.7).

use std::process::ExitCode;

use async_trait::async_trait;
use clap::Parser;
use rust_decimal::Decimal;
use saifu_broker::roles::{Worker, WorkerHandler};
use saifu_broker::{AgentId, BrokerError, Connector, Supervisor};
use saifu_config::app::{ConfigFile, PortPriceConfig};
use saifu_config::Cli;
use saifu_model::{codec, PricingJob};
use saifu_repository::pool::Pool;
use saifu_repository::{PricingRepository, RepoError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct PriceOneJob {
    pricing: PricingRepository,
}

/// Preserves [`RepoError::is_transient`] across the `anyhow` boxing
/// `WorkerHandler::handle` requires, so the worker's ack/nack decision
/// (`saifu-broker/src/roles/worker.rs`) can tell a dropped database
/// connection (`spec.md` §7 kind 1, requeue) from a query failure
/// (`spec.md` §7 kind 2, drop) apart.
fn to_broker_error(err: RepoError) -> BrokerError {
    if err.is_transient() {
        BrokerError::handler_transient(err)
    } else {
        BrokerError::handler(err)
    }
}

#[async_trait]
impl WorkerHandler for PriceOneJob {
    async fn handle(&mut self, body: Vec<u8>) -> Result<(), BrokerError> {
        let job: PricingJob = codec::decode(&body).map_err(BrokerError::handler)?;
        debug!(
            identifier = ?job.identifier,
            portfolio_id = %job.portfolio_id,
            "received pricing job"
        );

        let rows = self
            .pricing
            .get_portfolio_positions_prices(job.portfolio_id, job.snapshot_time, &job.target_ccy)
            .await
            .map_err(to_broker_error)?;

        let balance: Decimal = rows.iter().map(|row| row.total).sum();
        debug!(%balance, currency = %job.target_ccy, "computed portfolio balance");

        self.pricing
            .persist_portfolio_pricing(job.portfolio_id, job.snapshot_time, balance, &job.target_ccy)
            .await
            .map_err(to_broker_error)
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

    let config = match ConfigFile::<PortPriceConfig>::load(&cli.config_path) {
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
    let role = Worker::new(
        config.app.work_queue,
        PriceOneJob {
            pricing: PricingRepository::new(pool),
        },
    );

    let cancel = CancellationToken::new();
    spawn_shutdown_signal(cancel.clone());
    let (events_tx, events_rx) = watch::channel(None);

    let mut supervisor = Supervisor::new();
    supervisor.watch_events("portprice", events_rx);
    supervisor.spawn(
        "portprice",
        cancel.clone(),
        saifu_broker::run_agent(
            AgentId("portprice"),
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
            tracing::error!(%error, "portprice supervisor stopped");
            ExitCode::FAILURE
        }
    }
}
