//! Tick ingester: subscribes to the aggregated-quotes exchange and
//! appends each quote to the instrument historical-price table
//! (`spec.md` §4.5).

use std::process::ExitCode;

use async_trait::async_trait;
use clap::Parser;
use saifu_broker::roles::{Subscriber, SubscriberHandler};
use saifu_broker::{AgentId, BrokerError, Connector, Supervisor};
use saifu_config::app::{ConfigFile, IngestiCksConfig};
use saifu_config::Cli;
use saifu_model::{codec, AggregatedBatch};
use saifu_repository::pool::Pool;
use saifu_repository::TicksRepository;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, Instrument};

struct IngestBatch {
    repository: TicksRepository,
}

#[async_trait]
impl SubscriberHandler for IngestBatch {
    async fn received(&mut self, body: Vec<u8>) -> Result<(), BrokerError> {
        let batch: AggregatedBatch = codec::decode(&body).map_err(BrokerError::handler)?;
        debug!(size = batch.len(), "will ingest updates");

        self.repository
            .ingest_batch(&batch.0)
            .instrument(debug_span!("ingest_all_updates"))
            .await
            .map_err(BrokerError::handler)
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

    let config = match ConfigFile::<IngestiCksConfig>::load(&cli.config_path) {
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
    let role = Subscriber::new(
        config.app.exchange,
        IngestBatch {
            repository: TicksRepository::new(pool),
        },
    );

    let cancel = CancellationToken::new();
    spawn_shutdown_signal(cancel.clone());
    let (events_tx, events_rx) = watch::channel(None);

    let mut supervisor = Supervisor::new();
    supervisor.watch_events("ingesticks", events_rx);
    supervisor.spawn(
        "ingesticks",
        cancel.clone(),
        saifu_broker::run_agent(
            AgentId("ingesticks"),
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
            tracing::error!(%error, "ingesticks supervisor stopped");
            ExitCode::FAILURE
        }
    }
}
