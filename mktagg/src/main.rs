//! Window aggregator: subscribes to the quotes exchange, tumbling-window
//! aggregates by ticker, republishes each closed window onto the
//! aggregated-quotes exchange (`spec.md` §4.4).

mod aggregator;

use std::process::ExitCode;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use saifu_broker::roles::{
    PublishHandle, Publisher, PublisherWork, Subscriber, SubscriberHandler,
};
use saifu_broker::{AgentId, BrokerError, Connector, Supervisor};
use saifu_config::app::{ConfigFile, MktAggConfig};
use saifu_config::Cli;
use saifu_model::{codec, AggregatedBatch, Quote};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use aggregator::WindowAggregator;

struct AggregateQuotes {
    aggregator: WindowAggregator,
    tx: mpsc::Sender<AggregatedBatch>,
}

#[async_trait]
impl SubscriberHandler for AggregateQuotes {
    async fn received(&mut self, body: Vec<u8>) -> Result<(), BrokerError> {
        let quote: Quote = codec::decode(&body).map_err(BrokerError::handler)?;
        debug!(ticker = %quote.ticker, price = %quote.price, "received quote");

        if let Some(batch) = self.aggregator.aggregate(quote, Utc::now()) {
            debug!(size = batch.len(), "window closed, handing off batch");
            if self.tx.send(batch).await.is_err() {
                return Err(BrokerError::Protocol(
                    "aggregated batch channel closed".to_string(),
                ));
            }
        }
        Ok(())
    }
}

struct DrainAggregatedBatches {
    rx: mpsc::Receiver<AggregatedBatch>,
    wait: StdDuration,
}

#[async_trait]
impl PublisherWork for DrainAggregatedBatches {
    async fn run(
        &mut self,
        publish: PublishHandle,
        cancel: CancellationToken,
    ) -> Result<(), BrokerError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            match tokio::time::timeout(self.wait, self.rx.recv()).await {
                Ok(Some(batch)) => {
                    debug!(size = batch.len(), "publishing aggregated batch");
                    let body = codec::encode(&batch).map_err(BrokerError::handler)?;
                    publish.publish(body).await?;
                }
                Ok(None) => {
                    return Err(BrokerError::Protocol(
                        "aggregated batch channel closed".to_string(),
                    ));
                }
                Err(_timeout) => {
                    debug!(seconds = self.wait.as_secs(), "no batch before timeout");
                }
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

    let config = match ConfigFile::<MktAggConfig>::load(&cli.config_path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to load configuration: {error}");
            return ExitCode::from(2);
        }
    };
    saifu_config::logging::init(&config.logging);

    let (tx, rx) = mpsc::channel(config.app.handoff_capacity);

    let sub_connector = Connector::new(config.app.mq.clone().into_broker_settings());
    let pub_connector = Connector::new(config.app.mq.into_broker_settings());

    let aggregator = WindowAggregator::new(
        ChronoDuration::seconds(config.app.aggregation_window as i64),
        config.app.start_immediate,
        Utc::now(),
    );
    let sub_role = Subscriber::new(config.app.sub_exchange, AggregateQuotes { aggregator, tx });
    let pub_role = Publisher::new(
        config.app.pub_exchange,
        DrainAggregatedBatches {
            rx,
            wait: StdDuration::from_secs(config.app.wait),
        },
    );

    let cancel = CancellationToken::new();
    spawn_shutdown_signal(cancel.clone());
    let (events_tx, events_rx) = watch::channel(None);

    let mut supervisor = Supervisor::new();
    supervisor.watch_events("mktagg", events_rx);
    supervisor.spawn(
        "mktagg-sub",
        cancel.clone(),
        saifu_broker::run_agent(
            AgentId("mktagg-sub"),
            sub_connector,
            sub_role,
            true,
            cancel.clone(),
            events_tx.clone(),
        ),
    );
    supervisor.spawn(
        "mktagg-pub",
        cancel.clone(),
        saifu_broker::run_agent(
            AgentId("mktagg-pub"),
            pub_connector,
            pub_role,
            true,
            cancel,
            events_tx,
        ),
    );

    match supervisor.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "mktagg supervisor stopped");
            ExitCode::FAILURE
        }
    }
}
