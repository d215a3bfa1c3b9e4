//! Quote publisher: polls the external provider and publishes each
//! returned quote onto the quotes fan-out exchange (`spec.md` §4.3).

mod requester;

use std::process::ExitCode;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use saifu_broker::roles::{PublishHandle, Publisher, PublisherWork};
use saifu_broker::{AgentId, BrokerError, Connector, Supervisor};
use saifu_config::app::{ConfigFile, MktPubConfig};
use saifu_config::Cli;
use saifu_model::codec;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use requester::Requester;

struct PublishQuotes {
    requester: Requester,
    pairs: Vec<(String, String)>,
    pull_delay: Duration,
}

#[async_trait]
impl PublisherWork for PublishQuotes {
    async fn run(
        &mut self,
        publish: PublishHandle,
        cancel: CancellationToken,
    ) -> Result<(), BrokerError> {
        loop {
            match self.requester.fetch(&self.pairs).await {
                Ok(quotes) => {
                    for quote in quotes {
                        debug!(ticker = %quote.ticker, price = %quote.price, "publishing quote");
                        let body = codec::encode(&quote).map_err(BrokerError::handler)?;
                        publish.publish(body).await?;
                    }
                }
                Err(error) => {
                    warn!(%error, "failed to get quotes from provider");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.pull_delay) => {}
            }
        }
    }
}

/// Cancels `cancel` on `SIGINT`/`SIGTERM` so the agent winds down cleanly
/// instead of the process being killed mid-flight (`spec.md` §6 "exit
/// code 0 on graceful shutdown").
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

    let config = match ConfigFile::<MktPubConfig>::load(&cli.config_path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to load configuration: {error}");
            return ExitCode::from(2);
        }
    };
    saifu_config::logging::init(&config.logging);

    let pairs = match cli.parsed_pairs() {
        Ok(pairs) if !pairs.is_empty() => pairs,
        Ok(_) => config
            .app
            .pairs
            .iter()
            .map(|pair| (pair.source.clone(), pair.target.clone()))
            .collect(),
        Err(error) => {
            eprintln!("invalid SOURCE_TARGET arguments: {error}");
            return ExitCode::from(2);
        }
    };

    let connector = Connector::new(config.app.mq.into_broker_settings());
    let work = PublishQuotes {
        requester: Requester::new(config.app.res),
        pairs,
        pull_delay: Duration::from_secs(config.app.pull_delay),
    };
    let role = Publisher::new(config.app.exchange, work);

    let cancel = CancellationToken::new();
    spawn_shutdown_signal(cancel.clone());
    let (events_tx, events_rx) = watch::channel(None);

    let mut supervisor = Supervisor::new();
    supervisor.watch_events("mktpub", events_rx);
    supervisor.spawn(
        "mktpub",
        cancel.clone(),
        saifu_broker::run_agent(AgentId("mktpub"), connector, role, true, cancel, events_tx),
    );

    match supervisor.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "mktpub supervisor stopped");
            ExitCode::FAILURE
        }
    }
}
