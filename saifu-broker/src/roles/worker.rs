use crate::agent::AgentRole;
use crate::error::BrokerError;
use crate::topology::{DIRECT_EXCHANGE, ROUTING_KEY};
use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, ExchangeKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// User-defined handler for a [`Worker`] agent (`spec.md` §4.1: "Delivers
/// each body to a user-defined `handle(body)`").
#[async_trait]
pub trait WorkerHandler: Send + 'static {
    async fn handle(&mut self, body: Vec<u8>) -> Result<(), BrokerError>;
}

/// The worker role: declares the direct exchange and a named, durable
/// queue bound with the fixed routing key (`spec.md` §4.1 "Worker").
///
/// Unlike [`crate::roles::Publisher`]/[`crate::roles::Subscriber`], the
/// worker acknowledges explicitly — the resolution of `spec.md` §9's open
/// question, recorded in `DESIGN.md`: `handle` returning `Ok` acks the
/// delivery; a transient `Err` (`BrokerError::is_transient`) nacks it with
/// `requeue = true`; a data-level `Err` acks it anyway so the message is
/// dropped rather than retried forever (`spec.md` §7 kind 2).
pub struct Worker {
    queue: String,
    handler: Box<dyn WorkerHandler>,
}

impl Worker {
    pub fn new(queue: impl Into<String>, handler: impl WorkerHandler) -> Self {
        Self {
            queue: queue.into(),
            handler: Box::new(handler),
        }
    }
}

#[async_trait]
impl AgentRole for Worker {
    fn name(&self) -> &'static str {
        "worker"
    }

    async fn initialize(&mut self, channel: &Channel) -> Result<(), BrokerError> {
        channel
            .exchange_declare(
                DIRECT_EXCHANGE,
                ExchangeKind::Direct,
                ExchangeDeclareOptions::default(),
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_declare(
                &self.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_bind(
                &self.queue,
                DIRECT_EXCHANGE,
                ROUTING_KEY,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        Ok(())
    }

    async fn drive(&mut self, channel: Channel, cancel: CancellationToken) -> Result<(), BrokerError> {
        let mut consumer = channel
            .basic_consume(
                &self.queue,
                "",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Ok(());
                }
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => {
                            let body = delivery.data.clone();
                            match self.handler.handle(body).await {
                                Ok(()) => {
                                    delivery.ack(BasicAckOptions::default()).await?;
                                }
                                Err(err) if err.is_transient() => {
                                    warn!(error = %err, "transient job handler failure, nacking for redelivery");
                                    delivery
                                        .nack(BasicNackOptions {
                                            requeue: true,
                                            ..BasicNackOptions::default()
                                        })
                                        .await?;
                                }
                                Err(err) => {
                                    warn!(error = %err, "data-level job handler failure, dropping message");
                                    delivery.ack(BasicAckOptions::default()).await?;
                                }
                            }
                        }
                        Some(Err(err)) => return Err(BrokerError::Transport(err)),
                        None => {
                            debug!("consumer stream ended");
                            return Err(BrokerError::StreamClosed);
                        }
                    }
                }
            }
        }
    }
}
