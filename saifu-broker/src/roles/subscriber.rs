use crate::agent::AgentRole;
use crate::error::BrokerError;
use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicConsumeOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, ExchangeKind};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// User-defined handler for a [`Subscriber`] agent (`spec.md` §4.1:
/// "Delivers each message body to a user-defined `received(body)`").
#[async_trait]
pub trait SubscriberHandler: Send + 'static {
    async fn received(&mut self, body: Vec<u8>) -> Result<(), BrokerError>;
}

/// The subscriber role: declares the fan-out exchange, declares an
/// exclusive auto-named queue bound to it, and consumes without
/// acknowledgement — at-most-once delivery to the handler (`spec.md`
/// §4.1 "Subscriber").
pub struct Subscriber {
    exchange: String,
    handler: Box<dyn SubscriberHandler>,
    queue_name: Option<String>,
}

impl Subscriber {
    pub fn new(exchange: impl Into<String>, handler: impl SubscriberHandler) -> Self {
        Self {
            exchange: exchange.into(),
            handler: Box::new(handler),
            queue_name: None,
        }
    }
}

#[async_trait]
impl AgentRole for Subscriber {
    fn name(&self) -> &'static str {
        "subscriber"
    }

    async fn initialize(&mut self, channel: &Channel) -> Result<(), BrokerError> {
        channel
            .exchange_declare(
                &self.exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let queue = channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    exclusive: true,
                    auto_delete: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_bind(
                queue.name().as_str(),
                &self.exchange,
                "",
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        self.queue_name = Some(queue.name().to_string());
        Ok(())
    }

    async fn drive(&mut self, channel: Channel, cancel: CancellationToken) -> Result<(), BrokerError> {
        let queue_name = self
            .queue_name
            .clone()
            .ok_or_else(|| BrokerError::Protocol("subscriber queue not initialized".to_string()))?;

        let mut consumer = channel
            .basic_consume(
                &queue_name,
                "",
                BasicConsumeOptions {
                    no_ack: true,
                    ..BasicConsumeOptions::default()
                },
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
                            self.handler.received(delivery.data).await?;
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

    async fn on_stop(&mut self) {
        debug!("subscriber stopping");
    }
}
