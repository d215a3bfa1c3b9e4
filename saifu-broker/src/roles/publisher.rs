use crate::agent::AgentRole;
use crate::error::BrokerError;
use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, ExchangeKind};
use tokio_util::sync::CancellationToken;

/// Publishes serialized bodies to a fan-out exchange with an empty routing
/// key (`spec.md` §4.1 "Publisher").
#[derive(Debug, Clone)]
pub struct PublishHandle {
    channel: Channel,
    exchange: String,
}

impl PublishHandle {
    pub async fn publish(&self, body: Vec<u8>) -> Result<(), BrokerError> {
        self.channel
            .basic_publish(
                &self.exchange,
                "",
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default(),
            )
            .await?
            .await?;
        Ok(())
    }
}

/// User-defined driver for a [`Publisher`] agent (`spec.md` §4.1:
/// "`work()` is the user-defined driver that decides when to call
/// `publish`"). Implementations are expected to loop internally until
/// `cancel` fires.
#[async_trait]
pub trait PublisherWork: Send + 'static {
    async fn run(&mut self, publish: PublishHandle, cancel: CancellationToken) -> Result<(), BrokerError>;
}

/// The publisher role: declares a fan-out exchange on connect, then hands
/// control to a user-supplied [`PublisherWork`].
pub struct Publisher {
    exchange: String,
    work: Box<dyn PublisherWork>,
}

impl Publisher {
    pub fn new(exchange: impl Into<String>, work: impl PublisherWork) -> Self {
        Self {
            exchange: exchange.into(),
            work: Box::new(work),
        }
    }
}

#[async_trait]
impl AgentRole for Publisher {
    fn name(&self) -> &'static str {
        "publisher"
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
        Ok(())
    }

    async fn drive(&mut self, channel: Channel, cancel: CancellationToken) -> Result<(), BrokerError> {
        let handle = PublishHandle {
            channel,
            exchange: self.exchange.clone(),
        };
        self.work.run(handle, cancel).await
    }
}
