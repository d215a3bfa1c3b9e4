use crate::agent::AgentRole;
use crate::error::BrokerError;
use crate::topology::{DIRECT_EXCHANGE, ROUTING_KEY};
use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, ExchangeKind};
use tokio_util::sync::CancellationToken;

/// Publishes jobs to the named direct exchange with the fixed routing key
/// (`spec.md` §4.1 "Dispatcher").
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    channel: Channel,
}

impl DispatchHandle {
    pub async fn dispatch(&self, body: Vec<u8>) -> Result<(), BrokerError> {
        self.channel
            .basic_publish(
                DIRECT_EXCHANGE,
                ROUTING_KEY,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_delivery_mode(2), // persistent
            )
            .await?
            .await?;
        Ok(())
    }
}

/// User-defined driver for a [`Dispatcher`] agent (`spec.md` §4.1:
/// "`work()` drives emission").
#[async_trait]
pub trait DispatcherWork: Send + 'static {
    async fn run(&mut self, dispatch: DispatchHandle, cancel: CancellationToken) -> Result<(), BrokerError>;
}

/// The dispatcher role: declares the named direct exchange on connect,
/// then hands control to a user-supplied [`DispatcherWork`].
pub struct Dispatcher {
    work: Box<dyn DispatcherWork>,
}

impl Dispatcher {
    pub fn new(work: impl DispatcherWork) -> Self {
        Self {
            work: Box::new(work),
        }
    }
}

#[async_trait]
impl AgentRole for Dispatcher {
    fn name(&self) -> &'static str {
        "dispatcher"
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
        Ok(())
    }

    async fn drive(&mut self, channel: Channel, cancel: CancellationToken) -> Result<(), BrokerError> {
        let handle = DispatchHandle { channel };
        self.work.run(handle, cancel).await
    }
}
