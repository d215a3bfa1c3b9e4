use crate::connector::Connector;
use crate::error::BrokerError;
use async_trait::async_trait;
use lapin::Channel;
use std::fmt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Identifies one running agent for logging and reconnect-event reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId(pub &'static str);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mirrors `barter-data`'s `streams::reconnect::Event`: either the agent
/// delivered an item of interest, or it is currently re-establishing its
/// broker connection. `saifu-broker` only ever emits the latter variant —
/// agents report transport loss, not message items, over this channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<Origin> {
    Reconnecting(Origin),
}

/// A role descriptor for the single generic agent run loop.
///
/// This replaces the original's publisher/subscriber/dispatcher/worker
/// type hierarchy (`spec.md` §9 "Template-method agent hierarchy"): one
/// [`run_agent`] loop drives any `AgentRole` through `connecting` →
/// `initializing` → `running`, looping back to `connecting` on a
/// transient transport failure when `reconnect` allows it.
#[async_trait]
pub trait AgentRole: Send + 'static {
    /// A short name used only for logging.
    fn name(&self) -> &'static str;

    /// Declares this role's exchanges/queues/bindings on a fresh channel
    /// (`spec.md` §4.1 step 2, "initializing").
    async fn initialize(&mut self, channel: &Channel) -> Result<(), BrokerError>;

    /// Drives the role once initialized (`spec.md` §4.1 step 3, "running"):
    /// the publisher/dispatcher work loop, or the subscriber/worker
    /// consume loop. Returns `Ok(())` when `cancel` fires and the role
    /// wound down cleanly, or `Err` on transport/protocol/handler failure.
    async fn drive(&mut self, channel: Channel, cancel: CancellationToken) -> Result<(), BrokerError>;

    /// Role-specific cleanup hook run once after [`Self::drive`] returns
    /// `Ok` because `cancel` fired (`spec.md` §4.1 step 5, "stopping" —
    /// the original's subscriber/worker `post_stop` calling
    /// `channel.stop_consuming()`; publishers/dispatchers have nothing to
    /// do here and use the default no-op).
    async fn on_stop(&mut self) {}
}

/// Drives one [`AgentRole`] through its full supervised lifecycle until
/// `cancel` fires, reconnecting on transient transport failure while
/// `reconnect` is `true` (`spec.md` §4.1 step 4).
///
/// `events` is a best-effort channel used only so a supervisor or test can
/// observe reconnect attempts; a stuck receiver never blocks the agent.
pub async fn run_agent<R: AgentRole>(
    id: AgentId,
    connector: Connector,
    mut role: R,
    reconnect: bool,
    cancel: CancellationToken,
    events: watch::Sender<Option<Event<AgentId>>>,
) -> Result<(), BrokerError> {
    loop {
        if cancel.is_cancelled() {
            role.on_stop().await;
            return Ok(());
        }

        info!(agent = %id, role = role.name(), "connecting to broker");
        let connection = connector.connect().await?;
        let channel = connection.create_channel().await?;

        info!(agent = %id, "initializing broker topology");
        role.initialize(&channel).await?;

        info!(agent = %id, "running");
        match role.drive(channel, cancel.clone()).await {
            Ok(()) => {
                role.on_stop().await;
                return Ok(());
            }
            Err(err) if err.is_transient() && reconnect => {
                warn!(agent = %id, error = %err, "lost connection with broker, will reconnect");
                let _ = events.send(Some(Event::Reconnecting(id)));
                continue;
            }
            Err(err) => return Err(err),
        }
    }
}
