use crate::agent::{AgentId, Event};
use crate::error::BrokerError;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Why the supervisor stopped.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("agent failed: {0}")]
    AgentFailed(#[from] BrokerError),

    #[error("agent task panicked: {0}")]
    AgentPanicked(String),
}

/// Starts a fixed set of agents and monitors their liveness
/// (`spec.md` §4.2).
///
/// Unlike the original's 5-second polling loop, this waits on whichever
/// agent finishes first via [`JoinSet::join_next`] — `spec.md` §9 names
/// this exact join-based approach as preferable "where the runtime
/// supports waiting on any-of-many", which `tokio` does. The
/// single-agent special case falls out for free: with one task in the
/// set, `join_next` simply returns that task's result.
pub struct Supervisor {
    tasks: JoinSet<Result<(), BrokerError>>,
    names: Vec<&'static str>,
    cancels: Vec<CancellationToken>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            names: Vec::new(),
            cancels: Vec::new(),
        }
    }

    /// Registers one agent's future under `name`, along with the
    /// [`CancellationToken`] that will stop it when another agent in the
    /// group terminates.
    pub fn spawn<F>(&mut self, name: &'static str, cancel: CancellationToken, fut: F)
    where
        F: std::future::Future<Output = Result<(), BrokerError>> + Send + 'static,
    {
        self.names.push(name);
        self.cancels.push(cancel);
        self.tasks.spawn(fut);
    }

    /// Logs every [`Event::Reconnecting`] an agent reports on its
    /// `run_agent` events channel. Spawned off the supervisor's own task
    /// set: the watch loop exits on its own once the agent's `events`
    /// sender is dropped at task exit, so it needs no explicit teardown.
    pub fn watch_events(&self, name: &'static str, mut events: watch::Receiver<Option<Event<AgentId>>>) {
        tokio::spawn(async move {
            while events.changed().await.is_ok() {
                if let Some(Event::Reconnecting(id)) = *events.borrow() {
                    warn!(agent = name, %id, "agent reconnecting to broker");
                }
            }
        });
    }

    /// Runs the supervised group to completion: fail-fast semantics,
    /// whichever agent terminates first (for any reason) triggers
    /// cancellation of every other agent, then this returns that first
    /// agent's outcome.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        let outcome = match self.tasks.join_next().await {
            Some(result) => result,
            None => return Ok(()),
        };

        info!("one agent terminated, stopping the rest of the group");
        for cancel in &self.cancels {
            cancel.cancel();
        }
        while self.tasks.join_next().await.is_some() {}

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                error!(error = %err, "agent stopped with an error");
                Err(SupervisorError::AgentFailed(err))
            }
            Err(join_err) => {
                error!(error = %join_err, "agent task panicked");
                Err(SupervisorError::AgentPanicked(join_err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn single_agent_group_waits_on_that_agent() {
        let mut supervisor = Supervisor::new();
        let cancel = CancellationToken::new();
        supervisor.spawn("solo", cancel, async { Ok(()) });
        assert!(supervisor.run().await.is_ok());
    }

    #[tokio::test]
    async fn one_agent_dying_stops_the_group() {
        let mut supervisor = Supervisor::new();

        let doomed_cancel = CancellationToken::new();
        supervisor.spawn("doomed", doomed_cancel, async {
            Err(BrokerError::Protocol("boom".to_string()))
        });

        let survivor_cancel = CancellationToken::new();
        let survivor_token = survivor_cancel.clone();
        supervisor.spawn("survivor", survivor_cancel, async move {
            survivor_token.cancelled().await;
            Ok(())
        });

        let result = tokio::time::timeout(Duration::from_secs(1), supervisor.run()).await;
        assert!(result.is_ok(), "supervisor should stop promptly");
        assert!(result.unwrap().is_err());
    }
}
