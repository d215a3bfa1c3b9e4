use thiserror::Error;

/// The framework recognises two kinds of failure: transient failures the
/// reconnect loop (or, for a [`crate::roles::Worker`], the redelivery
/// path) recovers from, and failures that propagate out of
/// [`crate::agent::run_agent`] (`spec.md` §7 kinds 1 and 2). A handler can
/// hit either kind — a database connection drop is as transient as a
/// broker disconnect, a malformed message body is not — so `Handler`
/// carries a `retryable` flag rather than always being treated as
/// permanent. Kind 3, invariant violations, never reaches this type: they
/// panic where they occur instead of being wrapped into a `Result`.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker transport failure: {0}")]
    Transport(#[from] lapin::Error),

    #[error("broker protocol error: {0}")]
    Protocol(String),

    #[error("message handler failed: {source}")]
    Handler {
        #[source]
        source: anyhow::Error,
        retryable: bool,
    },

    /// The consumer stream ended without an explicit error. `lapin`
    /// surfaces a dropped connection this way as often as it does via
    /// `Transport`, so this is treated as equally transient.
    #[error("broker consumer stream closed unexpectedly")]
    StreamClosed,
}

impl BrokerError {
    /// A data-level handler failure (`spec.md` §7 kind 2): never retried,
    /// never surfaced upward — the [`crate::roles::Worker`] drops the
    /// message instead of requeuing it.
    pub fn handler(err: impl Into<anyhow::Error>) -> Self {
        Self::Handler {
            source: err.into(),
            retryable: false,
        }
    }

    /// A transient handler failure (`spec.md` §7 kind 1) — e.g. a dropped
    /// database connection encountered while handling a message. The
    /// [`crate::roles::Worker`] requeues the message instead of dropping
    /// it.
    pub fn handler_transient(err: impl Into<anyhow::Error>) -> Self {
        Self::Handler {
            source: err.into(),
            retryable: true,
        }
    }

    /// Transient failures are the ones the reconnect loop swallows and the
    /// worker's redelivery path requeues; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        matches!(self, BrokerError::Transport(_) | BrokerError::StreamClosed)
            || matches!(self, BrokerError::Handler { retryable: true, .. })
    }
}
