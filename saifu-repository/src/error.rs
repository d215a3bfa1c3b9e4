use thiserror::Error;

/// Transient transport failures (`spec.md` §7 kind 1) are represented by
/// [`RepoError::Connection`] and are the only variant the caller's
/// reconnect logic should treat as recoverable; [`RepoError::Invariant`]
/// is a programmer error (`spec.md` §7 kind 3) that should crash the
/// process, not be caught.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database connection failure: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("repository invariant violated: {0}")]
    Invariant(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => RepoError::Connection(err),
            other => RepoError::Query(other),
        }
    }
}

impl RepoError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RepoError::Connection(_))
    }
}
