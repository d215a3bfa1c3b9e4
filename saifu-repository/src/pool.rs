use crate::error::RepoError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Database connection parameters, mirrors `app.database` in the YAML
/// config (`spec.md` §6).
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A small wrapper around `sqlx::PgPool`, the shared connection pool every
/// repository is built from. Each service owns exactly one `Pool`;
/// `sqlx` multiplexes it across the agent tasks that use it.
#[derive(Debug, Clone)]
pub struct Pool {
    pub(crate) inner: PgPool,
}

impl Pool {
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, RepoError> {
        let inner = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.connection_url())
            .await?;
        Ok(Self { inner })
    }

    /// Wraps an already-connected pool. Used by `sqlx::test`-provisioned
    /// integration tests, which hand back a ready `PgPool` rather than
    /// connection settings.
    pub fn from_pg_pool(inner: PgPool) -> Self {
        Self { inner }
    }

    /// Runs the workspace migrations (`saifu-repository/migrations/`)
    /// against the connected database. An ambient test/dev convenience —
    /// the original relied on hand-run SQL scripts.
    pub async fn migrate(&self) -> Result<(), RepoError> {
        sqlx::migrate!("./migrations")
            .run(&self.inner)
            .await
            .map_err(|err| RepoError::Invariant(err.to_string()))
    }
}
