use std::path::Path;

use saifu_broker::{BrokerSettings, Credentials};
use saifu_repository::pool::DatabaseSettings;
use serde::Deserialize;
use thiserror::Error;

use crate::logging::LoggingConfig;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid SOURCE_TARGET pair: {0}")]
    InvalidPair(String),
}

fn default_mq_port() -> u16 {
    5672
}

fn default_vhost() -> String {
    "/".to_string()
}

/// Mirrors `app.mq` in the YAML config (`spec.md` §6), shared verbatim
/// across all five services.
#[derive(Debug, Clone, Deserialize)]
pub struct MqConfig {
    pub host: String,
    #[serde(default = "default_mq_port")]
    pub port: u16,
    #[serde(default = "default_vhost")]
    pub vhost: String,
    pub credentials: MqCredentials,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqCredentials {
    pub username: String,
    pub password: String,
}

impl MqConfig {
    pub fn into_broker_settings(self) -> BrokerSettings {
        BrokerSettings {
            host: self.host,
            port: self.port,
            vhost: self.vhost,
            credentials: Credentials {
                username: self.credentials.username,
                password: self.credentials.password,
            },
        }
    }
}

fn default_db_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    5
}

/// Mirrors `app.database` in the YAML config (`spec.md` §6), used by
/// `ingesticks`, `schedprice` and `portprice`.
#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub database: String,
    pub credentials: DbCredentials,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbCredentials {
    pub username: String,
    pub password: String,
}

impl DbConfig {
    pub fn into_database_settings(self) -> DatabaseSettings {
        DatabaseSettings {
            host: self.host,
            port: self.port,
            database: self.database,
            username: self.credentials.username,
            password: self.credentials.password,
            max_connections: self.max_connections,
        }
    }
}

/// `mktpub`'s `app` config (`spec.md` §6, `SPEC_FULL.md` §4.3).
#[derive(Debug, Clone, Deserialize)]
pub struct MktPubConfig {
    pub pull_delay: u64,
    pub exchange: String,
    pub res: String,
    pub mq: MqConfig,
    /// The default pair set, overridden by CLI `SOURCE_TARGET` arguments
    /// when present (`SPEC_FULL.md` §4.3).
    #[serde(default)]
    pub pairs: Vec<CcyPair>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CcyPair {
    pub source: String,
    pub target: String,
}

/// `mktagg`'s `app` config (`spec.md` §6, `SPEC_FULL.md` §4.4).
#[derive(Debug, Clone, Deserialize)]
pub struct MktAggConfig {
    pub aggregation_window: u64,
    pub sub_exchange: String,
    pub pub_exchange: String,
    pub mq: MqConfig,
    /// Resolves `spec.md` §9's open question: whether the first window
    /// closes immediately on the first event. Defaults to `true`.
    #[serde(default = "default_start_immediate")]
    pub start_immediate: bool,
    /// Bound on the in-process hand-off channel between the subscriber
    /// and publisher tasks (`SPEC_FULL.md` §4.4).
    #[serde(default = "default_handoff_capacity")]
    pub handoff_capacity: usize,
    /// Timeout, in seconds, the publisher task waits for a batch before
    /// looping back to check for shutdown (`spec.md` §5).
    #[serde(default = "default_wait_seconds")]
    pub wait: u64,
}

fn default_start_immediate() -> bool {
    true
}

fn default_handoff_capacity() -> usize {
    64
}

fn default_wait_seconds() -> u64 {
    5
}

/// `ingesticks`'s `app` config (`spec.md` §6, `SPEC_FULL.md` §4.5).
#[derive(Debug, Clone, Deserialize)]
pub struct IngestiCksConfig {
    pub exchange: String,
    pub database: DbConfig,
    pub mq: MqConfig,
}

/// `schedprice`'s `app` config (`spec.md` §6, `SPEC_FULL.md` §4.6).
#[derive(Debug, Clone, Deserialize)]
pub struct SchedPriceConfig {
    pub pull_delay: u64,
    pub work_queue: String,
    pub database: DbConfig,
    pub mq: MqConfig,
}

/// `portprice`'s `app` config (`spec.md` §6, `SPEC_FULL.md` §4.7).
#[derive(Debug, Clone, Deserialize)]
pub struct PortPriceConfig {
    pub work_queue: String,
    pub database: DbConfig,
    pub mq: MqConfig,
}

/// The top-level `conf: { logging, app }` shape every YAML config file
/// shares (`spec.md` §6), parameterized over the per-service `app` type.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile<App> {
    pub logging: LoggingConfig,
    pub app: App,
}

impl<App> ConfigFile<App>
where
    App: for<'de> Deserialize<'de>,
{
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|source| AppError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| AppError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mktpub_config_decodes_from_yaml() {
        let yaml = r#"
logging:
  category: mktpub
  level: info
app:
  pull_delay: 5
  exchange: quotes
  res: "http://provider/{sources}/{targets}"
  mq:
    host: broker.internal
    credentials:
      username: guest
      password: guest
  pairs:
    - source: BTC
      target: USD
"#;
        let config: ConfigFile<MktPubConfig> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app.pull_delay, 5);
        assert_eq!(config.app.pairs.len(), 1);
        assert_eq!(config.app.mq.port, 5672);
    }

    #[test]
    fn mktagg_config_defaults_start_immediate_true() {
        let yaml = r#"
logging:
  category: mktagg
  level: debug
app:
  aggregation_window: 60
  sub_exchange: quotes
  pub_exchange: quotes.aggregated
  mq:
    host: broker.internal
    credentials:
      username: guest
      password: guest
"#;
        let config: ConfigFile<MktAggConfig> = serde_yaml::from_str(yaml).unwrap();
        assert!(config.app.start_immediate);
        assert_eq!(config.app.handoff_capacity, 64);
    }
}
