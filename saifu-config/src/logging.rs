use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Mirrors `logging` in the YAML config (`spec.md` §6), grounded on
/// `original_source/core/models.py::LoggingSettings` and
/// `original_source/core/runtime.py::create_logger`.
///
/// `category` has no direct `tracing` analogue (Python's logger
/// hierarchy), so it is only used as a span-name prefix in the installed
/// subscriber; `location` names a log file the original wrote to in
/// addition to stderr, which this rewrite does not reproduce — every
/// service logs to stderr only, left to the process manager to capture.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub category: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "format")]
    pub log_format: Option<String>,
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    fn as_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "error",
        }
    }
}

/// Installs the process-wide `tracing` subscriber. Called exactly once
/// from each binary's `main`, before anything else runs — the idiomatic
/// replacement for the original's ambient `logging.getLogger(category)`
/// call scattered across every module (`spec.md` §9 "Global process
/// state": configuration is read once and passed down explicitly, which
/// extends naturally to the subscriber itself).
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    tracing::info!(category = %config.category, "logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_maps_to_warn_filter_directive() {
        assert_eq!(LogLevel::Warning.as_filter_directive(), "warn");
    }

    #[test]
    fn config_decodes_from_yaml() {
        let yaml = r#"
category: mktpub
level: info
format: "%(message)s"
"#;
        let config: LoggingConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.category, "mktpub");
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.log_format.as_deref(), Some("%(message)s"));
    }
}
