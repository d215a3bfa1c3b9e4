use std::path::PathBuf;

use clap::Parser;

use crate::app::AppError;

/// Common CLI contract for every saifu binary (`spec.md` §6): the YAML
/// config path is the sole required argument. `mktpub` additionally
/// accepts zero or more `SOURCE_TARGET` pairs that, when present, replace
/// the configured pair set for that run (`SPEC_FULL.md` §4.3); the other
/// four binaries simply never populate `pairs`.
#[derive(Debug, Parser)]
#[command(about = "A saifu pricing pipeline service", version)]
pub struct Cli {
    /// Path to this service's YAML configuration file.
    pub config_path: PathBuf,

    /// Optional `SOURCE_TARGET` currency pairs, `mktpub` only.
    pub pairs: Vec<String>,
}

impl Cli {
    /// Parses `pairs` into `(source, target)` tuples. Each entry must be
    /// of the form `SOURCE_TARGET`, e.g. `BTC_USD`.
    pub fn parsed_pairs(&self) -> Result<Vec<(String, String)>, AppError> {
        self.pairs
            .iter()
            .map(|pair| {
                pair.split_once('_')
                    .map(|(source, target)| (source.to_string(), target.to_string()))
                    .ok_or_else(|| AppError::InvalidPair(pair.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_path_and_pairs() {
        let cli = Cli::parse_from(["mktpub", "config.yaml", "BTC_USD", "ETH_USD"]);
        assert_eq!(cli.config_path, PathBuf::from("config.yaml"));
        assert_eq!(
            cli.parsed_pairs().unwrap(),
            vec![
                ("BTC".to_string(), "USD".to_string()),
                ("ETH".to_string(), "USD".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_a_pair_with_no_separator() {
        let cli = Cli::parse_from(["mktpub", "config.yaml", "BTCUSD"]);
        assert!(cli.parsed_pairs().is_err());
    }
}
