use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;
use saifu_model::Quote;
use thiserror::Error;

/// The provider's unified error taxonomy, grounded on
/// `original_source/mktpub/quotesrequester.py::RequesterException` (a
/// single string-message exception there; here split into the three
/// causes it actually covered).
#[derive(Debug, Error)]
pub enum RequesterError {
    #[error("unable to send request to provider: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider responded with unexpected http status {status}")]
    Http { status: reqwest::StatusCode },
    #[error("provider reported an error: {message}")]
    Provider { message: String },
}

/// Requests quotes for a configured set of `(source, target)` pairs
/// (`spec.md` §4.3), grounded on
/// `original_source/mktpub/quotesrequester.py::Requester`.
pub struct Requester {
    client: reqwest::Client,
    resource_template: String,
}

impl Requester {
    pub fn new(resource_template: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            resource_template: resource_template.into(),
        }
    }

    /// Queries the provider once with the union of source currencies and
    /// the union of target currencies from `pairs`, then emits one
    /// `Quote` per `(source, target)` entry actually present in the
    /// response — the cross-product reduction `spec.md` §4.3 names, not
    /// filtered back down to the originally configured pair set.
    pub async fn fetch(&self, pairs: &[(String, String)]) -> Result<Vec<Quote>, RequesterError> {
        let (sources, targets) = extract_sources_targets(pairs);
        let url = build_url(&self.resource_template, &sources, &targets);

        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(RequesterError::Http {
                status: response.status(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        if is_error_response(&body) {
            return Err(RequesterError::Provider {
                message: error_message(&body),
            });
        }

        let data: HashMap<String, HashMap<String, Decimal>> =
            serde_json::from_value(body).map_err(|err| RequesterError::Provider {
                message: format!("unexpected response shape: {err}"),
            })?;

        let timestamp = Utc::now();
        Ok(extract_pairs(&data, timestamp))
    }
}

fn extract_sources_targets(pairs: &[(String, String)]) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut sources = BTreeSet::new();
    let mut targets = BTreeSet::new();
    for (source, target) in pairs {
        sources.insert(source.clone());
        targets.insert(target.clone());
    }
    (sources, targets)
}

fn build_url(template: &str, sources: &BTreeSet<String>, targets: &BTreeSet<String>) -> String {
    let joined_sources = sources.iter().cloned().collect::<Vec<_>>().join(",");
    let joined_targets = targets.iter().cloned().collect::<Vec<_>>().join(",");
    template
        .replace("{sources}", &joined_sources)
        .replace("{targets}", &joined_targets)
}

fn is_error_response(body: &serde_json::Value) -> bool {
    body.get("Response")
        .and_then(|v| v.as_str())
        .map(|v| v == "Error")
        .unwrap_or(false)
}

fn error_message(body: &serde_json::Value) -> String {
    body.get("Message")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string()
}

fn extract_pairs(
    data: &HashMap<String, HashMap<String, Decimal>>,
    timestamp: chrono::DateTime<Utc>,
) -> Vec<Quote> {
    data.iter()
        .flat_map(|(source, by_target)| {
            by_target.iter().map(move |(target, price)| {
                Quote::new(format!("{source}{target}"), *price, timestamp)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn builds_url_from_union_of_sources_and_targets() {
        let pairs = vec![
            ("BTC".to_string(), "USD".to_string()),
            ("ETH".to_string(), "USD".to_string()),
            ("BTC".to_string(), "EUR".to_string()),
        ];
        let (sources, targets) = extract_sources_targets(&pairs);
        let url = build_url("http://provider/{sources}/{targets}", &sources, &targets);
        assert_eq!(url, "http://provider/BTC,ETH/EUR,USD");
    }

    #[test]
    fn extracts_a_quote_per_source_target_price_entry() {
        let mut by_target = HashMap::new();
        by_target.insert("USD".to_string(), dec!(64321.5));
        let mut data = HashMap::new();
        data.insert("BTC".to_string(), by_target);

        let timestamp = Utc::now();
        let quotes = extract_pairs(&data, timestamp);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].ticker, "BTCUSD");
        assert_eq!(quotes[0].price, dec!(64321.5));
    }

    #[test]
    fn detects_the_provider_error_envelope() {
        let body = serde_json::json!({"Response": "Error", "Message": "rate limited"});
        assert!(is_error_response(&body));
        assert_eq!(error_message(&body), "rate limited");
    }

    #[test]
    fn ordinary_data_is_not_mistaken_for_an_error() {
        let body = serde_json::json!({"BTC": {"USD": "64321.5"}});
        assert!(!is_error_response(&body));
    }
}
