//! JSON wire codec.
//!
//! The original implementation hydrated objects in two steps: construct an
//! empty instance, then mutate it from a decoded dict (`from_json`).
//! `spec.md` §9 asks for this to become explicit decode functions that
//! return immutable records instead — which in Rust is just
//! `serde::Deserialize`. What is left to provide here is a pair of thin,
//! explicitly-named functions so call sites read the same way the original
//! `utils.serialize`/`utils.unserialize` helpers did, without resurrecting
//! the hydrate step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode message body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode message body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encodes a message body as JSON bytes, as published onto a broker
/// exchange.
pub fn encode<T>(value: &T) -> Result<Vec<u8>, CodecError>
where
    T: Serialize,
{
    serde_json::to_vec(value).map_err(CodecError::Encode)
}

/// Decodes a message body received from a broker exchange.
pub fn decode<T>(body: &[u8]) -> Result<T, CodecError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_slice(body).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AggregatedBatch, JobStatus, PricingJob, Quote};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn quote_round_trips_to_posix_second_precision() {
        let original = Quote::new(
            "BTCUSD",
            dec!(64321.5),
            Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
        );
        let bytes = encode(&original).unwrap();
        let decoded: Quote = decode(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn pricing_job_round_trips_preserving_null_fields() {
        let job = PricingJob {
            identifier: None,
            portfolio_id: Uuid::new_v4(),
            snapshot_time: Utc::now(),
            target_ccy: "USD".to_string(),
            started_by: "SYSTEM".to_string(),
            status: JobStatus::New,
            start_time: Utc::now(),
            end_time: None,
        };
        let bytes = encode(&job).unwrap();
        let decoded: PricingJob = decode(&bytes).unwrap();
        assert_eq!(decoded.identifier, None);
        assert_eq!(decoded.end_time, None);
        assert_eq!(decoded.target_ccy, job.target_ccy);
    }

    #[test]
    fn batch_serialises_as_plain_json_array() {
        let batch = AggregatedBatch(vec![Quote::new("BTCUSD", dec!(100), Utc::now())]);
        let bytes = encode(&batch).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value.is_array());
        let decoded: AggregatedBatch = decode(&bytes).unwrap();
        assert_eq!(decoded, batch);
    }
}
