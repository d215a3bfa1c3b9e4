#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::too_many_arguments)]

//! # saifu-model
//! Domain types and wire codec shared by every service in the pricing
//! pipeline: [`Quote`](domain::Quote), [`AggregatedBatch`](domain::AggregatedBatch),
//! [`PricingJob`](domain::PricingJob) and the portfolio/position/historical-price
//! records the repository layer persists.

/// Core business objects: [`Quote`](domain::Quote), [`AggregatedBatch`](domain::AggregatedBatch),
/// [`PricingJob`](domain::PricingJob), portfolio settings/positions and historical price rows.
pub mod domain;

/// JSON wire codec for messages that travel over the broker exchanges.
pub mod codec;

pub use domain::{
    AggregatedBatch, InstrumentHistoricalPrice, JobStatus, PortfolioHistoricalPrice,
    PortfolioPosition, PortfolioPricingSettings, PricingJob, Quote,
};
