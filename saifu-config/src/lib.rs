#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # saifu-config
//! Ambient concerns every saifu binary shares: YAML configuration decoding
//! into per-service [`app`] structs, [`cli`] argument parsing, and
//! [`logging`] subscriber setup. None of this is part of the pricing
//! pipeline's own design — it is the startup scaffolding around it.

pub mod app;
pub mod cli;
pub mod logging;

pub use app::{
    AppError, ConfigFile, IngestiCksConfig, MktAggConfig, MktPubConfig, PortPriceConfig,
    SchedPriceConfig,
};
pub use cli::Cli;
pub use logging::LoggingConfig;
