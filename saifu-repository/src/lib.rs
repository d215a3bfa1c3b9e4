#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # saifu-repository
//! The repository layer over the relational store (`spec.md` §3, §6): one
//! connection pool per process, a thin wrapper around each logical unit
//! of work (one persist, one query), and no connection sharing across
//! agent tasks beyond what `sqlx::PgPool` itself manages internally.

pub mod error;
pub mod jobs;
pub mod pool;
pub mod pricing;
pub mod ticks;

pub use error::RepoError;
pub use jobs::JobsRepository;
pub use pool::Pool;
pub use pricing::{PortfolioPositionPrice, PricingRepository};
pub use ticks::TicksRepository;
