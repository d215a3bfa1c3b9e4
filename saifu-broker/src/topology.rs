//! Broker topology constants fixed by `spec.md` §6: the pricing work queue
//! always rides a direct exchange named `Direct-X` bound with routing key
//! `Key1`. Fan-out exchange names are configuration, not constants, since
//! each service names its own.

/// Direct exchange carrying pricing jobs to `portprice` workers.
pub const DIRECT_EXCHANGE: &str = "Direct-X";

/// Fixed routing key used for both [`Dispatcher`](crate::roles::dispatcher::Dispatcher)
/// publishes and [`Worker`](crate::roles::worker::Worker) bindings.
pub const ROUTING_KEY: &str = "Key1";
