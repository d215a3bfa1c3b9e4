#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # saifu-broker
//! The broker-agent framework every saifu service is built on: a
//! [`Connector`](connector::Connector) to the AMQP broker, a single
//! [`run_agent`](agent::run_agent) loop parameterized by an
//! [`AgentRole`](agent::AgentRole) (instead of a publisher/subscriber/
//! dispatcher/worker type hierarchy), and a join-based
//! [`Supervisor`](supervisor::Supervisor).

pub mod agent;
pub mod connector;
pub mod error;
pub mod roles;
pub mod supervisor;
pub mod topology;

pub use agent::{AgentId, AgentRole, Event, run_agent};
pub use connector::{BrokerSettings, Connector, Credentials};
pub use error::BrokerError;
pub use supervisor::{Supervisor, SupervisorError};
