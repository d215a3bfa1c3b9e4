//! Concrete [`crate::agent::AgentRole`] descriptors for the four roles
//! `spec.md` §4.1 names: [`publisher`], [`subscriber`], [`dispatcher`],
//! [`worker`]. Each is a small struct; all the shared lifecycle logic
//! lives once in [`crate::agent::run_agent`].

pub mod dispatcher;
pub mod publisher;
pub mod subscriber;
pub mod worker;

pub use dispatcher::{Dispatcher, DispatcherWork, DispatchHandle};
pub use publisher::{Publisher, PublisherWork, PublishHandle};
pub use subscriber::{Subscriber, SubscriberHandler};
pub use worker::{Worker, WorkerHandler};
