//! Concurrent fan-out of command sequences across many hosts.
//!
//! The [`Dispatcher`] gives every host its own worker. Workers share a
//! semaphore sized by `max_sessions`, probe reachability, connect, run the
//! command sequence and push exactly one [`SessionResult`] into a shared
//! [`ResultSink`].

mod builder;
mod connector;
mod dispatcher;
mod probe;
mod result;
mod sink;

pub use builder::DispatcherBuilder;
pub use connector::{Connector, SshConnector};
pub use dispatcher::{DispatchConfig, Dispatcher, HostJob, ShutdownHandle};
pub use probe::{Liveness, PingProbe, ReachabilityProbe};
pub use result::{HostStatus, SessionResult};
pub use sink::ResultSink;
