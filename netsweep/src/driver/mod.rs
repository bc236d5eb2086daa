//! Command execution on an open terminal.
//!
//! [`CommandDriver`] runs one command at a time against a
//! [`TerminalSession`](crate::channel::TerminalSession), answering
//! confirmation and pagination prompts until the device prompt returns.

mod command;
mod config;
mod interactive;
pub(crate) mod response;

pub use command::CommandDriver;
pub use config::DriverConfig;
pub use interactive::AutoAnswer;
pub use response::{CommandOutput, HostOutput};
