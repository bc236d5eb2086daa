//! # netsweep
//!
//! Async engine for running CLI command sequences on fleets of Cisco
//! devices over interactive SSH shells.
//!
//! ## Features
//!
//! - Async SSH connections via russh, one PTY shell per device
//! - Prompt-based completion detection on an ANSI-stripped screen
//! - Automatic answers to `[confirm]`, `[yes/no]` and `--More--` prompts
//! - Bounded concurrency with a ping check before each connection
//! - Per-host command sequences, IPv4 range expansion and Catalyst
//!   firmware staging jobs
//! - Per-host outcome classification and CSV / JSON reports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netsweep::dispatch::{DispatcherBuilder, HostJob};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netsweep::Error> {
//!     let dispatcher = DispatcherBuilder::new()
//!         .username("admin")
//!         .password("secret")
//!         .max_sessions(10)
//!         .build()?;
//!
//!     let jobs = HostJob::shared(
//!         ["192.168.1.1", "192.168.1.2"],
//!         vec!["show version".to_string()],
//!     );
//!
//!     for result in dispatcher.run(jobs).await {
//!         println!("{}: {}", result.host, result.summary());
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod inventory;
pub mod report;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use channel::{CaptureOutcome, DevicePrompt, PromptDetector, TerminalSession};
pub use dispatch::{Dispatcher, DispatcherBuilder, HostJob, HostStatus, SessionResult};
pub use driver::{CommandDriver, DriverConfig};
pub use error::{Error, Result};
pub use transport::{AuthMethod, SshConfig};
