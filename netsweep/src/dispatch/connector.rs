//! Opening terminal sessions for the dispatcher.

use std::future::Future;

use crate::channel::{PtyConfig, SshTerminal, TerminalSession};
use crate::error::Result;
use crate::transport::SshConfig;

/// Opens an authenticated terminal session to a host.
pub trait Connector: Send + Sync + 'static {
    type Session: TerminalSession + 'static;

    fn connect(&self, host: &str) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// Connects over SSH with settings shared by every host of a run.
#[derive(Debug, Clone)]
pub struct SshConnector {
    /// Port, credentials, timeouts; `host` is replaced per connection.
    template: SshConfig,
    pty: PtyConfig,
}

impl SshConnector {
    /// Connector that opens every host with `template` settings and
    /// `pty` read limits. The template's host field is ignored.
    pub fn new(template: SshConfig, pty: PtyConfig) -> Self {
        Self { template, pty }
    }
}

impl Connector for SshConnector {
    type Session = SshTerminal;

    async fn connect(&self, host: &str) -> Result<SshTerminal> {
        SshTerminal::open(self.template.for_host(host), self.pty.clone()).await
    }
}
