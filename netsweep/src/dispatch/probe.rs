//! Liveness probing before SSH is attempted.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use tokio::process::Command;

/// Decides whether a host is worth connecting to.
pub trait ReachabilityProbe: Send + Sync + 'static {
    fn probe(&self, host: &str) -> impl Future<Output = bool> + Send;
}

/// ICMP echo through the system `ping` binary.
#[derive(Debug, Clone)]
pub struct PingProbe {
    /// Echo requests sent per host.
    pub count: u32,

    /// Wait for each reply.
    pub wait: Duration,
}

impl Default for PingProbe {
    fn default() -> Self {
        Self {
            count: 4,
            wait: Duration::from_secs(2),
        }
    }
}

impl PingProbe {
    fn command(&self, host: &str) -> Command {
        let mut cmd = Command::new("ping");
        if cfg!(windows) {
            cmd.args([
                "-n".to_string(),
                self.count.to_string(),
                "-w".to_string(),
                self.wait.as_millis().to_string(),
            ]);
        } else {
            cmd.args([
                "-c".to_string(),
                self.count.to_string(),
                "-W".to_string(),
                self.wait.as_secs().max(1).to_string(),
            ]);
        }
        cmd.arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Worst case for the whole probe before it is abandoned.
    fn deadline(&self) -> Duration {
        self.wait * (self.count + 1) + Duration::from_secs(1)
    }
}

impl ReachabilityProbe for PingProbe {
    async fn probe(&self, host: &str) -> bool {
        if host.is_empty() || host.starts_with('-') {
            warn!("refusing to ping suspicious host {:?}", host);
            return false;
        }

        match tokio::time::timeout(self.deadline(), self.command(host).status()).await {
            Ok(Ok(status)) => {
                debug!("{}: ping exited with {}", host, status);
                status.success()
            }
            Ok(Err(e)) => {
                warn!("{}: could not run ping: {}", host, e);
                false
            }
            Err(_) => {
                debug!("{}: ping did not finish within {:?}", host, self.deadline());
                false
            }
        }
    }
}

/// Liveness policy chosen at build time.
#[derive(Debug, Clone)]
pub enum Liveness {
    /// Ping each host first; unreachable hosts are skipped.
    Ping(PingProbe),
    /// Treat every host as reachable.
    Assume,
}

impl Default for Liveness {
    fn default() -> Self {
        Liveness::Ping(PingProbe::default())
    }
}

impl ReachabilityProbe for Liveness {
    async fn probe(&self, host: &str) -> bool {
        match self {
            Liveness::Ping(ping) => ping.probe(host).await,
            Liveness::Assume => true,
        }
    }
}
