//! Builder for SSH-backed dispatchers.

use std::path::PathBuf;
use std::time::Duration;

use super::connector::SshConnector;
use super::dispatcher::{DispatchConfig, Dispatcher};
use super::probe::{Liveness, PingProbe};
use crate::channel::PtyConfig;
use crate::driver::DriverConfig;
use crate::error::{DriverError, Result};
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig};

/// Builder for a [`Dispatcher`] that connects over SSH.
///
/// # Example
///
/// ```rust,no_run
/// use netsweep::dispatch::{DispatcherBuilder, HostJob};
///
/// # async fn example() -> Result<(), netsweep::Error> {
/// let dispatcher = DispatcherBuilder::new()
///     .username("admin")
///     .password("secret")
///     .max_sessions(5)
///     .build()?;
///
/// let jobs = HostJob::shared(["10.0.0.1", "10.0.0.2"], vec!["show version".into()]);
/// for result in dispatcher.run(jobs).await {
///     println!("{}: {}", result.host, result.status);
/// }
/// # Ok(())
/// # }
/// ```
pub struct DispatcherBuilder {
    port: u16,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    max_sessions: usize,
    liveness: Liveness,
    driver: DriverConfig,
    pty: PtyConfig,
}

impl DispatcherBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            port: 22,
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            max_sessions: 100,
            liveness: Liveness::default(),
            driver: DriverConfig::default(),
            pty: PtyConfig::default(),
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username used on every host (required).
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password used on every host (required).
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the PTY size in columns and rows (default: 511x24).
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the host key verification mode (default: accept new).
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a known_hosts file other than `~/.ssh/known_hosts`.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Maximum hosts processed at once (default: 100).
    pub fn max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Ping hosts before connecting (default), or skip the probe.
    pub fn ping(mut self, enabled: bool) -> Self {
        self.liveness = if enabled {
            Liveness::Ping(PingProbe::default())
        } else {
            Liveness::Assume
        };
        self
    }

    /// Ping hosts with custom count and wait settings.
    pub fn ping_probe(mut self, probe: PingProbe) -> Self {
        self.liveness = Liveness::Ping(probe);
        self
    }

    /// Set command timing and interactive limits.
    pub fn driver_config(mut self, config: DriverConfig) -> Self {
        self.driver = config;
        self
    }

    /// Set PTY read window and read size.
    pub fn pty_config(mut self, config: PtyConfig) -> Self {
        self.pty = config;
        self
    }

    /// Validate the settings and build the dispatcher.
    ///
    /// Nothing connects until [`Dispatcher::run`] is called.
    pub fn build(self) -> Result<Dispatcher<SshConnector, Liveness>> {
        let username = self
            .username
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| invalid("username is required"))?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| invalid("password is required"))?;

        let template = SshConfig {
            host: String::new(),
            port: self.port,
            username,
            auth: AuthMethod::password(password),
            timeout: self.timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        Dispatcher::new(
            SshConnector::new(template, self.pty),
            self.liveness,
            DispatchConfig {
                max_sessions: self.max_sessions,
                driver: self.driver,
            },
        )
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(message: &str) -> crate::Error {
    DriverError::InvalidConfig {
        message: message.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn assert_invalid(result: Result<Dispatcher<SshConnector, Liveness>>) {
        assert!(matches!(
            result.err(),
            Some(Error::Driver(DriverError::InvalidConfig { .. }))
        ));
    }

    #[test]
    fn test_username_required() {
        assert_invalid(DispatcherBuilder::new().password("secret").build());
        assert_invalid(DispatcherBuilder::new().username("  ").password("secret").build());
    }

    #[test]
    fn test_password_required() {
        assert_invalid(DispatcherBuilder::new().username("admin").build());
    }

    #[test]
    fn test_zero_sessions_rejected() {
        assert_invalid(
            DispatcherBuilder::new()
                .username("admin")
                .password("secret")
                .max_sessions(0)
                .build(),
        );
    }

    #[test]
    fn test_build_applies_settings() {
        let dispatcher = DispatcherBuilder::new()
            .username("admin")
            .password("secret")
            .port(2222)
            .max_sessions(5)
            .ping(false)
            .build()
            .unwrap();

        assert_eq!(dispatcher.max_sessions(), 5);
        assert_eq!(dispatcher.available_permits(), 5);
    }
}
