//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use secrecy::ExposeSecret;

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{ChannelError, Result, TransportError};

/// Interval between keepalive requests on an idle session.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Unanswered keepalives before the session is considered dead.
const KEEPALIVE_MAX: usize = 4;

/// SSH transport wrapping russh client.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Configuration used for this connection.
    config: SshConfig,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate.
    ///
    /// The TCP connect, key exchange and authentication together must
    /// finish within `config.timeout`; a server that accepts the socket
    /// and then stalls fails with [`TransportError::Timeout`].
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let timeout = config.timeout;
        match tokio::time::timeout(timeout, Self::establish(config)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout).into()),
        }
    }

    async fn establish(config: SshConfig) -> Result<Self> {
        // no inactivity timeout: firmware installs stay silent for minutes
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            keepalive_max: KEEPALIVE_MAX,
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("connecting to {}", config.socket_addr());

        let mut session = client::connect(ssh_config, (config.host.as_str(), config.port), handler)
            .await
            .map_err(|e| {
                // check_server_key may have stored a more precise reason
                let stored = host_key_error.lock().ok().and_then(|mut slot| slot.take());
                match (stored, e) {
                    (Some(hk_err), _) => hk_err,
                    (None, russh::Error::IO(source)) => TransportError::ConnectionFailed {
                        host: config.host.clone(),
                        port: config.port,
                        source,
                    },
                    (None, e) => TransportError::Ssh(e),
                }
            })?;

        Self::authenticate(&mut session, &config).await?;

        Ok(Self { session, config })
    }

    /// Open a new PTY channel with an interactive shell on this connection.
    ///
    /// Bounded by the connect timeout.
    pub async fn open_channel(&self) -> Result<Channel<Msg>> {
        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.request_shell()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout).into()),
        }
    }

    async fn request_shell(&self) -> Result<Channel<Msg>> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(ChannelError::PtyOpenFailed)?;

        channel
            .request_pty(
                true,
                "vt100",
                self.config.terminal_width,
                self.config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(ChannelError::PtyOpenFailed)?;

        channel
            .request_shell(true)
            .await
            .map_err(ChannelError::ShellRequestFailed)?;

        Ok(channel)
    }

    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host-key error surfaced by connect() instead of the
    /// generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, err: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(err);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("{}: failed to save host key: {}", self.host, e);
                    }
                    Ok(true)
                }
                Err(e) => Ok(self.reject(e)),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => Ok(self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                })),
                Err(e) => Ok(self.reject(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    use super::*;
    use crate::dispatch::HostStatus;

    /// Accepts one connection, sends an SSH banner and then never speaks again.
    async fn silent_server() -> (u16, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let _ = stream.write_all(b"SSH-2.0-stalled\r\n").await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        });
        (port, server)
    }

    #[tokio::test]
    async fn test_stalled_handshake_times_out() {
        let (port, server) = silent_server().await;

        let mut config = SshConfig::new("127.0.0.1", "admin", AuthMethod::password("secret"));
        config.port = port;
        config.timeout = Duration::from_millis(500);
        config.host_key_verification = HostKeyVerification::Disabled;

        let start = Instant::now();
        let result = tokio::time::timeout(Duration::from_secs(10), SshTransport::connect(config))
            .await
            .expect("connect must give up on its own");

        let err = match result {
            Ok(_) => panic!("handshake with a silent server succeeded"),
            Err(e) => e,
        };
        assert!(matches!(
            err,
            crate::Error::Transport(TransportError::Timeout(_))
        ));
        assert_eq!(err.status(), HostStatus::ConnectTimeout);
        assert!(start.elapsed() < Duration::from_secs(5));

        server.abort();
    }

    #[tokio::test]
    async fn test_refused_port_is_classified() {
        // bind then drop to get a port with nothing listening
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut config = SshConfig::new("127.0.0.1", "admin", AuthMethod::password("secret"));
        config.port = port;
        config.timeout = Duration::from_secs(5);
        config.host_key_verification = HostKeyVerification::Disabled;

        let err = match SshTransport::connect(config).await {
            Ok(_) => panic!("connected to a closed port"),
            Err(e) => e,
        };
        assert_eq!(err.status(), HostStatus::ConnectionRefused);
    }
}
