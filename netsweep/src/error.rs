//! Error types for netsweep.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::dispatch::HostStatus;

/// Main error type for netsweep operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

impl Error {
    /// Classify this error into the status reported for a host.
    pub fn status(&self) -> HostStatus {
        match self {
            Error::Transport(e) => e.status(),
            Error::Channel(_) => HostStatus::ProtocolError,
            Error::Driver(DriverError::InteractiveLoopExceeded { .. }) => {
                HostStatus::InteractiveLoopExceeded
            }
            Error::Driver(DriverError::Interrupted) => HostStatus::Interrupted,
            Error::Driver(_) => HostStatus::ProtocolError,
        }
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host is not in known_hosts and verification is strict
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host presented a key different from the one on record
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Reading or writing known_hosts failed
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Classify a transport failure without looking at its message.
    pub fn status(&self) -> HostStatus {
        match self {
            TransportError::AuthenticationFailed { .. } => HostStatus::AuthFailure,
            TransportError::Timeout(_) => HostStatus::ConnectTimeout,
            TransportError::ConnectionFailed { source, .. } => io_status(source),
            TransportError::Ssh(russh::Error::IO(source)) => io_status(source),
            _ => HostStatus::ProtocolError,
        }
    }
}

fn io_status(err: &io::Error) -> HostStatus {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => HostStatus::ConnectionRefused,
        io::ErrorKind::TimedOut => HostStatus::ConnectTimeout,
        _ => HostStatus::ProtocolError,
    }
}

/// Channel layer errors (PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to open the session channel or its PTY
    #[error("Failed to open PTY channel: {0}")]
    PtyOpenFailed(russh::Error),

    /// Failed to request shell
    #[error("Failed to request shell: {0}")]
    ShellRequestFailed(russh::Error),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Driver layer errors (command execution, dispatch setup).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Invalid configuration handed to a builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The device never returned its prompt within the allowed bound
    #[error(
        "Command '{command}' did not complete after {elapsed:?} ({responses} interactive responses)"
    )]
    InteractiveLoopExceeded {
        command: String,
        elapsed: Duration,
        responses: usize,
    },

    /// The run was interrupted by a global shutdown
    #[error("Interrupted")]
    Interrupted,
}

/// Result type alias using netsweep's Error.
pub type Result<T> = std::result::Result<T, Error>;
