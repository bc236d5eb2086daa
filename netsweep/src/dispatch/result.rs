//! Per-host outcome records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::driver::response::join_outputs;
use crate::driver::{CommandOutput, HostOutput};
use crate::error::Error;

/// Terminal status of one host in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HostStatus {
    Success,
    /// Liveness probe failed; no SSH attempted.
    Unreachable,
    AuthFailure,
    ConnectTimeout,
    ConnectionRefused,
    /// Any other SSH or channel fault.
    ProtocolError,
    /// A command never returned the prompt within its bounds.
    InteractiveLoopExceeded,
    /// The run was aborted while this host was in flight.
    Interrupted,
}

impl HostStatus {
    /// Label written in place of output for failed hosts.
    pub fn label(self) -> &'static str {
        match self {
            HostStatus::Success => "Success",
            HostStatus::Unreachable => "Unreachable",
            HostStatus::AuthFailure => "Authentication Failed",
            HostStatus::ConnectTimeout => "SSH Timeout",
            HostStatus::ConnectionRefused => "Connection Refused",
            HostStatus::ProtocolError => "SSH Error",
            HostStatus::InteractiveLoopExceeded => "Command Timeout",
            HostStatus::Interrupted => "Interrupted",
        }
    }

    /// Whether every command completed.
    pub fn is_success(self) -> bool {
        self == HostStatus::Success
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final record for one scheduled host.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub host: String,

    pub status: HostStatus,

    /// Hostname derived from the captured prompt, when one was captured.
    pub hostname: Option<String>,

    /// Completed commands, in order. On failure, those finished before it.
    pub outputs: Vec<CommandOutput>,

    /// Error description for failed hosts.
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl SessionResult {
    fn new(host: impl Into<String>, status: HostStatus, output: HostOutput) -> Self {
        let hostname = Some(output.prompt.hostname())
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        Self {
            host: host.into(),
            status,
            hostname,
            outputs: output.outputs,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// A host whose commands all completed.
    pub fn success(host: impl Into<String>, output: HostOutput) -> Self {
        Self::new(host, HostStatus::Success, output)
    }

    /// A host that failed the liveness probe.
    pub fn unreachable(host: impl Into<String>) -> Self {
        Self::new(host, HostStatus::Unreachable, HostOutput::default())
    }

    /// A failed host, classified from `err`, keeping any completed output.
    pub fn failed(host: impl Into<String>, err: &Error, partial: HostOutput) -> Self {
        Self::with_status(host, err.status(), err.to_string(), partial)
    }

    /// A failed host with an explicit status and message.
    pub fn with_status(
        host: impl Into<String>,
        status: HostStatus,
        message: impl Into<String>,
        partial: HostOutput,
    ) -> Self {
        let mut result = Self::new(host, status, partial);
        result.error = Some(message.into());
        result
    }

    /// Text for a report cell: joined outputs on success, the status label otherwise.
    pub fn summary(&self) -> String {
        if self.status.is_success() {
            join_outputs(&self.outputs)
        } else {
            self.status.label().to_string()
        }
    }
}
