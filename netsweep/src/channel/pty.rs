//! Interactive terminal sessions.
//!
//! [`TerminalSession`] is the seam between the command driver and the wire:
//! send text, read whatever the device printed, close. [`SshTerminal`] is
//! the russh-backed implementation.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use super::buffer::ScreenBuffer;
use super::prompt::DevicePrompt;
use crate::error::{ChannelError, Result};
use crate::transport::{SshConfig, SshTransport};

/// An interactive shell on a single device.
pub trait TerminalSession: Send {
    /// Write raw text to the shell. Callers add their own newline.
    fn send(&mut self, text: &str) -> impl Future<Output = Result<()>> + Send;

    /// Read everything the device has produced since the last call.
    ///
    /// Returns an empty vector when nothing new is available.
    fn poll_buffer(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Release the remote shell and the connection. Safe to call twice.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Wait `settle` for the welcome banner, then read its trailing
    /// non-empty line as the device prompt.
    fn capture_prompt(&mut self, settle: Duration) -> impl Future<Output = Result<DevicePrompt>> + Send {
        async move {
            tokio::time::sleep(settle).await;
            let banner = self.poll_buffer().await?;
            let mut screen = ScreenBuffer::new();
            screen.extend(&banner);
            Ok(DevicePrompt::from_screen(screen.as_slice()))
        }
    }
}

/// Configuration for PTY reads.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// How long a read waits for the next message before returning.
    pub read_window: Duration,

    /// Upper bound on bytes returned by a single poll.
    pub max_read: usize,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            read_window: Duration::from_millis(100),
            max_read: 64 * 1024,
        }
    }
}

/// SSH connection plus PTY shell to one device.
pub struct SshTerminal {
    transport: Option<SshTransport>,
    channel: Channel<Msg>,
    config: PtyConfig,
    host: String,
    eof: bool,
}

impl SshTerminal {
    /// Connect, authenticate and start an interactive shell.
    pub async fn open(ssh: SshConfig, config: PtyConfig) -> Result<Self> {
        let host = ssh.host.clone();
        let transport = SshTransport::connect(ssh).await?;

        let channel = match transport.open_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    debug!("{}: close after failed shell request: {}", host, close_err);
                }
                return Err(e);
            }
        };

        debug!("{}: shell opened", host);

        Ok(Self {
            transport: Some(transport),
            channel,
            config,
            host,
            eof: false,
        })
    }
}

impl TerminalSession for SshTerminal {
    async fn send(&mut self, text: &str) -> Result<()> {
        if self.transport.is_none() {
            return Err(ChannelError::Closed.into());
        }
        self.channel
            .data(text.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn poll_buffer(&mut self) -> Result<Vec<u8>> {
        if self.transport.is_none() {
            return Err(ChannelError::Closed.into());
        }

        let mut data = Vec::new();
        while !self.eof && data.len() < self.config.max_read {
            match tokio::time::timeout(self.config.read_window, self.channel.wait()).await {
                Err(_) => break,
                Ok(Some(ChannelMsg::Data { data: chunk })) => data.extend_from_slice(&chunk),
                Ok(Some(ChannelMsg::ExtendedData { data: chunk, .. })) => {
                    data.extend_from_slice(&chunk)
                }
                Ok(Some(ChannelMsg::Eof)) | Ok(Some(ChannelMsg::Close)) | Ok(None) => {
                    debug!("{}: remote closed the shell", self.host);
                    self.eof = true;
                }
                Ok(Some(_)) => {}
            }
        }

        if data.is_empty() && self.eof {
            return Err(ChannelError::Closed.into());
        }
        Ok(data)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(transport) = self.transport.take() else {
            return Ok(());
        };

        if !self.eof {
            if let Err(e) = self.channel.eof().await {
                debug!("{}: eof on close: {}", self.host, e);
            }
        }
        if let Err(e) = self.channel.close().await {
            debug!("{}: channel close: {}", self.host, e);
        }

        transport.close().await?;
        debug!("{}: connection closed", self.host);
        Ok(())
    }
}

impl Drop for SshTerminal {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!("{}: terminal dropped without close()", self.host);
        }
    }
}
