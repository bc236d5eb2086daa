//! Scripted sessions, connectors and probes for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::channel::TerminalSession;
use crate::dispatch::{Connector, ReachabilityProbe};
use crate::driver::DriverConfig;
use crate::error::{ChannelError, Result, TransportError};

/// Driver settings with near-zero waits and no setup commands.
pub(crate) fn fast_config() -> DriverConfig {
    DriverConfig::default()
        .with_poll_interval(Duration::from_millis(1))
        .with_response_delay(Duration::from_millis(1))
        .with_prompt_settle(Duration::ZERO)
        .with_command_timeout(Duration::from_secs(5))
        .with_setup_timeout(Duration::from_secs(5))
        .with_on_open_commands(Vec::<String>::new())
}

/// What the next poll returns.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Data(Vec<u8>),
    Silence,
    Fail,
}

impl Reply {
    pub(crate) fn data(text: &str) -> Self {
        Reply::Data(text.as_bytes().to_vec())
    }
}

/// Replays a fixed sequence of screen chunks, one per poll.
pub(crate) struct ScriptedSession {
    replies: VecDeque<Reply>,
    tail: Reply,
    sent: Arc<Mutex<Vec<String>>>,
    open: Option<Arc<AtomicUsize>>,
    closed: bool,
}

impl ScriptedSession {
    pub(crate) fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: replies.into(),
            tail: Reply::Silence,
            sent: Arc::default(),
            open: None,
            closed: false,
        }
    }

    /// Reply repeated once the script runs out.
    pub(crate) fn with_tail(mut self, tail: Reply) -> Self {
        self.tail = tail;
        self
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl TerminalSession for ScriptedSession {
    async fn send(&mut self, text: &str) -> Result<()> {
        if self.closed {
            return Err(ChannelError::Closed.into());
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn poll_buffer(&mut self) -> Result<Vec<u8>> {
        // yield so concurrently running workers interleave
        tokio::task::yield_now().await;
        match self.replies.pop_front().unwrap_or_else(|| self.tail.clone()) {
            Reply::Data(data) => Ok(data),
            Reply::Silence => Ok(Vec::new()),
            Reply::Fail => Err(ChannelError::Closed.into()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            if let Some(open) = &self.open {
                open.fetch_sub(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

/// Injected connection failure for a specific host.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    Refused,
    AuthRejected,
    ConnectTimeout,
    DropAfterBanner,
}

/// Hands out scripted sessions and records connection activity.
#[derive(Clone)]
pub(crate) struct MockConnector {
    script: Arc<dyn Fn() -> Vec<Reply> + Send + Sync>,
    faults: Arc<HashMap<String, Fault>>,
    connect_delay: Duration,
    connected: Arc<Mutex<Vec<String>>>,
    open: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
}

impl MockConnector {
    pub(crate) fn new<F>(script: F) -> Self
    where
        F: Fn() -> Vec<Reply> + Send + Sync + 'static,
    {
        Self {
            script: Arc::new(script),
            faults: Arc::default(),
            connect_delay: Duration::ZERO,
            connected: Arc::default(),
            open: Arc::default(),
            max_open: Arc::default(),
        }
    }

    pub(crate) fn with_fault(mut self, host: &str, fault: Fault) -> Self {
        Arc::make_mut(&mut self.faults).insert(host.to_string(), fault);
        self
    }

    pub(crate) fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Hosts for which a session was handed out.
    pub(crate) fn connected_hosts(&self) -> Vec<String> {
        self.connected.lock().unwrap().clone()
    }

    pub(crate) fn open_now(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub(crate) fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    type Session = ScriptedSession;

    async fn connect(&self, host: &str) -> Result<ScriptedSession> {
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        let mut replies = (self.script)();
        match self.faults.get(host) {
            Some(Fault::Refused) => {
                return Err(TransportError::ConnectionFailed {
                    host: host.to_string(),
                    port: 22,
                    source: io::ErrorKind::ConnectionRefused.into(),
                }
                .into());
            }
            Some(Fault::AuthRejected) => {
                return Err(TransportError::AuthenticationFailed {
                    user: "admin".to_string(),
                }
                .into());
            }
            Some(Fault::ConnectTimeout) => {
                return Err(TransportError::Timeout(Duration::from_secs(30)).into());
            }
            Some(Fault::DropAfterBanner) => replies.truncate(1),
            None => {}
        }

        self.connected.lock().unwrap().push(host.to_string());
        let now = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(now, Ordering::SeqCst);

        let mut session = ScriptedSession::new(replies);
        session.open = Some(self.open.clone());
        if matches!(self.faults.get(host), Some(Fault::DropAfterBanner)) {
            session.tail = Reply::Fail;
        }
        Ok(session)
    }
}

/// Probe with a fixed set of unreachable hosts.
pub(crate) struct MockProbe {
    down: HashSet<String>,
    delay: Duration,
}

impl MockProbe {
    pub(crate) fn all_up() -> Self {
        Self {
            down: HashSet::new(),
            delay: Duration::ZERO,
        }
    }

    /// Time each probe takes before answering.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn down<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            down: hosts.into_iter().map(Into::into).collect(),
            delay: Duration::ZERO,
        }
    }
}

impl ReachabilityProbe for MockProbe {
    async fn probe(&self, host: &str) -> bool {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        !self.down.contains(host)
    }
}
