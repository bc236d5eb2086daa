//! Bounded fan-out of one worker per host.

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};

use super::connector::Connector;
use super::probe::ReachabilityProbe;
use super::result::{HostStatus, SessionResult};
use super::sink::ResultSink;
use crate::channel::TerminalSession;
use crate::driver::{CommandDriver, DriverConfig, HostOutput};
use crate::error::{DriverError, Result};

/// One host and the commands to run on it.
#[derive(Debug, Clone)]
pub struct HostJob {
    pub host: String,
    pub commands: Arc<Vec<String>>,
}

impl HostJob {
    /// Create a job running `commands` on `host`.
    pub fn new(host: impl Into<String>, commands: Arc<Vec<String>>) -> Self {
        Self {
            host: host.into(),
            commands,
        }
    }

    /// The same command sequence for every host.
    pub fn shared<I, S>(hosts: I, commands: Vec<String>) -> Vec<HostJob>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let commands = Arc::new(commands);
        hosts
            .into_iter()
            .map(|host| HostJob::new(host, commands.clone()))
            .collect()
    }
}

/// Settings for a dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum hosts processed at the same time.
    pub max_sessions: usize,

    pub driver: DriverConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_sessions: 100,
            driver: DriverConfig::default(),
        }
    }
}

/// Triggers the global interrupt of a running dispatch.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Stop scheduling hosts and unwind every in-flight worker.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Whether a shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Runs command sequences across many hosts under a concurrency ceiling.
///
/// Each host gets a permit from a fixed pool before anything else
/// happens, then a probe, then an SSH session driven by a
/// [`CommandDriver`]. The permit is released when the worker ends,
/// whatever the outcome. [`run`](Self::run) returns once every scheduled
/// host has a [`SessionResult`].
pub struct Dispatcher<C, P> {
    connector: Arc<C>,
    probe: Arc<P>,
    driver: Arc<CommandDriver>,
    permits: Arc<Semaphore>,
    max_sessions: usize,
    shutdown: Arc<watch::Sender<bool>>,
}

impl<C: Connector, P: ReachabilityProbe> Dispatcher<C, P> {
    /// Create a dispatcher, rejecting a zero or oversized session limit.
    pub fn new(connector: C, probe: P, config: DispatchConfig) -> Result<Self> {
        if config.max_sessions == 0 {
            return Err(DriverError::InvalidConfig {
                message: "max_sessions must be at least 1".to_string(),
            }
            .into());
        }
        if config.max_sessions > Semaphore::MAX_PERMITS {
            return Err(DriverError::InvalidConfig {
                message: format!("max_sessions must not exceed {}", Semaphore::MAX_PERMITS),
            }
            .into());
        }

        let (tx, _) = watch::channel(false);
        Ok(Self {
            connector: Arc::new(connector),
            probe: Arc::new(probe),
            driver: Arc::new(CommandDriver::new(config.driver)),
            permits: Arc::new(Semaphore::new(config.max_sessions)),
            max_sessions: config.max_sessions,
            shutdown: Arc::new(tx),
        })
    }

    /// Handle that interrupts this dispatcher from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown.clone(),
        }
    }

    /// Concurrency ceiling this dispatcher was built with.
    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Permits not currently held by a worker.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run every job and return one result per scheduled host.
    ///
    /// Hosts not yet scheduled when a shutdown arrives are left out.
    pub async fn run(&self, jobs: impl IntoIterator<Item = HostJob>) -> Vec<SessionResult> {
        let sink = ResultSink::new();
        let mut shutdown = self.shutdown.subscribe();
        let mut workers = Vec::new();

        for job in jobs {
            let permit = tokio::select! {
                biased;
                _ = cancelled(&mut shutdown) => {
                    warn!("shutdown requested, not scheduling {} or later hosts", job.host);
                    break;
                }
                permit = self.permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let worker = Worker {
                connector: self.connector.clone(),
                probe: self.probe.clone(),
                driver: self.driver.clone(),
                sink: sink.clone(),
                shutdown: self.shutdown.subscribe(),
            };
            let host = job.host.clone();
            debug!("{}: scheduled", host);
            workers.push((host, tokio::spawn(worker.run(job, permit))));
        }

        for (host, handle) in workers {
            if let Err(e) = handle.await {
                error!("{}: worker failed: {}", host, e);
                sink.push(SessionResult::with_status(
                    host,
                    HostStatus::ProtocolError,
                    format!("worker failed: {e}"),
                    HostOutput::default(),
                ));
            }
        }

        sink.drain()
    }
}

/// Resolves once a shutdown has been requested.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        // sender gone: no shutdown can ever arrive
        std::future::pending::<()>().await;
    }
}

struct Worker<C, P> {
    connector: Arc<C>,
    probe: Arc<P>,
    driver: Arc<CommandDriver>,
    sink: ResultSink,
    shutdown: watch::Receiver<bool>,
}

impl<C: Connector, P: ReachabilityProbe> Worker<C, P> {
    async fn run(mut self, job: HostJob, _permit: OwnedSemaphorePermit) {
        let result = self.process(&job).await;
        info!("{}: {}", job.host, result.status);
        self.sink.push(result);
    }

    async fn process(&mut self, job: &HostJob) -> SessionResult {
        let host = job.host.as_str();

        let reachable = tokio::select! {
            biased;
            _ = cancelled(&mut self.shutdown) => return interrupted(host, HostOutput::default()),
            reachable = self.probe.probe(host) => reachable,
        };
        if !reachable {
            info!("{}: failed liveness probe, skipping", host);
            return SessionResult::unreachable(host);
        }

        let connected = tokio::select! {
            biased;
            _ = cancelled(&mut self.shutdown) => return interrupted(host, HostOutput::default()),
            connected = self.connector.connect(host) => connected,
        };
        let mut session = match connected {
            Ok(session) => session,
            Err(e) => {
                warn!("{}: connect failed: {}", host, e);
                return SessionResult::failed(host, &e, HostOutput::default());
            }
        };
        info!("{}: connection established", host);

        let mut output = HostOutput::default();
        let outcome = tokio::select! {
            biased;
            _ = cancelled(&mut self.shutdown) => Err(DriverError::Interrupted.into()),
            outcome = self.driver.run(&mut session, &job.commands, &mut output) => outcome,
        };

        if let Err(e) = session.close().await {
            debug!("{}: close failed: {}", host, e);
        }

        match outcome {
            Ok(()) => SessionResult::success(host, output),
            Err(e) => {
                warn!("{}: {}", host, e);
                SessionResult::failed(host, &e, output)
            }
        }
    }
}

fn interrupted(host: &str, output: HostOutput) -> SessionResult {
    SessionResult::failed(host, &DriverError::Interrupted.into(), output)
}
