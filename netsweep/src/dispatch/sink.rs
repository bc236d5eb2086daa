//! Shared collection point for per-host results.

use std::sync::{Arc, Mutex, MutexGuard};

use super::result::SessionResult;

/// Append-only result collection shared by all workers of a run.
///
/// Workers push concurrently; the dispatcher drains once every worker has
/// been joined. Order of results is the order workers finished in.
#[derive(Debug, Clone, Default)]
pub struct ResultSink {
    results: Arc<Mutex<Vec<SessionResult>>>,
}

impl ResultSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one host's result. Safe to call from any worker.
    pub fn push(&self, result: SessionResult) {
        self.lock().push(result);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take everything collected so far.
    pub fn drain(&self) -> Vec<SessionResult> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SessionResult>> {
        // a worker that panicked mid-push cannot leave the Vec half-written
        self.results.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_pushes() {
        let sink = ResultSink::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                sink.push(SessionResult::unreachable(format!("10.0.0.{i}")));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(sink.len(), 32);
        let mut hosts: Vec<String> = sink.drain().into_iter().map(|r| r.host).collect();
        hosts.sort();
        hosts.dedup();
        assert_eq!(hosts.len(), 32);
        assert!(sink.is_empty());
    }
}
