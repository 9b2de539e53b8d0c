//! Worker process bookkeeping.
//!
//! Every CGI worker is handed to the [`Reaper`] right after it is spawned.
//! The reaper owns the only table of live workers in the process and is the
//! only code that waits on them: a background task runs one non-blocking
//! pass per SIGCHLD, and each dispatcher waits on a [`WorkerHandle`] keyed
//! to its own pid instead of on "any signal".

use std::collections::HashMap;
use std::process::{Child, ExitStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct LiveWorker {
    child: Child,
    done: oneshot::Sender<Option<ExitStatus>>,
}

/// Table of spawned, not yet reaped workers.
#[derive(Clone, Default)]
pub struct Reaper {
    live: Arc<Mutex<HashMap<u32, LiveWorker>>>,
}

/// Completion notice for one tracked worker.
#[derive(Debug)]
pub struct WorkerHandle {
    pid: u32,
    rx: oneshot::Receiver<Option<ExitStatus>>,
}

impl WorkerHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Resolves once this worker has been reaped.
    ///
    /// `None` means the exit status was lost: the OS no longer knew the
    /// child, or the reaper was dropped.
    pub async fn wait(self) -> Option<ExitStatus> {
        self.rx.await.ok().flatten()
    }
}

impl Reaper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `child` and returns the handle its dispatcher waits on.
    ///
    /// A reap pass runs immediately, so a worker that exited before it was
    /// tracked is still collected even if its SIGCHLD has already been
    /// consumed.
    pub fn track(&self, child: Child) -> anyhow::Result<WorkerHandle> {
        let pid = child.id();
        let (done, rx) = oneshot::channel();

        self.lock().insert(pid, LiveWorker { child, done });
        tracing::debug!(pid, "Tracking worker");

        self.reap()?;
        Ok(WorkerHandle { pid, rx })
    }

    /// One non-blocking pass over every tracked worker.
    ///
    /// Returns how many were reaped; zero is a normal outcome. A worker the
    /// OS reports as not our child (`ECHILD`) is dropped from the table. Any
    /// other wait error is returned and must be treated as fatal.
    pub fn reap(&self) -> anyhow::Result<usize> {
        let mut live = self.lock();

        let mut finished = Vec::new();
        for (&pid, worker) in live.iter_mut() {
            match worker.child.try_wait() {
                Ok(Some(status)) => finished.push((pid, Some(status))),
                Ok(None) => {}
                Err(e) if e.raw_os_error() == Some(libc::ECHILD) => finished.push((pid, None)),
                Err(e) => {
                    return Err(e).with_context(|| format!("waitpid error for worker {}", pid));
                }
            }
        }

        for (pid, status) in &finished {
            if let Some(worker) = live.remove(pid) {
                tracing::debug!(pid, status = ?status, "Reaped worker");
                // The dispatcher may have stopped waiting; that is fine.
                let _ = worker.done.send(*status);
            }
        }

        Ok(finished.len())
    }

    /// Number of tracked workers not yet reaped.
    pub fn live_workers(&self) -> usize {
        self.lock().len()
    }

    /// Reaps on every notification from `signals` until the stream ends.
    pub async fn run(self, mut signals: Signal) -> anyhow::Result<()> {
        while signals.recv().await.is_some() {
            self.reap()?;
        }
        Ok(())
    }

    /// Subscribes to SIGCHLD and runs [`Reaper::run`] on a background task.
    ///
    /// Must be called from inside a tokio runtime, before any worker is
    /// spawned.
    pub fn spawn(&self) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        let signals = signal(SignalKind::child()).context("installing SIGCHLD handler")?;
        Ok(tokio::spawn(self.clone().run(signals)))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, LiveWorker>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
