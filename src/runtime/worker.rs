// SPDX-License-Identifier: GPL-3.0-only

//! Single background worker
//!
//! One dedicated thread runs a current-thread tokio runtime. Jobs are futures;
//! they run concurrently on that one thread, so awaiting detectors never parks
//! the worker while filter transforms still get their turn.
//!
//! Shutdown stops intake, then lets every job that was already queued or
//! running complete before the thread exits.

use futures::future::BoxFuture;
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

type Job = BoxFuture<'static, ()>;

/// Cloneable submission side of the worker
#[derive(Clone)]
pub struct WorkerHandle {
    jobs: mpsc::UnboundedSender<Job>,
}

impl WorkerHandle {
    /// Queue a job
    ///
    /// Returns false if the worker is shut down. The job is dropped in that
    /// case, so anything it owns is released through its destructors.
    pub fn spawn<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.jobs.send(Box::pin(job)).is_ok()
    }

    /// Whether the worker still accepts jobs
    pub fn is_running(&self) -> bool {
        !self.jobs.is_closed()
    }
}

/// Owner of the worker thread
pub struct BackgroundWorker {
    name: String,
    handle: WorkerHandle,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl BackgroundWorker {
    /// Start the worker thread
    pub fn start(name: &str) -> std::io::Result<Self> {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel::<Job>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let thread_name = name.to_string();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %thread_name, "Background worker started");
                runtime.block_on(run_jobs(jobs_rx, shutdown_rx));
                info!(name = %thread_name, "Background worker exiting");
            })?;

        Ok(Self {
            name: name.to_string(),
            handle: WorkerHandle { jobs: jobs_tx },
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Submission handle for components that post work
    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Stop intake and wait for pending jobs to finish
    ///
    /// Blocks the calling thread; safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(signal) = self.shutdown.take() {
            debug!(name = %self.name, "Requesting background worker shutdown");
            let _ = signal.send(());
        }

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(name = %self.name, "Background worker thread panicked");
            }
        }
    }

    /// Async-friendly variant of [`shutdown`](Self::shutdown)
    pub async fn shutdown_async(mut self) {
        if let Err(e) = tokio::task::spawn_blocking(move || self.shutdown()).await {
            warn!(error = %e, "Background worker shutdown task failed");
        }
    }
}

impl Drop for BackgroundWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_jobs(mut jobs: mpsc::UnboundedReceiver<Job>, mut shutdown: oneshot::Receiver<()>) {
    let mut pending = JoinSet::new();

    loop {
        tokio::select! {
            job = jobs.recv() => match job {
                Some(job) => {
                    pending.spawn(job);
                }
                None => break,
            },
            Some(result) = pending.join_next(), if !pending.is_empty() => {
                if let Err(e) = result {
                    warn!(error = %e, "Background job failed");
                }
            }
            _ = &mut shutdown => break,
        }
    }

    // Refuse new work, keep what was already queued
    jobs.close();
    while let Ok(job) = jobs.try_recv() {
        pending.spawn(job);
    }

    let remaining = pending.len();
    if remaining > 0 {
        debug!(remaining, "Draining background jobs");
    }
    while let Some(result) = pending.join_next().await {
        if let Err(e) = result {
            warn!(error = %e, "Background job failed during drain");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_jobs_run_on_worker_thread() {
        let mut worker = BackgroundWorker::start("test-worker").unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        assert!(worker.handle().spawn(async move {
            let name = thread::current().name().map(str::to_string);
            let _ = tx.send(name);
        }));

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("test-worker"));
        worker.shutdown();
    }

    #[test]
    fn test_shutdown_drains_pending_jobs() {
        let mut worker = BackgroundWorker::start("drain-worker").unwrap();
        let completed = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let completed = Arc::clone(&completed);
            worker.handle().spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                completed.fetch_add(1, Ordering::SeqCst);
            });
        }

        worker.shutdown();
        assert_eq!(completed.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_spawn_after_shutdown_is_refused() {
        let mut worker = BackgroundWorker::start("closed-worker").unwrap();
        let handle = worker.handle();
        worker.shutdown();
        worker.shutdown();

        assert!(!handle.is_running());
        assert!(!handle.spawn(async {}));
    }
}
