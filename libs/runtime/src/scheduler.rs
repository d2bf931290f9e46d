//! Task Scheduler
//!
//! Executes actor tasks on a bounded pool of worker threads. The pool is a
//! dedicated multi-thread tokio runtime: each worker owns a local run queue
//! and steals from its peers and the injection queue when it runs dry, which
//! is exactly the fiber-pool-plus-work-stealing shape the dispatcher needs.
//! A behavior that awaits releases its worker back to the pool — a suspended
//! task never holds a thread idle.
//!
//! The scheduler adds what the raw runtime does not have: a bounded,
//! explicitly configured worker count, refusal of new tasks after shutdown,
//! a timer facility for delayed self-messages, and submission counters.
//! Shutdown is idempotent and safe from any thread, including from inside
//! an async context (the runtime is shut down in the background, never
//! dropped inline).

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info};

/// Worker pool configuration
#[derive(Debug, Clone)]
pub(crate) struct SchedulerConfig {
    /// Worker thread count; `None` uses available parallelism
    pub(crate) worker_threads: Option<usize>,
    /// Prefix for worker thread names
    pub(crate) thread_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "arbor".to_string(),
        }
    }
}

/// Bounded work-stealing worker pool
pub(crate) struct Scheduler {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    workers: usize,
    shutdown: AtomicBool,
    tasks_submitted: AtomicU64,
    tasks_rejected: AtomicU64,
}

impl Scheduler {
    pub(crate) fn new(config: SchedulerConfig) -> std::io::Result<Self> {
        let workers = config.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });

        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name(format!("{}-worker", config.thread_name))
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();

        info!(workers, "Scheduler worker pool started");

        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            handle,
            workers,
            shutdown: AtomicBool::new(false),
            tasks_submitted: AtomicU64::new(0),
            tasks_rejected: AtomicU64::new(0),
        })
    }

    /// Submit a task for execution. Tasks submitted after shutdown are
    /// dropped.
    pub(crate) fn execute<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown.load(Ordering::Acquire) {
            self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
        self.handle.spawn(task);
    }

    /// Run a task after a delay. Timeout messages ride on this; cancellation
    /// by interruption does not exist, a late task simply finds its target
    /// terminated.
    pub(crate) fn schedule_once<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.execute(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers
    }

    /// Stop the pool. Idempotent; callable from any thread.
    pub(crate) fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(
            submitted = self.tasks_submitted.load(Ordering::Relaxed),
            rejected = self.tasks_rejected.load(Ordering::Relaxed),
            "Shutting down scheduler worker pool"
        );
        if let Ok(mut slot) = self.runtime.lock() {
            if let Some(runtime) = slot.take() {
                runtime.shutdown_background();
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
