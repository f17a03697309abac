//! Fixed-size worker pools: task threads for slot work, rayon for fan-out.

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

use crate::config::PoolConfig;
use crate::error::{CacheError, Result};

/// Which of the two process pools a piece of work runs on.
///
/// Work that blocks on another slot's `read()` while running must go to
/// `Secondary`, otherwise a saturated primary pool can wait on itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    Primary,
    Secondary,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Primary => f.write_str("primary"),
            PoolKind::Secondary => f.write_str("secondary"),
        }
    }
}

/// A unit of work for [`WorkerPool::submit_all`]. May borrow from the submitter.
pub type Job<'scope> = Box<dyn FnOnce() + Send + 'scope>;

/// A slot task queued with [`WorkerPool::submit`].
type Task = Box<dyn FnOnce() + Send + 'static>;

static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    /// Id of the pool whose task thread this is, 0 elsewhere.
    static TASK_POOL: Cell<usize> = const { Cell::new(0) };
}

struct QueueState {
    pending: VecDeque<Task>,
    closed: bool,
}

/// FIFO feeding the task threads.
struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl TaskQueue {
    fn push(&self, task: Task) -> std::result::Result<(), Task> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(task);
        }
        state.pending.push_back(task);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Blocks until a task is available. `None` once the queue is closed.
    fn pop(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(task) = state.pending.pop_front() {
                return Some(task);
            }
            self.available.wait(&mut state);
        }
    }

    /// Stops the task threads and hands back whatever never started.
    fn close(&self) -> VecDeque<Task> {
        let mut state = self.state.lock();
        state.closed = true;
        let orphans = std::mem::take(&mut state.pending);
        drop(state);
        self.available.notify_all();
        orphans
    }
}

/// Live slice worker count, used to join the rayon threads on shutdown.
struct Liveness {
    alive: Mutex<usize>,
    exited: Condvar,
}

/// Two sets of threads behind one pool.
///
/// Slot tasks run on dedicated task threads fed from a FIFO. Fan-out batches
/// run on a rayon pool. A task thread waiting in `submit_all` is not a rayon
/// worker, so it blocks without picking up queued slot tasks. Those tasks may
/// themselves block on the slot being computed.
pub struct WorkerPool {
    id: usize,
    kind: PoolKind,
    workers: usize,
    queue: Arc<TaskQueue>,
    task_threads: Mutex<Vec<JoinHandle<()>>>,
    slices: rayon::ThreadPool,
    liveness: Arc<Liveness>,
}

impl WorkerPool {
    pub fn new(kind: PoolKind, config: &PoolConfig) -> Result<Self> {
        let workers = config.resolved_workers();
        if workers == 0 {
            return Err(CacheError::PoolBuild {
                pool: kind,
                message: "worker count must be at least 1".into(),
            });
        }
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);

        let liveness = Arc::new(Liveness {
            alive: Mutex::new(workers),
            exited: Condvar::new(),
        });
        let on_exit = liveness.clone();
        let prefix = config.thread_name.clone();

        let slices = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("{prefix}-slice-{i}"))
            .panic_handler(move |payload| {
                error!(pool = %kind, "worker escaped panic: {}", CacheError::panic_message(payload.as_ref()));
            })
            .exit_handler(move |_| {
                let mut alive = on_exit.alive.lock();
                *alive = alive.saturating_sub(1);
                on_exit.exited.notify_all();
            })
            .build()
            .map_err(|e| CacheError::PoolBuild {
                pool: kind,
                message: e.to_string(),
            })?;

        let queue = Arc::new(TaskQueue {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        });
        let mut task_threads = Vec::with_capacity(workers);
        for i in 0..workers {
            let worker_queue = queue.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-{i}", config.thread_name))
                .spawn(move || run_tasks(id, kind, &worker_queue));
            match spawned {
                Ok(handle) => task_threads.push(handle),
                Err(e) => {
                    queue.close();
                    return Err(CacheError::PoolBuild {
                        pool: kind,
                        message: e.to_string(),
                    });
                }
            }
        }

        debug!(pool = %kind, workers, "worker pool started");

        Ok(Self {
            id,
            kind,
            workers,
            queue,
            task_threads: Mutex::new(task_threads),
            slices,
            liveness,
        })
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// True when called from one of this pool's own threads.
    pub fn is_worker_thread(&self) -> bool {
        TASK_POOL.with(Cell::get) == self.id || self.slices.current_thread_index().is_some()
    }

    /// Fire-and-forget. A panicking job is logged and otherwise ignored.
    ///
    /// After shutdown started the job is dropped without running.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.queue.push(Box::new(job)).is_err() {
            debug!(pool = %self.kind, "job submitted after shutdown, dropped");
        }
    }

    /// Runs every job and returns once all of them finished.
    ///
    /// The caller blocks without running queued slot tasks. Called from a
    /// slice of this same pool (nested fan-out), the batch is executed
    /// cooperatively instead of waiting for a free worker.
    pub fn submit_all<'scope>(&self, jobs: Vec<Job<'scope>>) -> Result<()> {
        let total = jobs.len();
        if total == 0 {
            return Ok(());
        }

        let kind = self.kind;
        let failed = AtomicUsize::new(0);
        let failed_ref = &failed;
        self.slices.scope(move |s| {
            for job in jobs {
                s.spawn(move |_| {
                    if !run_guarded(kind, job) {
                        failed_ref.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        match failed.into_inner() {
            0 => Ok(()),
            failed => Err(CacheError::WorkerPanicked {
                pool: kind,
                failed,
                total,
            }),
        }
    }

    /// Stops the pool and waits for every thread to exit.
    ///
    /// Tasks still queued are dropped, which fails their slots with
    /// `Abandoned`. Must not be called from one of this pool's threads.
    pub fn shutdown(self) {
        let orphans = self.queue.close();
        if !orphans.is_empty() {
            debug!(pool = %self.kind, dropped = orphans.len(), "queued tasks abandoned");
        }
        drop(orphans);

        for handle in self.task_threads.lock().drain(..) {
            if handle.join().is_err() {
                error!(pool = %self.kind, "task thread exited with a panic");
            }
        }

        let kind = self.kind;
        let liveness = self.liveness.clone();
        drop(self);
        let mut alive = liveness.alive.lock();
        while *alive > 0 {
            liveness.exited.wait(&mut alive);
        }
        debug!(pool = %kind, "worker pool stopped");
    }
}

impl Drop for WorkerPool {
    // Threads are signalled, not joined: the last handle may be dropped on
    // one of this pool's own task threads.
    fn drop(&mut self) {
        drop(self.queue.close());
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("kind", &self.kind)
            .field("workers", &self.workers)
            .finish()
    }
}

fn run_tasks(id: usize, kind: PoolKind, queue: &TaskQueue) {
    TASK_POOL.with(|current| current.set(id));
    while let Some(task) = queue.pop() {
        run_guarded(kind, task);
    }
}

/// Returns `false` if the job panicked.
fn run_guarded<F: FnOnce()>(kind: PoolKind, job: F) -> bool {
    match catch_unwind(AssertUnwindSafe(job)) {
        Ok(()) => true,
        Err(payload) => {
            error!(pool = %kind, "job panicked: {}", CacheError::panic_message(payload.as_ref()));
            false
        }
    }
}
