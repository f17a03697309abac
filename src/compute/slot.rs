//! Memoizing cells whose value is produced on a worker pool.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use super::fan_out::{fan_out_map, Mapper};
use super::pool::{PoolKind, WorkerPool};
use super::task::ComputeTask;
use crate::error::{CacheError, Result};

struct SlotState<T> {
    /// Bumped by every `recompute`. Zero means the slot was never computed.
    generation: u64,
    /// Outcome of the task dispatched for `generation`, `None` while it runs.
    outcome: Option<Result<Arc<T>>>,
}

struct Shared<T> {
    name: Arc<str>,
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    fn install(&self, generation: u64, outcome: Result<Arc<T>>) {
        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(
                slot = %self.name,
                stale = generation,
                current = state.generation,
                "discarding result of superseded task"
            );
            return;
        }
        trace!(slot = %self.name, generation, ok = outcome.is_ok(), "slot value installed");
        state.outcome = Some(outcome);
        drop(state);
        self.ready.notify_all();
    }
}

/// Completion side of one dispatched task. Dropping it without completing
/// installs `Abandoned`, so readers never wait on a task that will not run.
struct Completion<T> {
    shared: Weak<Shared<T>>,
    generation: u64,
    done: bool,
}

impl<T> Completion<T> {
    fn complete(mut self, result: Result<T>) {
        self.done = true;
        if let Some(shared) = self.shared.upgrade() {
            shared.install(self.generation, result.map(Arc::new));
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            let err = CacheError::Abandoned {
                slot: shared.name.clone(),
            };
            shared.install(self.generation, Err(err));
        }
    }
}

/// A single derived value, recomputed on demand and read with blocking semantics.
///
/// Cloning a slot yields another handle to the same cell, which is how tasks
/// on the secondary pool read a slot owned by the same element.
pub struct ComputeSlot<T> {
    shared: Arc<Shared<T>>,
    pool: Arc<WorkerPool>,
}

impl<T> Clone for ComputeSlot<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            pool: self.pool.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> ComputeSlot<T> {
    pub fn new(name: impl Into<Arc<str>>, pool: Arc<WorkerPool>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                state: Mutex::new(SlotState {
                    generation: 0,
                    outcome: None,
                }),
                ready: Condvar::new(),
            }),
            pool,
        }
    }

    /// Invalidates the current value and dispatches `task` to the slot's pool.
    ///
    /// Returns the generation assigned to `task`. Only the task of the latest
    /// generation can install a value; earlier in-flight tasks are discarded.
    pub fn recompute(&self, task: ComputeTask<T>) -> u64 {
        let generation = {
            let mut state = self.shared.state.lock();
            state.generation += 1;
            state.outcome = None;
            state.generation
        };
        debug!(
            slot = %self.shared.name,
            task = task.label(),
            generation,
            pool = %self.pool.kind(),
            "recompute dispatched"
        );

        let completion = Completion {
            shared: Arc::downgrade(&self.shared),
            generation,
            done: false,
        };
        self.pool.submit(move || {
            let result = task.run();
            completion.complete(result);
        });
        generation
    }

    /// Blocks until the latest dispatched task completed and returns its value.
    pub fn read(&self) -> Result<Arc<T>> {
        self.wait(None)
    }

    pub fn read_timeout(&self, timeout: Duration) -> Result<Arc<T>> {
        self.wait(Some(timeout))
    }

    /// Non-blocking read. `Ok(None)` while the latest task is still running.
    pub fn try_read(&self) -> Result<Option<Arc<T>>> {
        let state = self.shared.state.lock();
        if state.generation == 0 {
            return Err(self.uninitialized());
        }
        state.outcome.clone().transpose()
    }

    fn wait(&self, timeout: Option<Duration>) -> Result<Arc<T>> {
        let mut state = self.shared.state.lock();
        if state.generation == 0 {
            return Err(self.uninitialized());
        }
        if state.outcome.is_none() && self.pool.is_worker_thread() {
            warn!(
                slot = %self.shared.name,
                pool = %self.pool.kind(),
                "blocking read from a worker of the slot's own pool"
            );
        }

        let deadline = timeout.map(|t| (Instant::now() + t, t));
        loop {
            if let Some(outcome) = &state.outcome {
                return outcome.clone();
            }
            match deadline {
                Some((deadline, waited)) => {
                    if self.shared.ready.wait_until(&mut state, deadline).timed_out()
                        && state.outcome.is_none()
                    {
                        return Err(CacheError::TimedOut {
                            slot: self.shared.name.clone(),
                            waited,
                        });
                    }
                }
                None => self.shared.ready.wait(&mut state),
            }
        }
    }

    fn uninitialized(&self) -> CacheError {
        CacheError::Uninitialized {
            slot: self.shared.name.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn pool_kind(&self) -> PoolKind {
        self.pool.kind()
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub fn generation(&self) -> u64 {
        self.shared.state.lock().generation
    }

    /// True once `recompute` was called at least once.
    pub fn is_initialized(&self) -> bool {
        self.generation() > 0
    }

    /// True when the latest generation has an outcome (value or error).
    pub fn is_ready(&self) -> bool {
        let state = self.shared.state.lock();
        state.generation > 0 && state.outcome.is_some()
    }
}

impl<T> fmt::Debug for ComputeSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ComputeSlot")
            .field("name", &self.shared.name)
            .field("pool", &self.pool.kind())
            .field("generation", &state.generation)
            .field("ready", &state.outcome.is_some())
            .finish()
    }
}

/// A slot holding one derived value per data item.
pub struct ArraySlot<V> {
    slot: ComputeSlot<Vec<V>>,
    cardinality: usize,
    fan_out_width: usize,
}

impl<V: Send + Sync + 'static> ArraySlot<V> {
    pub fn with_cardinality(
        name: impl Into<Arc<str>>,
        pool: Arc<WorkerPool>,
        fan_out_width: usize,
        cardinality: usize,
    ) -> Self {
        Self {
            slot: ComputeSlot::new(name, pool),
            cardinality,
            fan_out_width: fan_out_width.max(1),
        }
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn resize(&mut self, cardinality: usize) {
        if cardinality != self.cardinality {
            trace!(slot = self.slot.name(), from = self.cardinality, to = cardinality, "array slot resized");
            self.cardinality = cardinality;
        }
    }

    /// Recomputes the array by fanning `mapper` out over `data`.
    pub fn recompute_map<D>(&mut self, data: Arc<[D]>, mapper: Mapper<D, V>) -> u64
    where
        D: Send + Sync + 'static,
    {
        self.resize(data.len());
        let pool = self.slot.pool().clone();
        let width = self.fan_out_width;
        let label = format!("{}:map", self.slot.name());
        self.slot.recompute(ComputeTask::fallible(label, move || {
            fan_out_map(&pool, width, &data, &mapper)
        }))
    }

    pub fn as_slot(&self) -> &ComputeSlot<Vec<V>> {
        &self.slot
    }
}

impl<V> Deref for ArraySlot<V> {
    type Target = ComputeSlot<Vec<V>>;

    fn deref(&self) -> &Self::Target {
        &self.slot
    }
}
