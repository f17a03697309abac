//! Deferred, pool-backed computation of derived values.

pub mod fan_out;
pub mod pool;
pub mod slot;
pub mod task;

pub use fan_out::{fan_out, fan_out_into, fan_out_map, mapper, Mapper};
pub use pool::{Job, PoolKind, WorkerPool};
pub use slot::{ArraySlot, ComputeSlot};
pub use task::ComputeTask;
