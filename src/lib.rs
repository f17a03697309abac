//! lazy_chart: chart elements whose derived values are computed lazily on worker pools.
//!
//! Elements mark themselves dirty when mutated. Once per frame, `prepare`
//! dispatches recomputes for dirty elements to the pools owned by a
//! [`ChartContext`]; `draw` then blocks on the cached results.

pub mod canvas;
pub mod compute;
pub mod config;
pub mod context;
pub mod data_types;
pub mod dirty;
pub mod elements;
pub mod error;
pub mod scales;
pub mod scene;
pub mod transform;
pub mod utils;

pub use compute::{ArraySlot, ComputeSlot, ComputeTask, PoolKind, WorkerPool};
pub use config::{CacheConfig, PoolConfig};
pub use context::ChartContext;
pub use data_types::{PlotPoint, Rgba};
pub use dirty::{DirtyCounter, Recomputable};
pub use elements::ChartElement;
pub use error::{CacheError, Result};
pub use scene::{FrameReport, Scene};
