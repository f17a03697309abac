use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::compute::PoolKind;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Failures surfaced by slots, pools and elements.
///
/// Errors are `Clone` because a single failed computation is handed to every
/// reader blocked on the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("slot `{slot}` was read before its first recompute")]
    Uninitialized { slot: Arc<str> },

    #[error("element `{element}` has no {input} set")]
    MissingInput {
        element: String,
        input: &'static str,
    },

    #[error("task `{task}` panicked: {message}")]
    TaskPanicked { task: String, message: String },

    #[error("{failed} of {total} jobs panicked on the {pool} pool")]
    WorkerPanicked {
        pool: PoolKind,
        failed: usize,
        total: usize,
    },

    #[error("task for slot `{slot}` was dropped before it completed")]
    Abandoned { slot: Arc<str> },

    #[error("timed out after {waited:?} waiting for slot `{slot}`")]
    TimedOut { slot: Arc<str>, waited: Duration },

    #[error("failed to start the {pool} worker pool: {message}")]
    PoolBuild { pool: PoolKind, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    pub fn missing_input(element: impl Into<String>, input: &'static str) -> Self {
        Self::MissingInput {
            element: element.into(),
            input,
        }
    }

    /// Extracts a readable message from a caught panic payload.
    pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
        if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        }
    }

    /// Concurrency faults can be skipped for a frame; precondition failures cannot.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TaskPanicked { .. }
                | Self::WorkerPanicked { .. }
                | Self::Abandoned { .. }
                | Self::TimedOut { .. }
        )
    }
}
