use std::borrow::Cow;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

use crate::error::{CacheError, Result};

type Work<T> = Box<dyn FnOnce() -> Result<T> + Send + 'static>;

/// One-shot deferred computation.
///
/// `run` consumes the task, so a task computes and completes exactly once.
pub struct ComputeTask<T> {
    label: Cow<'static, str>,
    work: Work<T>,
}

impl<T> ComputeTask<T> {
    pub fn new<F>(label: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self {
            label: label.into(),
            work: Box::new(move || Ok(f())),
        }
    }

    /// A task whose body may fail, e.g. because it reads another slot.
    pub fn fallible<F>(label: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Self {
            label: label.into(),
            work: Box::new(f),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Executes the body. A panic is caught and returned as `TaskPanicked`.
    pub fn run(self) -> Result<T> {
        let Self { label, work } = self;
        match catch_unwind(AssertUnwindSafe(work)) {
            Ok(result) => result,
            Err(payload) => {
                let message = CacheError::panic_message(payload.as_ref());
                error!(task = %label, "compute task panicked: {message}");
                Err(CacheError::TaskPanicked {
                    task: label.into_owned(),
                    message,
                })
            }
        }
    }
}

impl<T> fmt::Debug for ComputeTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeTask")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_returns_value() {
        let task = ComputeTask::new("sum", || (1..=4).sum::<i32>());
        assert_eq!(task.label(), "sum");
        assert_eq!(task.run(), Ok(10));
    }

    #[test]
    fn panic_becomes_typed_error() {
        let task: ComputeTask<i32> = ComputeTask::new("explode", || -> i32 { panic!("bad mapper") });
        match task.run() {
            Err(CacheError::TaskPanicked { task, message }) => {
                assert_eq!(task, "explode");
                assert_eq!(message, "bad mapper");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn fallible_error_passes_through() {
        let task: ComputeTask<i32> =
            ComputeTask::fallible("nested", || Err(CacheError::missing_input("arc", "data")));
        assert_eq!(task.run(), Err(CacheError::missing_input("arc", "data")));
    }
}
