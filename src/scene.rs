//! Per-frame driver: prepare every element, then draw every element.

use std::time::Instant;
use tracing::{debug, warn};

use crate::canvas::Canvas;
use crate::context::ChartContext;
use crate::dirty::Recomputable;
use crate::elements::ChartElement;
use crate::error::{CacheError, Result};

/// Outcome of one frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Elements that dispatched at least one recompute.
    pub prepared: usize,
    pub drawn: usize,
    /// Elements left out of this frame, with the reason.
    pub skipped: Vec<(String, CacheError)>,
    pub elapsed_nanos: u64,
}

#[derive(Default)]
pub struct Scene {
    elements: Vec<Box<dyn ChartElement>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Box<dyn ChartElement>) {
        self.elements.push(element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements_mut(&mut self) -> &mut [Box<dyn ChartElement>] {
        &mut self.elements
    }

    /// Runs one frame.
    ///
    /// Precondition failures (missing data, reading an uninitialized slot) abort
    /// the frame. Concurrency faults only skip the failing element; it is marked
    /// dirty so the next frame recomputes it.
    pub fn render_frame(
        &mut self,
        ctx: &ChartContext,
        canvas: &mut dyn Canvas,
    ) -> Result<FrameReport> {
        let start = Instant::now();
        let mut report = FrameReport::default();
        let mut failed = vec![false; self.elements.len()];

        for (i, element) in self.elements.iter_mut().enumerate() {
            match element.prepare(ctx) {
                Ok(true) => report.prepared += 1,
                Ok(false) => {}
                Err(e) if e.is_transient() => {
                    warn!(element = element.name(), error = %e, "skipping element this frame");
                    element.mark_dirty();
                    failed[i] = true;
                    report.skipped.push((element.name().to_string(), e));
                }
                Err(e) => return Err(e),
            }
        }

        for (i, element) in self.elements.iter_mut().enumerate() {
            if failed[i] {
                continue;
            }
            match element.draw(ctx, canvas) {
                Ok(()) => report.drawn += 1,
                Err(e) if e.is_transient() => {
                    warn!(element = element.name(), error = %e, "skipping element this frame");
                    element.mark_dirty();
                    report.skipped.push((element.name().to_string(), e));
                }
                Err(e) => return Err(e),
            }
        }

        report.elapsed_nanos = start.elapsed().as_nanos() as u64;
        debug!(
            prepared = report.prepared,
            drawn = report.drawn,
            skipped = report.skipped.len(),
            elapsed_nanos = report.elapsed_nanos,
            "frame rendered"
        );
        Ok(report)
    }
}
