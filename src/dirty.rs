//! Per-element dirty tracking ("lazy recomputing").

/// Capability shared by everything whose derived values can go stale.
pub trait Recomputable {
    /// Records a mutation that affects derived output.
    fn mark_dirty(&mut self);

    /// True if at least one mutation happened since the last `reset`.
    fn needs_recompute(&self) -> bool;

    /// Called once every slot was refreshed.
    fn reset(&mut self);
}

/// Counts mutations between two refreshes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyCounter(u32);

impl DirtyCounter {
    pub fn new() -> Self {
        Self(0)
    }

    /// A counter that forces a refresh on the first frame.
    pub fn dirty() -> Self {
        Self(1)
    }

    pub fn count(&self) -> u32 {
        self.0
    }
}

/// Implemented by elements that own a [`DirtyCounter`]; gives them
/// [`Recomputable`] for free.
pub trait TracksDirty {
    fn dirty_counter(&self) -> &DirtyCounter;
    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter;
}

impl TracksDirty for DirtyCounter {
    fn dirty_counter(&self) -> &DirtyCounter {
        self
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        self
    }
}

impl<T: TracksDirty> Recomputable for T {
    fn mark_dirty(&mut self) {
        let counter = self.dirty_counter_mut();
        counter.0 = counter.0.saturating_add(1);
    }

    fn needs_recompute(&self) -> bool {
        self.dirty_counter().0 != 0
    }

    fn reset(&mut self) {
        self.dirty_counter_mut().0 = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_saturates() {
        let mut counter = DirtyCounter(u32::MAX);
        counter.mark_dirty();
        assert_eq!(counter.count(), u32::MAX);
        assert!(counter.needs_recompute());
    }

    #[test]
    fn fresh_counters() {
        assert!(!DirtyCounter::new().needs_recompute());
        assert!(DirtyCounter::dirty().needs_recompute());
    }
}
