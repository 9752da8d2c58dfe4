//! Per-thread interop counters
//!
//! Conversions are synchronous, so counting on the calling thread is enough to
//! check that every native buffer acquired by a call was released by it.

use std::cell::Cell;

/// Interop statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteropStats {
    pub conversions: usize,
    pub marshaling_errors: usize,
    pub buffers_allocated: usize,
    pub buffers_released: usize,
}

impl InteropStats {
    /// Native buffers allocated on this thread and not yet released
    #[inline]
    pub fn buffers_live(&self) -> usize {
        self.buffers_allocated.saturating_sub(self.buffers_released)
    }
}

thread_local! {
    static STATS: Cell<InteropStats> = Cell::new(InteropStats::default());
}

/// Snapshot of the calling thread's counters
pub fn stats() -> InteropStats {
    STATS.with(|s| s.get())
}

pub fn reset_stats() {
    STATS.with(|s| s.set(InteropStats::default()));
}

#[inline]
fn update(f: impl FnOnce(&mut InteropStats)) {
    STATS.with(|s| {
        let mut current = s.get();
        f(&mut current);
        s.set(current);
    });
}

pub(crate) fn note_conversion() {
    update(|s| s.conversions += 1);
}

pub(crate) fn note_error() {
    update(|s| s.marshaling_errors += 1);
}

pub(crate) fn note_buffer_allocated() {
    update(|s| s.buffers_allocated += 1);
}

pub(crate) fn note_buffer_released() {
    update(|s| s.buffers_released += 1);
}
