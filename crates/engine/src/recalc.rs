//! Recalculation controller.
//!
//! Edits schedule a deferred full recompute with a short coalescing delay;
//! scheduling again before the deadline replaces the pending timer, so a
//! burst of edits produces a single recompute. The host drives the
//! controller from its event loop by polling `run_if_due`.

use std::time::{Duration, Instant};

use crate::grid::Grid;

/// Debouncing window within which edit notifications collapse into a single
/// recompute (roughly one frame).
pub const COALESCE_DELAY: Duration = Duration::from_millis(16);

#[derive(Debug)]
pub struct RecalcController {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for RecalcController {
    fn default() -> Self {
        Self::new()
    }
}

impl RecalcController {
    pub fn new() -> Self {
        Self::with_delay(COALESCE_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// Schedule a recompute. Replaces any pending deadline, pushing it out
    /// to `now + delay`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Run the pending recompute if its deadline has passed. Returns None
    /// when nothing is due.
    pub fn run_if_due<F>(
        &mut self,
        now: Instant,
        grid: &mut Grid,
        active: Option<(usize, usize)>,
        f: F,
    ) -> Option<RecalcReport>
    where
        F: FnMut(usize, usize, &str),
    {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(Self::run_now(grid, active, f))
            }
            _ => None,
        }
    }

    /// Recompute the displayed text of every cell except `active`, refreshing
    /// the error overlay as a side effect of evaluation.
    pub fn run_now<F>(grid: &mut Grid, active: Option<(usize, usize)>, mut f: F) -> RecalcReport
    where
        F: FnMut(usize, usize, &str),
    {
        let started = Instant::now();
        let mut cells_recomputed = 0;
        grid.for_each_display(active, |row, col, text| {
            cells_recomputed += 1;
            f(row, col, text);
        });
        RecalcReport {
            cells_recomputed,
            errors: grid.error_count(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Report from a full recompute pass.
#[derive(Debug, Clone, Default)]
pub struct RecalcReport {
    /// Number of cells whose display was recomputed.
    pub cells_recomputed: usize,
    /// Error-overlay entries after the pass.
    pub errors: usize,
    /// Time taken for the pass in milliseconds.
    pub duration_ms: u64,
}

impl RecalcReport {
    /// Concise one-line summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} cells in {}ms, errors={}",
            self.cells_recomputed, self.duration_ms, self.errors
        )
    }
}
