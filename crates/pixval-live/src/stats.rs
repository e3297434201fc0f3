//! Per-run event counters.

use serde::Serialize;

/// Counts of events by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Every event handed to the validator.
    pub processed: u64,
    /// Events whose name matched no defined prefix.
    pub undocumented: u64,
    /// Events excluded by the version gate.
    pub version_skipped: u64,
    /// Validated events with at least one error.
    pub failing: u64,
}

impl RunStats {
    /// Events that went through structural validation.
    pub fn validated(&self) -> u64 {
        self.processed
            .saturating_sub(self.undocumented)
            .saturating_sub(self.version_skipped)
    }

    pub fn merge(&mut self, other: RunStats) {
        self.processed += other.processed;
        self.undocumented += other.undocumented;
        self.version_skipped += other.version_skipped;
        self.failing += other.failing;
    }
}
