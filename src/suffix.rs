//! Date + counter uniqueness suffix, `DDMMYY_NNN`.
//!
//! The counter is the only thing that makes names unique: the date has day
//! granularity and two runs on the same day both start at 1. Within one run
//! the counter strictly increases, so suffixes never repeat.

use chrono::NaiveDate;

/// `strftime` pattern of the date half of the suffix.
pub const DATE_FORMAT: &str = "%d%m%y";

/// Build the suffix for `counter` on `date`.
///
/// `counter_width` zero-pads the counter (`3` → `001`); `0` leaves it bare.
/// Counters wider than `counter_width` are never cut.
pub fn suffix(date: NaiveDate, counter: u32, counter_width: usize) -> String {
    format!("{}_{:0counter_width$}", date.format(DATE_FORMAT), counter)
}

/// Per-run sequence number, starting at 1.
///
/// A value is only consumed by [`advance`](Self::advance), which the batch
/// orchestrator calls after an item has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCounter {
    next: u32,
}

impl BatchCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Value the next successful item will carry.
    pub fn current(&self) -> u32 {
        self.next
    }

    /// Consume the current value.
    pub fn advance(&mut self) {
        self.next += 1;
    }
}

impl Default for BatchCounter {
    fn default() -> Self {
        Self::new()
    }
}
