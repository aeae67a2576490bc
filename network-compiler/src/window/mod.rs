//! Service window resolution.
//!
//! Picks the services that run on a date, then keeps the stop times that
//! fall inside a time-of-day window. Windows near midnight are tricky:
//! feeds encode post-midnight service either as "02:15:00" on the next day
//! or as "26:15:00" on the previous one, so both encodings are tried and
//! the one that matches more rows wins.

mod resolver;

use std::fmt;

use crate::domain::{FeedTime, SECONDS_PER_DAY, hours_to_seconds};

pub use resolver::{ResolvedWindow, ServiceWindowResolver, WindowError};

/// A half-open interval `[start_seconds, end_seconds)` of the service day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceWindow {
    pub start_seconds: u32,
    pub end_seconds: u32,
    /// True if the window is shifted by one day to match times encoded
    /// with hour values of 24 and above.
    pub extended: bool,
}

impl ServiceWindow {
    /// The window for the given fractional hours. `end_hour` may exceed 24.
    pub fn from_hours(start_hour: f64, end_hour: f64) -> Self {
        Self {
            start_seconds: hours_to_seconds(start_hour),
            end_seconds: hours_to_seconds(end_hour),
            extended: false,
        }
    }

    /// The same wall-clock window, encoded one service day later.
    pub fn to_extended(self) -> Self {
        Self {
            start_seconds: self.start_seconds.saturating_add(SECONDS_PER_DAY),
            end_seconds: self.end_seconds.saturating_add(SECONDS_PER_DAY),
            extended: true,
        }
    }

    /// True if `time` lies in `[start, end)`.
    pub fn contains(&self, time: FeedTime) -> bool {
        let t = time.as_seconds();
        t >= self.start_seconds && t < self.end_seconds
    }

    /// True if the window contains nothing.
    pub fn is_empty(&self) -> bool {
        self.end_seconds <= self.start_seconds
    }

    /// Window length in seconds.
    pub fn duration_seconds(&self) -> u32 {
        self.end_seconds.saturating_sub(self.start_seconds)
    }

    /// The window as a time of day, folding away a leading day offset.
    pub fn wall_clock(&self) -> (u32, u32) {
        if self.start_seconds >= SECONDS_PER_DAY {
            (
                self.start_seconds - SECONDS_PER_DAY,
                self.end_seconds.saturating_sub(SECONDS_PER_DAY),
            )
        } else {
            (self.start_seconds, self.end_seconds)
        }
    }

    /// True if the wall-clock window is non-empty and lies entirely inside
    /// `[from_seconds, to_seconds)`.
    pub fn lies_within(&self, from_seconds: u32, to_seconds: u32) -> bool {
        let (start, end) = self.wall_clock();
        start < end && start >= from_seconds && end <= to_seconds
    }
}

impl fmt::Display for ServiceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            FeedTime::from_seconds(self.start_seconds),
            FeedTime::from_seconds(self.end_seconds)
        )?;
        if self.extended {
            f.write_str(" extended")?;
        }
        Ok(())
    }
}
