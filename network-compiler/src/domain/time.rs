//! Feed time handling.
//!
//! Timetables give stop times as "H:MM:SS" or "HH:MM:SS" measured from the
//! start of the service day. A trip that leaves at 23:50 and runs past
//! midnight keeps counting upwards ("24:10:00", "26:15:00") rather than
//! wrapping, so the hour field is not bounded by 23.

use std::fmt;

/// Seconds in one service day.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing an invalid feed time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of the service day, in seconds since its midnight.
///
/// Values at or above [`SECONDS_PER_DAY`] denote post-midnight service still
/// attributed to the previous day.
///
/// # Examples
///
/// ```
/// use network_compiler::domain::FeedTime;
///
/// let t = FeedTime::parse("7:05:30").unwrap();
/// assert_eq!(t.as_seconds(), 7 * 3600 + 5 * 60 + 30);
/// assert_eq!(t.to_string(), "07:05:30");
///
/// // Post-midnight service keeps counting
/// let late = FeedTime::parse("26:15:00").unwrap();
/// assert!(late.is_after_midnight());
///
/// // Garbage is rejected
/// assert!(FeedTime::parse("abc").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedTime(u32);

impl FeedTime {
    /// Create a time from seconds since service-day midnight.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Parse a time from "H:MM:SS" or "HH:MM:SS" format.
    ///
    /// Surrounding whitespace is ignored. Hours may be 0-99; minutes and
    /// seconds must be two digits in 00-59.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        let mut parts = s.split(':');

        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected H:MM:SS format"));
        };

        if h.is_empty() || h.len() > 2 {
            return Err(TimeError::new("hour must be 1 or 2 digits"));
        }
        let hour = parse_digits(h).ok_or_else(|| TimeError::new("invalid hour digits"))?;

        if m.len() != 2 {
            return Err(TimeError::new("minute must be 2 digits"));
        }
        let minute = parse_digits(m).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        if sec.len() != 2 {
            return Err(TimeError::new("second must be 2 digits"));
        }
        let second = parse_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?;
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Self(hour * 3600 + minute * 60 + second))
    }

    /// Returns seconds since service-day midnight.
    pub fn as_seconds(&self) -> u32 {
        self.0
    }

    /// Returns the hour field (may exceed 23).
    pub fn hour(&self) -> u32 {
        self.0 / 3600
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        (self.0 % 3600) / 60
    }

    /// Returns the second (0-59).
    pub fn second(&self) -> u32 {
        self.0 % 60
    }

    /// True if this time is encoded past the service day's midnight.
    pub fn is_after_midnight(&self) -> bool {
        self.0 >= SECONDS_PER_DAY
    }

    /// Seconds elapsed from `earlier` to `self`, saturating at zero.
    pub fn saturating_seconds_since(&self, earlier: FeedTime) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Debug for FeedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedTime({})", self)
    }
}

impl fmt::Display for FeedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

/// Parse a short run of ASCII digits into a u32.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Convert a fractional hour (e.g. `7.5`, `25.0`) to whole seconds.
///
/// Negative and non-finite hours clamp to zero.
pub fn hours_to_seconds(hours: f64) -> u32 {
    if !hours.is_finite() || hours <= 0.0 {
        return 0;
    }
    (hours * 3600.0).round() as u32
}
