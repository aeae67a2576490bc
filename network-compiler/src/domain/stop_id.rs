//! Stop identifier type.

use std::fmt;

/// Error returned when a raw stop identifier normalizes to nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// A normalized feed stop identifier.
///
/// Feeds that have passed through spreadsheet tools or dataframe libraries
/// often carry numeric ids with a float artifact (`"726.0"`) and stray
/// whitespace. `StopId` strips both, so `" 726.0 "` and `"726"` compare equal.
///
/// # Examples
///
/// ```
/// use network_compiler::domain::StopId;
///
/// let id = StopId::parse(" 726.0 ").unwrap();
/// assert_eq!(id.as_str(), "726");
///
/// // Non-numeric ids are kept as they are
/// assert_eq!(StopId::parse("BEL_1").unwrap().as_str(), "BEL_1");
///
/// // Blank ids are rejected
/// assert!(StopId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(String);

impl StopId {
    /// Normalize and validate a raw stop identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        let trimmed = s.trim();
        let normalized = trimmed.strip_suffix(".0").unwrap_or(trimmed).trim_end();

        if normalized.is_empty() {
            return Err(InvalidStopId {
                reason: "must not be blank",
            });
        }

        Ok(StopId(normalized.to_string()))
    }

    /// Returns the normalized identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Normalizing an already-normalized id is a no-op
        #[test]
        fn idempotent(s in "[A-Za-z0-9_:]{1,12}") {
            let once = StopId::parse(&s).unwrap();
            let twice = StopId::parse(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Integer ids with a float artifact equal the plain id
        #[test]
        fn float_artifact_equivalent(n in 0u32..10_000_000) {
            let plain = StopId::parse(&n.to_string()).unwrap();
            let float = StopId::parse(&format!("{n}.0")).unwrap();
            prop_assert_eq!(plain, float);
        }
    }
}
