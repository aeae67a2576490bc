//! Which lines serve each station.

mod lines;

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::feed::{Feed, StopTime};
use crate::identity::StopIdentityResolver;

pub use lines::{LineCategory, connection_category};

static NO_LINES: BTreeSet<String> = BTreeSet::new();

/// Station name to the short names of the lines calling there.
///
/// A station reports every line seen on any of its platforms, even when
/// the graph node for a platform carries none of them.
#[derive(Debug, Clone, Default)]
pub struct LineLookup {
    by_station: HashMap<String, BTreeSet<String>>,
}

impl LineLookup {
    /// Join stop times to trips and routes, then group the route short
    /// names by station name.
    pub fn build(feed: &Feed, stop_times: &[&StopTime], resolver: &StopIdentityResolver) -> Self {
        let mut by_station: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut unnamed = 0usize;

        for st in stop_times {
            let Some(line) = feed
                .route_of_trip(&st.trip_id)
                .and_then(|route| route.short_name.as_deref())
                .map(str::trim)
                .filter(|line| !line.is_empty())
            else {
                continue;
            };
            let Some(station) = resolver.name_for_stop_id(&st.stop_id) else {
                unnamed += 1;
                continue;
            };
            by_station
                .entry(station.to_string())
                .or_default()
                .insert(line.to_string());
        }

        debug!(
            stations = by_station.len(),
            unnamed, "Built station line lookup"
        );

        Self { by_station }
    }

    /// Lines serving `station`. Empty for unknown stations.
    pub fn lines_for(&self, station: &str) -> &BTreeSet<String> {
        self.by_station.get(station).unwrap_or(&NO_LINES)
    }

    pub fn len(&self) -> usize {
        self.by_station.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_station.is_empty()
    }
}
