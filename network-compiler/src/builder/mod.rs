//! Expanding a filtered timetable into a raw per-platform graph.
//!
//! The compiler only depends on the [`FeedGraphBuilder`] trait and the
//! narrow [`BuilderInput`] struct, so a different expansion algorithm can be
//! swapped in without touching canonicalization.

mod scheduled;
mod walk;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::domain::StopId;
use crate::feed::{Feed, StopTime};
use crate::window::{ResolvedWindow, ServiceWindow};

pub use scheduled::ScheduledGraphBuilder;

/// Error from a graph builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    /// A stop time references a trip missing from the trip table
    #[error("trip {trip_id} is not in the trip table")]
    UnknownTrip { trip_id: String },

    /// Any other failure inside a builder
    #[error("graph builder failed: {0}")]
    Failed(String),
}

/// Kind of a raw edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeMode {
    Transit,
    /// Walking between nearby stops.
    Transfer,
}

impl fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeMode::Transit => f.write_str("transit"),
            EdgeMode::Transfer => f.write_str("transfer"),
        }
    }
}

/// One platform-level node produced by a builder.
///
/// Ids are builder-specific and only meaningful within one raw graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub id: String,
    pub lon: f64,
    pub lat: f64,
    pub raw_modes: BTreeSet<String>,
    /// Expected wait to board here, in seconds.
    pub boarding_cost: f64,
}

/// A directed connection between two raw nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEdge {
    pub from: String,
    pub to: String,
    pub length_seconds: f64,
    pub mode: EdgeMode,
    pub route_id: Option<String>,
}

/// A raw multigraph: parallel edges between the same nodes are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

impl RawGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Position of a stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopLocation {
    pub lon: f64,
    pub lat: f64,
}

/// What a builder needs to know about a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripInfo<'a> {
    pub route_id: &'a str,
    /// Short display name of the trip's route, if it has one.
    pub line: Option<&'a str>,
}

/// Everything a graph builder may read. Nothing else of the feed is exposed.
#[derive(Debug, Clone)]
pub struct BuilderInput<'a> {
    /// Stop times of the resolved window.
    pub stop_times: &'a [&'a StopTime],
    pub stops: HashMap<&'a StopId, StopLocation>,
    pub trips: HashMap<&'a str, TripInfo<'a>>,
    pub window: ServiceWindow,
}

impl<'a> BuilderInput<'a> {
    /// Collect the lookups for the stop times of `resolved`.
    pub fn new(feed: &'a Feed, resolved: &'a ResolvedWindow<'a>) -> Self {
        let stops = feed
            .stops
            .iter()
            .map(|stop| {
                (
                    &stop.stop_id,
                    StopLocation {
                        lon: stop.lon,
                        lat: stop.lat,
                    },
                )
            })
            .collect();

        let trips = resolved
            .stop_times
            .iter()
            .filter_map(|st| {
                let trip = feed.trips.get(&st.trip_id)?;
                let line = feed
                    .routes
                    .get(&trip.route_id)
                    .and_then(|route| route.short_name.as_deref());
                Some((
                    trip.trip_id.as_str(),
                    TripInfo {
                        route_id: trip.route_id.as_str(),
                        line,
                    },
                ))
            })
            .collect();

        Self {
            stop_times: &resolved.stop_times,
            stops,
            trips,
            window: resolved.window,
        }
    }
}

/// Turns a filtered timetable into a raw graph.
pub trait FeedGraphBuilder: Send + Sync {
    fn build(&self, input: &BuilderInput<'_>) -> Result<RawGraph, BuilderError>;
}
