//! Default graph builder: one node per visited stop, one edge per hop.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::walk::walk_edges;
use super::{BuilderError, BuilderInput, EdgeMode, FeedGraphBuilder, RawEdge, RawGraph, RawNode};
use crate::config::WalkTransfers;
use crate::domain::{FeedTime, StopId};
use crate::feed::StopTime;

/// Builds a raw graph straight from the scheduled stop times.
///
/// Consecutive calls of a trip become a transit edge weighted by the
/// scheduled running time. Each stop's boarding cost is half its mean
/// headway over the window. Stops within walking radius of each other are
/// linked by transfer edges.
///
/// Node ids are `{prefix}_{stop id}`.
#[derive(Debug, Clone)]
pub struct ScheduledGraphBuilder {
    node_prefix: String,
    walk: WalkTransfers,
}

impl ScheduledGraphBuilder {
    pub fn new(node_prefix: impl Into<String>) -> Self {
        Self {
            node_prefix: node_prefix.into(),
            walk: WalkTransfers::default(),
        }
    }

    pub fn with_walk_transfers(mut self, walk: WalkTransfers) -> Self {
        self.walk = walk;
        self
    }

    fn node_id(&self, stop_id: &StopId) -> String {
        format!("{}_{}", self.node_prefix, stop_id)
    }
}

impl Default for ScheduledGraphBuilder {
    fn default() -> Self {
        Self::new("feed")
    }
}

#[derive(Default)]
struct NodeStats {
    modes: BTreeSet<String>,
    calls: usize,
}

fn departure_of(st: &StopTime) -> Option<FeedTime> {
    st.departure_time
        .as_deref()
        .and_then(|t| FeedTime::parse(t).ok())
        .or_else(|| FeedTime::parse(&st.arrival_time).ok())
}

impl FeedGraphBuilder for ScheduledGraphBuilder {
    fn build(&self, input: &BuilderInput<'_>) -> Result<RawGraph, BuilderError> {
        let mut by_trip: BTreeMap<&str, Vec<&StopTime>> = BTreeMap::new();
        for &st in input.stop_times {
            by_trip.entry(st.trip_id.as_str()).or_default().push(st);
        }

        let mut stats: BTreeMap<&StopId, NodeStats> = BTreeMap::new();
        let mut edges = Vec::new();
        let mut unknown_stops = 0usize;

        for (trip_id, mut calls) in by_trip {
            let trip = input
                .trips
                .get(trip_id)
                .ok_or_else(|| BuilderError::UnknownTrip {
                    trip_id: trip_id.to_string(),
                })?;
            calls.sort_by_key(|st| st.stop_sequence);

            for &st in &calls {
                if !input.stops.contains_key(&st.stop_id) {
                    unknown_stops += 1;
                    debug!(%trip_id, stop_id = %st.stop_id, "Skipping call at unknown stop");
                    continue;
                }
                let node = stats.entry(&st.stop_id).or_default();
                node.calls += 1;
                if let Some(line) = trip.line {
                    node.modes.insert(line.to_string());
                }
            }

            for pair in calls.windows(2) {
                let (here, next) = (pair[0], pair[1]);
                if !input.stops.contains_key(&here.stop_id) || !input.stops.contains_key(&next.stop_id)
                {
                    continue;
                }
                let (Some(departure), Ok(arrival)) =
                    (departure_of(here), FeedTime::parse(&next.arrival_time))
                else {
                    continue;
                };
                edges.push(RawEdge {
                    from: self.node_id(&here.stop_id),
                    to: self.node_id(&next.stop_id),
                    length_seconds: f64::from(arrival.saturating_seconds_since(departure)),
                    mode: EdgeMode::Transit,
                    route_id: Some(trip.route_id.to_string()),
                });
            }
        }

        let window_seconds = f64::from(input.window.duration_seconds());
        let nodes: Vec<RawNode> = stats
            .into_iter()
            .filter_map(|(stop_id, node)| {
                let location = input.stops.get(stop_id)?;
                Some(RawNode {
                    id: self.node_id(stop_id),
                    lon: location.lon,
                    lat: location.lat,
                    raw_modes: node.modes,
                    boarding_cost: window_seconds / node.calls as f64 / 2.0,
                })
            })
            .collect();

        if unknown_stops > 0 {
            warn!(
                calls = unknown_stops,
                "Skipped calls at stops missing from the stop table"
            );
        }

        let walks = walk_edges(&nodes, &self.walk);
        debug!(
            nodes = nodes.len(),
            transit_edges = edges.len(),
            walk_edges = walks.len(),
            "Built raw graph from schedule"
        );
        edges.extend(walks);

        Ok(RawGraph { nodes, edges })
    }
}
