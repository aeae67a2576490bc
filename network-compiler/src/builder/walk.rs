//! Walking links between nearby stops.

use geo::{HaversineDistance, Point};
use rstar::RTree;
use rstar::primitives::GeomWithData;

use super::{EdgeMode, RawEdge, RawNode};
use crate::config::WalkTransfers;

/// Slightly under the length of one degree of latitude, in metres, so
/// search boxes err on the large side.
const METRES_PER_DEGREE: f64 = 111_000.0;

/// Link every pair of nodes at most `walk.radius_m` apart, in both
/// directions, weighted by walking time.
///
/// An R-tree in degrees narrows the candidates, the haversine distance
/// decides.
pub(super) fn walk_edges(nodes: &[RawNode], walk: &WalkTransfers) -> Vec<RawEdge> {
    if !walk.is_enabled() {
        return Vec::new();
    }

    let located: Vec<GeomWithData<[f64; 2], usize>> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.lon.is_finite() && node.lat.is_finite())
        .map(|(i, node)| GeomWithData::new([node.lon, node.lat], i))
        .collect();
    let tree = RTree::bulk_load(located);

    let mut edges = Vec::new();
    for point in tree.iter() {
        let i = point.data;
        let here = &nodes[i];
        let origin = Point::new(here.lon, here.lat);
        let shrink = here.lat.to_radians().cos().max(0.01);
        let radius_deg = walk.radius_m / (METRES_PER_DEGREE * shrink);

        let mut nearby: Vec<(usize, f64)> = tree
            .locate_within_distance([here.lon, here.lat], radius_deg * radius_deg)
            .filter(|candidate| candidate.data != i)
            .filter_map(|candidate| {
                let there = &nodes[candidate.data];
                let metres = origin.haversine_distance(&Point::new(there.lon, there.lat));
                (metres <= walk.radius_m).then_some((candidate.data, metres))
            })
            .collect();
        nearby.sort_by_key(|&(j, _)| j);

        edges.extend(nearby.into_iter().map(|(j, metres)| RawEdge {
            from: here.id.clone(),
            to: nodes[j].id.clone(),
            length_seconds: walk.seconds_for(metres),
            mode: EdgeMode::Transfer,
            route_id: None,
        }));
    }

    // Tree iteration order is not the node order
    edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
    edges
}
