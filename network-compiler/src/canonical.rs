//! Merging raw platform nodes into canonical stations.
//!
//! Raw node ids are builder-specific and a station often appears as several
//! platform nodes. Canonicalization resolves every node to a station name,
//! allocates dense ids in a content-derived order, and rewrites the edges
//! onto those ids keeping the fastest connection per ordered pair.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info};

use crate::builder::{EdgeMode, RawGraph, RawNode};
use crate::config::TransferStrategy;
use crate::identity::{Resolution, StopIdentityResolver};
use crate::modes::LineLookup;

/// A station in the compiled graph.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalStop {
    /// Dense id in `0..stop_count`.
    pub id: u32,
    pub name: String,
    /// Mean longitude of the merged raw nodes.
    pub lon: f64,
    /// Mean latitude of the merged raw nodes.
    pub lat: f64,
    pub modes: BTreeSet<String>,
    /// Mean boarding cost of the merged raw nodes.
    pub boarding_cost: f64,
}

/// A directed connection between two distinct stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CanonicalEdge {
    pub from: u32,
    pub to: u32,
    pub weight_seconds: u64,
}

/// Counters describing what canonicalization kept and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalStats {
    pub resolved_nodes: usize,
    pub unresolved_nodes: usize,
    /// Edges within one station, including walks between its platforms.
    pub self_loops: usize,
    pub dangling_edges: usize,
    pub transfer_edges: usize,
}

/// Stations ordered by id and edges ordered by `(from, to)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalGraph {
    pub stops: Vec<CanonicalStop>,
    pub edges: Vec<CanonicalEdge>,
    pub stats: CanonicalStats,
}

/// Running sums for one canonical stop.
struct StopAccumulator<'a> {
    name: &'a str,
    lon_sum: f64,
    lat_sum: f64,
    cost_sum: f64,
    count: u32,
    modes: BTreeSet<String>,
}

impl<'a> StopAccumulator<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            lon_sum: 0.0,
            lat_sum: 0.0,
            cost_sum: 0.0,
            count: 0,
            modes: BTreeSet::new(),
        }
    }

    fn add(&mut self, node: &RawNode) {
        self.lon_sum += node.lon;
        self.lat_sum += node.lat;
        self.cost_sum += node.boarding_cost;
        self.count += 1;
        self.modes.extend(node.raw_modes.iter().cloned());
    }

    fn finish(self, id: u32, lines: &LineLookup) -> CanonicalStop {
        let n = f64::from(self.count.max(1));
        let mut modes = self.modes;
        modes.extend(lines.lines_for(self.name).iter().cloned());
        CanonicalStop {
            id,
            name: self.name.to_string(),
            lon: self.lon_sum / n,
            lat: self.lat_sum / n,
            modes,
            boarding_cost: self.cost_sum / n,
        }
    }
}

/// Whole seconds of a raw length. Negative and NaN lengths become zero.
fn floor_seconds(length: f64) -> u64 {
    if length.is_nan() || length <= 0.0 {
        0
    } else {
        length.floor() as u64
    }
}

/// Turns a raw graph into a canonical one.
pub struct GraphCanonicalizer<'a> {
    resolver: &'a StopIdentityResolver,
    lines: &'a LineLookup,
    transfers: TransferStrategy,
}

impl<'a> GraphCanonicalizer<'a> {
    pub fn new(
        resolver: &'a StopIdentityResolver,
        lines: &'a LineLookup,
        transfers: TransferStrategy,
    ) -> Self {
        Self {
            resolver,
            lines,
            transfers,
        }
    }

    pub fn canonicalize(&self, raw: &RawGraph) -> CanonicalGraph {
        let resolver: &'a StopIdentityResolver = self.resolver;
        let mut stats = CanonicalStats::default();

        let mut nodes: Vec<&RawNode> = raw.nodes.iter().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut accumulators: Vec<StopAccumulator<'a>> = Vec::new();
        let mut by_name: HashMap<&'a str, Vec<u32>> = HashMap::new();
        let mut raw_to_canonical: HashMap<&str, u32> = HashMap::new();

        for node in nodes {
            let name = match resolver.resolve(&node.id, node.lon, node.lat) {
                Resolution::Resolved { name, strategy } => {
                    debug!(raw_id = %node.id, name, %strategy, "Resolved raw node");
                    name
                }
                Resolution::Unresolved => {
                    stats.unresolved_nodes += 1;
                    debug!(raw_id = %node.id, "Dropping unresolved raw node");
                    continue;
                }
            };
            stats.resolved_nodes += 1;

            let existing = match self.transfers {
                TransferStrategy::Merge => by_name.get(name).and_then(|ids| ids.first().copied()),
                TransferStrategy::ExplicitEdges { .. } => None,
            };
            let id = match existing {
                Some(id) => id,
                None => {
                    let id = accumulators.len() as u32;
                    accumulators.push(StopAccumulator::new(name));
                    by_name.entry(name).or_default().push(id);
                    id
                }
            };
            accumulators[id as usize].add(node);
            raw_to_canonical.entry(node.id.as_str()).or_insert(id);
        }

        let mut fastest: BTreeMap<(u32, u32), f64> = BTreeMap::new();
        for edge in &raw.edges {
            let (Some(&from), Some(&to)) = (
                raw_to_canonical.get(edge.from.as_str()),
                raw_to_canonical.get(edge.to.as_str()),
            ) else {
                stats.dangling_edges += 1;
                continue;
            };
            // Same-station links come from the transfer strategy, not walks
            let walk_within_station = edge.mode == EdgeMode::Transfer
                && accumulators[from as usize].name == accumulators[to as usize].name;
            if from == to || walk_within_station {
                stats.self_loops += 1;
                continue;
            }
            fastest
                .entry((from, to))
                .and_modify(|length| *length = length.min(edge.length_seconds))
                .or_insert(edge.length_seconds);
        }

        if let TransferStrategy::ExplicitEdges { penalty_seconds } = self.transfers {
            for ids in by_name.values().filter(|ids| ids.len() > 1) {
                for &from in ids {
                    for &to in ids.iter().filter(|&&to| to != from) {
                        if let Entry::Vacant(entry) = fastest.entry((from, to)) {
                            entry.insert(penalty_seconds as f64);
                            stats.transfer_edges += 1;
                        }
                    }
                }
            }
        }

        let stops: Vec<CanonicalStop> = accumulators
            .into_iter()
            .enumerate()
            .map(|(id, acc)| acc.finish(id as u32, self.lines))
            .collect();
        let edges: Vec<CanonicalEdge> = fastest
            .into_iter()
            .map(|((from, to), length)| CanonicalEdge {
                from,
                to,
                weight_seconds: floor_seconds(length),
            })
            .collect();

        info!(
            stops = stops.len(),
            edges = edges.len(),
            resolved = stats.resolved_nodes,
            unresolved = stats.unresolved_nodes,
            self_loops = stats.self_loops,
            dangling = stats.dangling_edges,
            transfers = stats.transfer_edges,
            "Canonicalized graph"
        );

        CanonicalGraph {
            stops,
            edges,
            stats,
        }
    }
}
