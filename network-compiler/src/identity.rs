//! Mapping raw graph node ids back to real-world station names.
//!
//! Three identifier spaces meet here: feed stop ids, the ids a graph builder
//! invents for its nodes, and human station names. The resolver tries a
//! fixed list of strategies in order and returns a typed [`Resolution`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use tracing::debug;

use crate::domain::StopId;
use crate::feed::Stop;

/// Which lookup produced a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    /// The raw id is a stop id.
    ExactId,
    /// The raw id embeds a stop id behind the builder's node prefix or
    /// between `_` separators.
    CompositeId,
    /// The node's rounded coordinates match a stop.
    Coordinates,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::ExactId => "exact id",
            Strategy::CompositeId => "composite id",
            Strategy::Coordinates => "coordinates",
        };
        f.write_str(s)
    }
}

/// Outcome of resolving one raw node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Resolved { name: &'a str, strategy: Strategy },
    Unresolved,
}

impl<'a> Resolution<'a> {
    /// The station name, if resolved.
    pub fn name(&self) -> Option<&'a str> {
        match *self {
            Resolution::Resolved { name, .. } => Some(name),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}

/// Lookup tables from stop ids and rounded coordinates to station names.
///
/// Built once per feed. Platforms whose parent station is a known stop
/// resolve to the parent's name, so all platforms of a station share one.
#[derive(Debug, Clone, Default)]
pub struct StopIdentityResolver {
    id_map: HashMap<StopId, String>,
    coord_map: HashMap<(i64, i64), String>,
    precision: u32,
    node_prefix: Option<String>,
}

impl StopIdentityResolver {
    /// Build the lookup tables. Coordinates are matched after rounding to
    /// `precision` decimal places.
    pub fn new(stops: &[Stop], precision: u32) -> Self {
        let by_id: HashMap<&StopId, &Stop> = stops.iter().map(|s| (&s.stop_id, s)).collect();

        let mut id_map = HashMap::new();
        let mut coord_map = HashMap::new();

        for stop in stops {
            let own_name = clean_name(&stop.name);
            let parent_name = stop
                .parent_station
                .as_ref()
                .and_then(|parent| by_id.get(parent))
                .map(|parent| clean_name(&parent.name))
                .filter(|name| !name.is_empty());
            let Some(name) = parent_name.or(Some(own_name).filter(|n| !n.is_empty())) else {
                continue;
            };

            if let Entry::Vacant(entry) = id_map.entry(stop.stop_id.clone()) {
                entry.insert(name.to_string());
            }
            if let Entry::Vacant(entry) = coord_map.entry(coord_key(stop.lon, stop.lat, precision))
            {
                entry.insert(name.to_string());
            }
        }

        debug!(
            ids = id_map.len(),
            coordinates = coord_map.len(),
            "Built stop identity tables"
        );

        Self {
            id_map,
            coord_map,
            precision,
            node_prefix: None,
        }
    }

    /// Raw ids of the form `{prefix}_{stop id}` resolve to the embedded
    /// stop id before any other composite split is tried.
    pub fn with_node_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.node_prefix = Some(prefix.into());
        self
    }

    /// Station name for a feed stop id, with parent-station folding.
    pub fn name_for_stop_id(&self, stop_id: &StopId) -> Option<&str> {
        self.id_map.get(stop_id).map(String::as_str)
    }

    fn lookup(&self, raw: &str) -> Option<&str> {
        let id = StopId::parse(raw).ok()?;
        self.name_for_stop_id(&id)
    }

    fn lookup_prefixed(&self, raw_id: &str) -> Option<&str> {
        let prefix = self.node_prefix.as_deref()?;
        let stop_id = raw_id.strip_prefix(prefix)?.strip_prefix('_')?;
        self.lookup(stop_id)
    }

    fn lookup_composite(&self, raw_id: &str) -> Option<&str> {
        if let Some(name) = self.lookup_prefixed(raw_id) {
            return Some(name);
        }
        let (head, _) = raw_id.rsplit_once('_')?;
        self.lookup(head)
            .or_else(|| raw_id.split('_').find_map(|part| self.lookup(part)))
    }

    /// Resolve a raw node to a station name.
    ///
    /// Tries the id as a stop id, then the stop id behind the node prefix,
    /// then its `_`-separated parts, then the node's rounded coordinates.
    pub fn resolve(&self, raw_id: &str, lon: f64, lat: f64) -> Resolution<'_> {
        if let Some(name) = self.lookup(raw_id) {
            return Resolution::Resolved {
                name,
                strategy: Strategy::ExactId,
            };
        }
        if let Some(name) = self.lookup_composite(raw_id) {
            return Resolution::Resolved {
                name,
                strategy: Strategy::CompositeId,
            };
        }
        if let Some(name) = self.coord_map.get(&coord_key(lon, lat, self.precision)) {
            return Resolution::Resolved {
                name,
                strategy: Strategy::Coordinates,
            };
        }
        Resolution::Unresolved
    }
}

/// Strip surrounding whitespace and quote characters from a station name.
pub fn clean_name(name: &str) -> &str {
    name.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
}

/// Coordinates scaled and rounded to `precision` decimal places.
fn coord_key(lon: f64, lat: f64, precision: u32) -> (i64, i64) {
    let scale = 10f64.powi(precision as i32);
    ((lon * scale).round() as i64, (lat * scale).round() as i64)
}
