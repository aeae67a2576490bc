//! The compiled graph artifact and its JSON form.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::canonical::CanonicalGraph;
use crate::error::CompileError;

/// Summary block at the top of an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Requested hour range, e.g. `"7-9"` or `"23-26"`.
    pub period: String,
    pub node_count: usize,
    pub edge_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactNode {
    /// Decimal form of the node's index.
    pub id: String,
    pub name: String,
    /// Longitude.
    pub x: f64,
    /// Latitude.
    pub y: f64,
    pub modes: Vec<String>,
    pub boarding_cost: f64,
}

/// A compiled network for one window, as written to disk.
///
/// Edges are `[from, to, weight_seconds]` triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphArtifact {
    pub metadata: Metadata,
    pub nodes: Vec<ArtifactNode>,
    pub edges: Vec<(u32, u32, u64)>,
}

impl GraphArtifact {
    pub fn from_graph(graph: &CanonicalGraph, start_hour: f64, end_hour: f64) -> Self {
        let nodes: Vec<ArtifactNode> = graph
            .stops
            .iter()
            .map(|stop| ArtifactNode {
                id: stop.id.to_string(),
                name: stop.name.clone(),
                x: stop.lon,
                y: stop.lat,
                modes: stop.modes.iter().cloned().collect(),
                boarding_cost: stop.boarding_cost,
            })
            .collect();
        let edges: Vec<(u32, u32, u64)> = graph
            .edges
            .iter()
            .map(|e| (e.from, e.to, e.weight_seconds))
            .collect();

        Self {
            metadata: Metadata {
                period: format_period(start_hour, end_hour),
                node_count: nodes.len(),
                edge_count: edges.len(),
            },
            nodes,
            edges,
        }
    }

    /// An artifact with no nodes and no edges.
    pub fn empty(start_hour: f64, end_hour: f64) -> Self {
        Self::from_graph(&CanonicalGraph::default(), start_hour, end_hour)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Compact JSON with non-ASCII characters kept literal.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn format_hour(hour: f64) -> String {
    if hour.is_finite() && hour.fract() == 0.0 {
        format!("{}", hour as i64)
    } else {
        format!("{hour}")
    }
}

/// The `period` label for an hour range: `7-9`, `7.5-9`, `23-26`.
pub fn format_period(start_hour: f64, end_hour: f64) -> String {
    format!("{}-{}", format_hour(start_hour), format_hour(end_hour))
}

/// Write an artifact, creating missing parent directories.
pub fn write_artifact(path: &Path, artifact: &GraphArtifact) -> Result<(), CompileError> {
    let json = artifact.to_json()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CompileError::Output {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, json).map_err(|source| CompileError::Output {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        nodes = artifact.metadata.node_count,
        edges = artifact.metadata.edge_count,
        "Wrote graph artifact"
    );
    Ok(())
}
