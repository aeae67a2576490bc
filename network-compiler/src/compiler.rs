//! One window, end to end: resolve, build, canonicalize, serialize.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::builder::{BuilderInput, FeedGraphBuilder, RawGraph, ScheduledGraphBuilder};
use crate::canonical::GraphCanonicalizer;
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::feed::Feed;
use crate::identity::StopIdentityResolver;
use crate::modes::LineLookup;
use crate::serialize::GraphArtifact;
use crate::window::ServiceWindowResolver;

/// Which service day and hours to compile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileRequest {
    pub date: NaiveDate,
    pub start_hour: f64,
    /// May exceed 24 for windows crossing midnight.
    pub end_hour: f64,
}

impl CompileRequest {
    pub fn new(date: NaiveDate, start_hour: f64, end_hour: f64) -> Self {
        Self {
            date,
            start_hour,
            end_hour,
        }
    }
}

/// Compiles feed windows into graph artifacts.
///
/// Only a missing service day aborts a compilation. A window with no stop
/// times or a failing graph builder yields an empty artifact instead.
pub struct Compiler<B = ScheduledGraphBuilder> {
    config: CompilerConfig,
    builder: B,
}

impl Compiler<ScheduledGraphBuilder> {
    /// A compiler using the default schedule-based graph builder.
    pub fn new(config: CompilerConfig) -> Self {
        let builder = ScheduledGraphBuilder::new(config.node_prefix.clone())
            .with_walk_transfers(config.walk_transfers);
        Self { config, builder }
    }
}

impl<B: FeedGraphBuilder> Compiler<B> {
    pub fn with_builder(config: CompilerConfig, builder: B) -> Self {
        Self { config, builder }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn compile(
        &self,
        feed: &Feed,
        request: &CompileRequest,
    ) -> Result<GraphArtifact, CompileError> {
        let CompileRequest {
            date,
            start_hour,
            end_hour,
        } = *request;

        let resolved =
            ServiceWindowResolver::new(feed, &self.config).resolve(date, start_hour, end_hour)?;
        if resolved.is_empty() {
            info!(%date, start_hour, end_hour, "No stop times in window, emitting empty graph");
            return Ok(GraphArtifact::empty(start_hour, end_hour));
        }

        let input = BuilderInput::new(feed, &resolved);
        let raw = match self.builder.build(&input) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%date, start_hour, end_hour, error = %e, "Graph builder failed, using empty graph");
                RawGraph::default()
            }
        };

        let identities = StopIdentityResolver::new(&feed.stops, self.config.coordinate_precision)
            .with_node_prefix(self.config.node_prefix.clone());
        let lines = LineLookup::build(feed, &resolved.stop_times, &identities);
        let graph = GraphCanonicalizer::new(&identities, &lines, self.config.transfers)
            .canonicalize(&raw);

        Ok(GraphArtifact::from_graph(&graph, start_hour, end_hour))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuilderError;
    use crate::config::{TransferStrategy, WalkTransfers};
    use geo::{HaversineDistance, Point};
    use crate::testing::{FeedBuilder, date};

    fn request(start: f64, end: f64) -> CompileRequest {
        CompileRequest::new(date(2024, 3, 12), start, end)
    }

    fn night_feed() -> Feed {
        FeedBuilder::new()
            .stop("M1", "Hôtel de Ville", 45.767, 4.836)
            .stop("M2", "Foch", 45.769, 4.844)
            .stop("B1", "Cordeliers", 45.763, 4.835)
            .stop("B2", "Bellecour", 45.758, 4.832)
            .route("MA", "A", 1)
            .route("PL", "PL1", 3)
            .trip("METRO", "MA", "DAILY")
            .call("METRO", "M1", 1, "02:00:00")
            .call("METRO", "M2", 2, "02:02:00")
            .trip("NIGHTBUS", "PL", "DAILY")
            .call("NIGHTBUS", "B1", 1, "02:00:00")
            .call("NIGHTBUS", "B2", 2, "02:04:30")
            .build()
    }

    fn node_names(artifact: &GraphArtifact) -> Vec<&str> {
        artifact.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn deep_night_window_has_no_metro() {
        let compiler = Compiler::new(CompilerConfig::default());

        let artifact = compiler.compile(&night_feed(), &request(1.0, 4.0)).unwrap();

        assert_eq!(node_names(&artifact), vec!["Cordeliers", "Bellecour"]);
        assert_eq!(artifact.edges, vec![(0, 1, 270)]);
        assert!(artifact.nodes.iter().all(|n| n.modes == vec!["PL1".to_string()]));
        assert_eq!(artifact.metadata.period, "1-4");
    }

    #[test]
    fn metro_kept_outside_deep_night() {
        let compiler = Compiler::new(CompilerConfig::default());

        let artifact = compiler.compile(&night_feed(), &request(0.0, 4.0)).unwrap();

        assert_eq!(artifact.metadata.node_count, 4);
        assert_eq!(artifact.metadata.edge_count, 2);
    }

    #[test]
    fn malformed_time_does_not_raise() {
        let feed = FeedBuilder::new()
            .stop("1", "Alpha", 45.0, 4.0)
            .stop("2", "Beta", 45.1, 4.1)
            .stop("3", "Gamma", 45.2, 4.2)
            .route("B", "C3", 3)
            .trip("T1", "B", "DAILY")
            .call("T1", "1", 1, "08:00:00")
            .call("T1", "2", 2, "abc")
            .call("T1", "3", 3, "08:10:00")
            .build();
        let compiler = Compiler::new(CompilerConfig::default());

        let artifact = compiler.compile(&feed, &request(7.0, 9.0)).unwrap();

        assert_eq!(node_names(&artifact), vec!["Alpha", "Gamma"]);
        assert_eq!(artifact.edges, vec![(0, 1, 600)]);
    }

    #[test]
    fn empty_window_gives_empty_artifact() {
        let compiler = Compiler::new(CompilerConfig::default());

        let artifact = compiler.compile(&night_feed(), &request(8.0, 8.0)).unwrap();

        assert!(artifact.is_empty());
        let json = artifact.to_json().unwrap();
        assert!(json.contains(r#""nodes":[],"edges":[]"#));
    }

    #[test]
    fn no_service_is_an_error() {
        let feed = FeedBuilder::new().without_daily_service().build();
        let compiler = Compiler::new(CompilerConfig::default());

        let err = compiler.compile(&feed, &request(7.0, 9.0)).unwrap_err();
        assert!(matches!(err, CompileError::NoActiveService { .. }));
    }

    struct FailingBuilder;

    impl FeedGraphBuilder for FailingBuilder {
        fn build(&self, _input: &BuilderInput<'_>) -> Result<RawGraph, BuilderError> {
            Err(BuilderError::Failed("no graph today".into()))
        }
    }

    #[test]
    fn builder_failure_gives_empty_artifact() {
        let compiler = Compiler::with_builder(CompilerConfig::default(), FailingBuilder);

        let artifact = compiler.compile(&night_feed(), &request(0.0, 4.0)).unwrap();

        assert!(artifact.is_empty());
        assert_eq!(artifact.metadata.period, "0-4");
    }

    #[test]
    fn explicit_transfers_link_platforms() {
        let feed = FeedBuilder::new()
            .stop("726", "Bellecour", 45.7578, 4.8320)
            .platform("726A", "Bellecour A", 45.7578, 4.8320, "726")
            .platform("726D", "Bellecour D", 45.7579, 4.8322, "726")
            .stop("800", "Perrache", 45.7486, 4.8264)
            .stop("900", "Vieux Lyon", 45.7601, 4.8262)
            .route("MA", "A", 1)
            .route("MD", "D", 1)
            .trip("TA", "MA", "DAILY")
            .call("TA", "726A", 1, "08:00:00")
            .call("TA", "800", 2, "08:02:00")
            .trip("TD", "MD", "DAILY")
            .call("TD", "726D", 1, "08:01:00")
            .call("TD", "900", 2, "08:03:00")
            .build();

        let merged = Compiler::new(CompilerConfig::default())
            .compile(&feed, &request(7.0, 9.0))
            .unwrap();
        assert_eq!(merged.metadata.node_count, 3);
        assert_eq!(merged.nodes[0].name, "Bellecour");
        assert_eq!(merged.nodes[0].modes, vec!["A".to_string(), "D".to_string()]);

        let config = CompilerConfig::default().with_transfers(TransferStrategy::ExplicitEdges {
            penalty_seconds: 120,
        });
        let explicit = Compiler::new(config)
            .compile(&feed, &request(7.0, 9.0))
            .unwrap();
        assert_eq!(explicit.metadata.node_count, 4);
        assert!(explicit.edges.contains(&(0, 1, 120)));
        assert!(explicit.edges.contains(&(1, 0, 120)));
    }

    #[test]
    fn underscore_stop_ids_keep_their_station() {
        let feed = FeedBuilder::new()
            .stop("1", "Alpha", 10.0, 10.0)
            .stop("BEL_1", "Bellecour", 45.7578, 4.8320)
            .stop("800", "Perrache", 45.7486, 4.8264)
            .route("B", "C3", 3)
            .trip("T1", "B", "DAILY")
            .call("T1", "BEL_1", 1, "08:00:00")
            .call("T1", "800", 2, "08:02:00")
            .build();

        let artifact = Compiler::new(CompilerConfig::default())
            .compile(&feed, &request(7.0, 9.0))
            .unwrap();

        assert_eq!(node_names(&artifact), vec!["Perrache", "Bellecour"]);
        assert_eq!(artifact.nodes[1].x, 4.8320);
        assert_eq!(artifact.nodes[1].y, 45.7578);
        assert_eq!(artifact.edges, vec![(1, 0, 120)]);
    }

    #[test]
    fn unknown_stop_keeps_rest_of_window() {
        let feed = FeedBuilder::new()
            .stop("1", "Alpha", 45.0, 4.0)
            .stop("2", "Beta", 45.1, 4.1)
            .route("B", "C3", 3)
            .trip("T1", "B", "DAILY")
            .call("T1", "1", 1, "08:00:00")
            .call("T1", "2", 2, "08:05:00")
            .trip("T2", "B", "DAILY")
            .call("T2", "1", 1, "08:20:00")
            .call("T2", "99", 2, "08:25:00")
            .build();

        let artifact = Compiler::new(CompilerConfig::default())
            .compile(&feed, &request(7.0, 9.0))
            .unwrap();

        assert_eq!(node_names(&artifact), vec!["Alpha", "Beta"]);
        assert_eq!(artifact.edges, vec![(0, 1, 300)]);
    }

    #[test]
    fn nearby_stations_linked_by_walking() {
        let feed = FeedBuilder::new()
            .stop("1", "Alpha", 45.0, 4.0)
            .stop("2", "Beta", 45.0, 4.001)
            .stop("3", "Gamma", 45.2, 4.2)
            .stop("4", "Delta", 45.3, 4.3)
            .route("B", "C3", 3)
            .trip("T1", "B", "DAILY")
            .call("T1", "1", 1, "08:00:00")
            .call("T1", "3", 2, "08:10:00")
            .trip("T2", "B", "DAILY")
            .call("T2", "2", 1, "08:00:00")
            .call("T2", "4", 2, "08:10:00")
            .build();

        let artifact = Compiler::new(CompilerConfig::default())
            .compile(&feed, &request(7.0, 9.0))
            .unwrap();

        let metres: f64 = Point::new(4.0, 45.0).haversine_distance(&Point::new(4.001, 45.0));
        let walk = (metres / (4.5 / 3.6)).floor() as u64;
        assert_eq!(
            artifact.edges,
            vec![(0, 1, walk), (0, 2, 600), (1, 0, walk), (1, 3, 600)]
        );

        let config = CompilerConfig::default().with_walk_transfers(WalkTransfers::disabled());
        let no_walks = Compiler::new(config)
            .compile(&feed, &request(7.0, 9.0))
            .unwrap();
        assert_eq!(no_walks.edges, vec![(0, 2, 600), (1, 3, 600)]);
    }

    #[test]
    fn quoted_duplicate_names_merge() {
        let feed = FeedBuilder::new()
            .stop("1", "\"Bellecour\"", 45.7578, 4.8320)
            .stop("2", "Bellecour", 45.7579, 4.8321)
            .stop("800", "Perrache", 45.7486, 4.8264)
            .route("B", "C3", 3)
            .trip("T1", "B", "DAILY")
            .call("T1", "1", 1, "08:00:00")
            .call("T1", "800", 2, "08:03:00")
            .trip("T2", "B", "DAILY")
            .call("T2", "2", 1, "08:00:00")
            .call("T2", "800", 2, "08:02:00")
            .build();

        let artifact = Compiler::new(CompilerConfig::default())
            .compile(&feed, &request(7.0, 9.0))
            .unwrap();

        assert_eq!(node_names(&artifact), vec!["Bellecour", "Perrache"]);
        assert_eq!(artifact.edges, vec![(0, 1, 120)]);
    }

    #[test]
    fn huge_end_hour_does_not_overflow() {
        let compiler = Compiler::new(CompilerConfig::default());

        let artifact = compiler.compile(&night_feed(), &request(7.0, 2e6)).unwrap();

        assert!(artifact.is_empty());
        assert_eq!(artifact.metadata.period, "7-2000000");
    }

    #[test]
    fn compilation_is_byte_identical() {
        let feed = night_feed();
        let compiler = Compiler::new(CompilerConfig::default());

        let first = compiler.compile(&feed, &request(0.0, 4.0)).unwrap();
        let second = compiler.compile(&feed, &request(0.0, 4.0)).unwrap();

        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }
}
