//! Compiling many windows of one service day.
//!
//! Windows are independent: each runs on a blocking worker with a shared,
//! read-only feed and writes its own artifact. A failing window is logged
//! and recorded, and the rest of the batch carries on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{error, info};

use crate::builder::FeedGraphBuilder;
use crate::compiler::{CompileRequest, Compiler};
use crate::error::CompileError;
use crate::feed::Feed;
use crate::serialize::write_artifact;

/// Default number of windows compiled at once.
const DEFAULT_MAX_PARALLEL: usize = 4;

/// Configuration for batch runs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of windows compiled concurrently.
    pub max_parallel: usize,
}

impl BatchConfig {
    pub fn new(max_parallel: usize) -> Self {
        Self { max_parallel }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

/// A named window of the service day.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    /// Used in the artifact file name.
    pub label: String,
    pub start_hour: f64,
    pub end_hour: f64,
}

impl WindowSpec {
    pub fn new(label: impl Into<String>, start_hour: f64, end_hour: f64) -> Self {
        Self {
            label: label.into(),
            start_hour,
            end_hour,
        }
    }

    /// The periods of a typical weekday, ending with the late night
    /// service that runs past midnight.
    pub fn day_periods() -> Vec<Self> {
        vec![
            Self::new("morning_peak", 7.0, 9.0),
            Self::new("day_offpeak", 9.0, 16.0),
            Self::new("evening_peak", 16.0, 19.0),
            Self::new("evening", 19.0, 23.0),
            Self::new("late_night", 23.0, 26.0),
        ]
    }

    /// Twenty-four one-hour slices from midnight.
    pub fn hourly() -> Vec<Self> {
        (0..24)
            .map(|h| Self::new(format!("{h:02}h"), f64::from(h), f64::from(h + 1)))
            .collect()
    }

    /// Artifact file name for this window.
    pub fn file_name(&self) -> String {
        format!("network_{}.json", self.label)
    }
}

/// What a successful window produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSummary {
    pub path: PathBuf,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Result of one window in a batch.
#[derive(Debug, Clone)]
pub struct WindowOutcome {
    pub window: WindowSpec,
    /// The failure message if the window failed.
    pub result: Result<WindowSummary, String>,
}

impl WindowOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a batch, in the order the windows were given.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<WindowOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

fn compile_window<B: FeedGraphBuilder>(
    compiler: &Compiler<B>,
    feed: &Feed,
    request: &CompileRequest,
    path: &Path,
) -> Result<WindowSummary, CompileError> {
    let artifact = compiler.compile(feed, request)?;
    write_artifact(path, &artifact)?;
    Ok(WindowSummary {
        path: path.to_path_buf(),
        node_count: artifact.metadata.node_count,
        edge_count: artifact.metadata.edge_count,
    })
}

/// Runs a compiler over a list of windows.
pub struct BatchDriver<B> {
    compiler: Arc<Compiler<B>>,
    config: BatchConfig,
}

impl<B: FeedGraphBuilder + 'static> BatchDriver<B> {
    pub fn new(compiler: Compiler<B>, config: BatchConfig) -> Self {
        Self {
            compiler: Arc::new(compiler),
            config,
        }
    }

    /// Compile every window for `date`, writing `network_<label>.json`
    /// files into `out_dir`.
    pub async fn run(
        &self,
        feed: Arc<Feed>,
        date: NaiveDate,
        windows: &[WindowSpec],
        out_dir: &Path,
    ) -> BatchReport {
        let mut outcomes = Vec::with_capacity(windows.len());

        for chunk in windows.chunks(self.config.max_parallel.max(1)) {
            let tasks: Vec<_> = chunk
                .iter()
                .map(|window| {
                    let compiler = Arc::clone(&self.compiler);
                    let feed = Arc::clone(&feed);
                    let request = CompileRequest::new(date, window.start_hour, window.end_hour);
                    let path = out_dir.join(window.file_name());
                    tokio::task::spawn_blocking(move || {
                        compile_window(&compiler, &feed, &request, &path)
                    })
                })
                .collect();

            let results = join_all(tasks).await;

            for (window, joined) in chunk.iter().zip(results) {
                let result = match joined {
                    Ok(Ok(summary)) => {
                        info!(
                            window = %window.label,
                            nodes = summary.node_count,
                            edges = summary.edge_count,
                            "Window compiled"
                        );
                        Ok(summary)
                    }
                    Ok(Err(e)) => {
                        error!(window = %window.label, error = %e, "Window failed");
                        Err(e.to_string())
                    }
                    Err(e) => {
                        error!(window = %window.label, error = %e, "Window task aborted");
                        Err(format!("worker task failed: {e}"))
                    }
                };
                outcomes.push(WindowOutcome {
                    window: window.clone(),
                    result,
                });
            }
        }

        let report = BatchReport { outcomes };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuilderError, BuilderInput, RawGraph, ScheduledGraphBuilder};
    use crate::config::CompilerConfig;
    use crate::serialize::GraphArtifact;
    use crate::testing::{FeedBuilder, date};

    fn busy_feed() -> Feed {
        FeedBuilder::new()
            .stop("1", "Alpha", 45.0, 4.0)
            .stop("2", "Beta", 45.1, 4.1)
            .route("B", "C3", 3)
            .trip("MORNING", "B", "DAILY")
            .call("MORNING", "1", 1, "08:00:00")
            .call("MORNING", "2", 2, "08:06:00")
            .trip("LATE", "B", "DAILY")
            .call("LATE", "2", 1, "24:30:00")
            .call("LATE", "1", 2, "24:37:00")
            .build()
    }

    #[test]
    fn default_config() {
        assert_eq!(BatchConfig::default().max_parallel, 4);
        assert_eq!(BatchConfig::new(2).max_parallel, 2);
    }

    #[test]
    fn built_in_windows() {
        let periods = WindowSpec::day_periods();
        assert_eq!(periods.len(), 5);
        assert_eq!(periods[0], WindowSpec::new("morning_peak", 7.0, 9.0));
        assert_eq!(periods[4], WindowSpec::new("late_night", 23.0, 26.0));

        let hourly = WindowSpec::hourly();
        assert_eq!(hourly.len(), 24);
        assert_eq!(hourly[0], WindowSpec::new("00h", 0.0, 1.0));
        assert_eq!(hourly[23].file_name(), "network_23h.json");
    }

    #[tokio::test]
    async fn writes_one_artifact_per_window() {
        let dir = tempfile::tempdir().unwrap();
        let driver = BatchDriver::new(Compiler::new(CompilerConfig::default()), BatchConfig::new(2));

        let report = driver
            .run(
                Arc::new(busy_feed()),
                date(2024, 3, 12),
                &WindowSpec::day_periods(),
                dir.path(),
            )
            .await;

        assert_eq!(report.succeeded(), 5);
        assert_eq!(report.failed(), 0);

        let morning = std::fs::read_to_string(dir.path().join("network_morning_peak.json")).unwrap();
        let morning: GraphArtifact = serde_json::from_str(&morning).unwrap();
        assert_eq!(morning.edges, vec![(0, 1, 360)]);

        let late = std::fs::read_to_string(dir.path().join("network_late_night.json")).unwrap();
        let late: GraphArtifact = serde_json::from_str(&late).unwrap();
        assert_eq!(late.metadata.period, "23-26");
        assert_eq!(late.edges, vec![(1, 0, 420)]);

        let offpeak = &report.outcomes[1];
        assert_eq!(offpeak.window.label, "day_offpeak");
        assert_eq!(offpeak.result.as_ref().unwrap().node_count, 0);
    }

    #[tokio::test]
    async fn failing_window_does_not_stop_batch() {
        // Only Saturday runs; on Sunday just the early window reaches back
        // into Saturday's service.
        let feed = FeedBuilder::new()
            .without_daily_service()
            .calendar("SAT", [false, false, false, false, false, true, false])
            .stop("1", "Alpha", 45.0, 4.0)
            .stop("2", "Beta", 45.1, 4.1)
            .route("B", "PL1", 3)
            .trip("NIGHT", "B", "SAT")
            .call("NIGHT", "1", 1, "25:00:00")
            .call("NIGHT", "2", 2, "25:10:00")
            .build();
        let dir = tempfile::tempdir().unwrap();
        let driver = BatchDriver::new(Compiler::new(CompilerConfig::default()), BatchConfig::default());
        let windows = vec![
            WindowSpec::new("day", 7.0, 9.0),
            WindowSpec::new("early", 0.5, 3.0),
        ];

        let report = driver
            .run(Arc::new(feed), date(2024, 3, 17), &windows, dir.path())
            .await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.outcomes[0].result.as_ref().unwrap_err().contains("no active service"));
        assert_eq!(report.outcomes[1].result.as_ref().unwrap().edge_count, 1);
        assert!(!dir.path().join("network_day.json").exists());
        assert!(dir.path().join("network_early.json").exists());
    }

    /// Panics for windows starting at midnight.
    struct FragileBuilder(ScheduledGraphBuilder);

    impl FeedGraphBuilder for FragileBuilder {
        fn build(&self, input: &BuilderInput<'_>) -> Result<RawGraph, BuilderError> {
            if input.window.wall_clock().0 == 0 {
                panic!("fragile builder");
            }
            self.0.build(input)
        }
    }

    #[tokio::test]
    async fn panicking_window_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = Compiler::with_builder(
            CompilerConfig::default(),
            FragileBuilder(ScheduledGraphBuilder::default()),
        );
        let driver = BatchDriver::new(compiler, BatchConfig::new(3));
        let windows = vec![
            WindowSpec::new("midnight", 0.0, 1.0),
            WindowSpec::new("morning", 8.0, 9.0),
        ];

        let report = driver
            .run(Arc::new(busy_feed()), date(2024, 3, 12), &windows, dir.path())
            .await;

        assert!(!report.outcomes[0].is_success());
        assert!(report.outcomes[1].is_success());
        assert_eq!(report.outcomes[1].result.as_ref().unwrap().edge_count, 1);
    }
}
