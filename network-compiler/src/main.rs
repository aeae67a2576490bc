use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use network_compiler::batch::{BatchConfig, BatchDriver, WindowSpec};
use network_compiler::compiler::{CompileRequest, Compiler};
use network_compiler::config::{
    CompilerConfig, DEFAULT_TRANSFER_PENALTY_SECONDS, DEFAULT_WALK_RADIUS_M, TransferStrategy,
    WalkTransfers,
};
use network_compiler::error::CompileError;
use network_compiler::feed::Feed;
use network_compiler::serialize::write_artifact;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transfers {
    /// Merge platforms of a station into one node
    Merge,
    /// Keep platforms apart and link them with penalty edges
    Explicit,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Batch {
    /// Peak, off-peak, evening and late-night periods
    Periods,
    /// Twenty-four one-hour windows
    Hourly,
}

/// Compile a transit feed into a station graph for one time window.
#[derive(Debug, Parser)]
#[command(name = "network-compiler", version)]
struct Args {
    /// Feed archive (zip)
    feed: PathBuf,

    /// Output file, or output directory with --batch
    #[arg(long, default_value = "network.json")]
    out: PathBuf,

    /// Window start hour
    #[arg(long, default_value_t = 7.0)]
    start: f64,

    /// Window end hour, may exceed 24
    #[arg(long, default_value_t = 9.0)]
    end: f64,

    /// Only keep these route short names (comma separated)
    #[arg(long, value_delimiter = ',')]
    lines: Option<Vec<String>>,

    /// Service date, defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// How platforms of one station are connected
    #[arg(long, value_enum, default_value_t = Transfers::Merge)]
    transfers: Transfers,

    /// Link stops of different stations closer than this many metres by
    /// walking; 0 disables
    #[arg(long, default_value_t = DEFAULT_WALK_RADIUS_M)]
    walk_radius: f64,

    /// Compile a set of windows instead of --start/--end
    #[arg(long, value_enum)]
    batch: Option<Batch>,

    /// Windows compiled at once with --batch
    #[arg(long, default_value_t = 4)]
    max_parallel: usize,
}

async fn run(args: Args) -> Result<bool, CompileError> {
    let mut feed = Feed::load(&args.feed)?;
    if let Some(lines) = &args.lines {
        feed.retain_lines(lines);
    }

    let transfers = match args.transfers {
        Transfers::Merge => TransferStrategy::Merge,
        Transfers::Explicit => TransferStrategy::ExplicitEdges {
            penalty_seconds: DEFAULT_TRANSFER_PENALTY_SECONDS,
        },
    };
    let walk = WalkTransfers {
        radius_m: args.walk_radius,
        ..WalkTransfers::default()
    };
    let config = CompilerConfig::default()
        .with_transfers(transfers)
        .with_walk_transfers(walk);
    let compiler = Compiler::new(config);
    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    match args.batch {
        None => {
            let request = CompileRequest::new(date, args.start, args.end);
            let artifact = compiler.compile(&feed, &request)?;
            write_artifact(&args.out, &artifact)?;
            Ok(true)
        }
        Some(batch) => {
            let windows = match batch {
                Batch::Periods => WindowSpec::day_periods(),
                Batch::Hourly => WindowSpec::hourly(),
            };
            let driver = BatchDriver::new(compiler, BatchConfig::new(args.max_parallel));
            let report = driver
                .run(Arc::new(feed), date, &windows, &args.out)
                .await;
            info!(
                succeeded = report.succeeded(),
                failed = report.failed(),
                out = %args.out.display(),
                "Batch finished"
            );
            Ok(report.succeeded() > 0)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("No window compiled successfully");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Compilation failed");
            ExitCode::FAILURE
        }
    }
}
