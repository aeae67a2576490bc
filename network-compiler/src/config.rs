//! Compiler configuration.

/// How platforms of the same station are connected in the output graph.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TransferStrategy {
    /// Platforms sharing a station name are merged into one node. No
    /// transfer edges are needed.
    #[default]
    Merge,

    /// Platforms stay distinct nodes. Every ordered pair of same-name
    /// platforms without a direct edge gets one with a fixed penalty.
    ExplicitEdges { penalty_seconds: u64 },
}

/// Walking links imputed between nearby stops of different stations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkTransfers {
    /// Stops at most this far apart, in metres, are linked. Zero disables
    /// imputation.
    pub radius_m: f64,

    /// Walking speed in km/h.
    pub speed_kmph: f64,
}

impl WalkTransfers {
    pub fn new(radius_m: f64, speed_kmph: f64) -> Self {
        Self {
            radius_m,
            speed_kmph,
        }
    }

    /// No walking links at all.
    pub fn disabled() -> Self {
        Self::new(0.0, DEFAULT_WALK_SPEED_KMPH)
    }

    pub fn is_enabled(&self) -> bool {
        self.radius_m.is_finite()
            && self.radius_m > 0.0
            && self.speed_kmph.is_finite()
            && self.speed_kmph > 0.0
    }

    /// Time to walk `metres`, in seconds.
    pub fn seconds_for(&self, metres: f64) -> f64 {
        metres / (self.speed_kmph / 3.6)
    }
}

impl Default for WalkTransfers {
    fn default() -> Self {
        Self::new(DEFAULT_WALK_RADIUS_M, DEFAULT_WALK_SPEED_KMPH)
    }
}

/// Configuration parameters for graph compilation.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Windows starting before this hour also pull in services of the
    /// previous calendar date (trips still running after midnight).
    pub prior_day_cutoff_hour: f64,

    /// Start of the deep-night range, in hours. Windows lying entirely in
    /// `[deep_night_start_hour, deep_night_end_hour)` drop metro trips.
    pub deep_night_start_hour: f64,

    /// End of the deep-night range, in hours (exclusive).
    pub deep_night_end_hour: f64,

    /// How same-station platforms are connected.
    pub transfers: TransferStrategy,

    /// Decimal places used when matching nodes to stops by coordinates.
    /// Four places is roughly 11 metres.
    pub coordinate_precision: u32,

    /// Prefix of raw node ids generated by the default graph builder.
    pub node_prefix: String,

    /// Walking links added by the default graph builder.
    pub walk_transfers: WalkTransfers,
}

impl CompilerConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        prior_day_cutoff_hour: f64,
        deep_night_start_hour: f64,
        deep_night_end_hour: f64,
        transfers: TransferStrategy,
        coordinate_precision: u32,
        node_prefix: impl Into<String>,
    ) -> Self {
        Self {
            prior_day_cutoff_hour,
            deep_night_start_hour,
            deep_night_end_hour,
            transfers,
            coordinate_precision,
            node_prefix: node_prefix.into(),
            walk_transfers: WalkTransfers::default(),
        }
    }

    /// Returns a copy using the given transfer strategy.
    pub fn with_transfers(mut self, transfers: TransferStrategy) -> Self {
        self.transfers = transfers;
        self
    }

    /// Returns a copy using the given walking links.
    pub fn with_walk_transfers(mut self, walk_transfers: WalkTransfers) -> Self {
        self.walk_transfers = walk_transfers;
        self
    }

    /// The deep-night range in seconds since midnight.
    pub fn deep_night_seconds(&self) -> (u32, u32) {
        (
            crate::domain::hours_to_seconds(self.deep_night_start_hour),
            crate::domain::hours_to_seconds(self.deep_night_end_hour),
        )
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            prior_day_cutoff_hour: 5.0,
            deep_night_start_hour: 1.0,
            deep_night_end_hour: 4.0,
            transfers: TransferStrategy::Merge,
            coordinate_precision: 4,
            node_prefix: "feed".to_string(),
            walk_transfers: WalkTransfers::default(),
        }
    }
}

/// Transfer penalty used when explicit transfer edges are requested
/// without a specific value (2 minutes).
pub const DEFAULT_TRANSFER_PENALTY_SECONDS: u64 = 120;

/// Default walking radius between stops, in metres.
pub const DEFAULT_WALK_RADIUS_M: f64 = 150.0;

/// Default walking speed, in km/h.
pub const DEFAULT_WALK_SPEED_KMPH: f64 = 4.5;
