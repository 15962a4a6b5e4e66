use serde::{Deserialize, Serialize};

/// Global knobs that tune the matching and dispatch engine.
///
/// All fields carry defaults so existing deployments can progressively
/// adopt new tuning options without supplying a full configuration
/// payload.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Proximity matching thresholds and confidence bands.
    pub matching: MatchConfig,
    /// Offer deadline for the assignment cascade.
    pub dispatch: DispatchConfig,
    /// Background sweep cadence and retention.
    pub sweep: SweepConfig,
}

/// Tuning for the table-detection ranker.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Minimum distance difference (meters) between the two closest
    /// candidates required to declare a confident single match.
    pub disambiguation_gap_m: f64,
    /// Positioning uncertainty assumed when a fix carries none.
    pub default_uncertainty_m: f64,
    /// Best-candidate distance (meters) up to which a confident match
    /// is reported as high confidence.
    pub high_band_m: f64,
    /// Upper bound of the medium confidence band; beyond it a match
    /// degrades to low confidence.
    pub medium_band_m: f64,
    /// Bounded preview of runner-up candidates attached to a match.
    pub max_alternates: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            disambiguation_gap_m: 3.0,
            default_uncertainty_m: 30.0,
            high_band_m: 10.0,
            medium_band_m: 20.0,
            max_alternates: 3,
        }
    }
}

/// Offer deadline tuning for the dispatch cascade.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// How long a candidate holds an offer before the cascade advances
    /// (milliseconds). The same value applies to every offer of a
    /// dispatch; it is not extended on partial activity.
    pub offer_deadline_ms: u64,
}

impl DispatchConfig {
    pub fn offer_deadline(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.offer_deadline_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            offer_deadline_ms: 10_000,
        }
    }
}

/// Escalation sweep cadence for stale offers and terminal records.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Sweep cadence for scanning stale offers (ms).
    pub sweep_interval_ms: u64,
    /// Extra slack past the offer deadline before a sweep forces an
    /// offer through expiry (ms).
    pub sweep_grace_ms: u64,
    /// How long terminal assignment records are retained before
    /// eviction (ms).
    pub terminal_retention_ms: u64,
}

impl SweepConfig {
    pub fn sweep_interval(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 60_000,
            sweep_grace_ms: 5_000,
            terminal_retention_ms: 300_000,
        }
    }
}
