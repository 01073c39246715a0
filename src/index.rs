//! Stability index calculation
//!
//! Pure arithmetic over the two metric readings. Both inputs are clamped to
//! the 0-100 percentage range before weighting, so the result always lands
//! in [0, 100] regardless of what the fetchers produced.

/// Weight applied to the financial health metric.
pub const FINANCIAL_WEIGHT: f64 = 0.6;

/// Weight applied to the community engagement metric.
pub const ENGAGEMENT_WEIGHT: f64 = 0.4;

/// Fixed-point scale used by the oracle contract (4 decimal places).
pub const ORACLE_SCALE: f64 = 1e4;

const METRIC_MIN: f64 = 0.0;
const METRIC_MAX: f64 = 100.0;

/// Composite stability index in the range [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct StabilityIndex(f64);

impl StabilityIndex {
    /// Raw index value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Integer representation published on-chain: `round(index * 10^4)`.
    pub fn scaled(&self) -> u64 {
        // value is clamped to [0, 100] so the product fits comfortably in u64
        (self.0 * ORACLE_SCALE).round() as u64
    }
}

impl std::fmt::Display for StabilityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Clamp a metric into the percentage range. NaN counts as the lower bound.
pub fn normalize(metric: f64) -> f64 {
    if metric.is_nan() {
        return METRIC_MIN;
    }
    metric.clamp(METRIC_MIN, METRIC_MAX)
}

/// Combine financial health and community engagement into the stability index.
pub fn compute_index(financial_health: f64, community_engagement: f64) -> StabilityIndex {
    let financial = normalize(financial_health);
    let engagement = normalize(community_engagement);

    StabilityIndex(FINANCIAL_WEIGHT * financial + ENGAGEMENT_WEIGHT * engagement)
}
