//! Metric sources
//!
//! Each source fetches one external signal and turns it into a percentage.
//! Sources never fail outright: a failed fetch yields a [`Reading::Defaulted`]
//! carrying the source's fallback value and the reason, and the cycle
//! decides how to log it.
//!
//! - [`financial::FilingsSource`] - nonprofit filings (fallback 0)
//! - [`engagement::TrendsSource`] - search interest over time (fallback 50)
//! - [`mock::MockSource`] - scripted source for tests

pub mod engagement;
pub mod financial;
pub mod mock;

use async_trait::async_trait;

pub use engagement::{TrendsConfig, TrendsSource};
pub use financial::{FilingsConfig, FilingsSource};
pub use mock::MockSource;

/// Errors raised while fetching a metric.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No filings with data for organization {0}")]
    NoFilings(String),

    #[error("Empty interest series for keyword '{0}'")]
    EmptySeries(String),

    #[error("Trends response has no {0} widget")]
    MissingWidget(String),

    #[error("Trends {0} widget has no token")]
    MissingToken(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Parse(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Outcome of reading one metric.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// Value derived from fetched data
    Measured(f64),
    /// Fetch failed; the source's fallback value stands in
    Defaulted { value: f64, reason: String },
}

impl Reading {
    /// The value to feed into the index, measured or not.
    pub fn value(&self) -> f64 {
        match self {
            Reading::Measured(v) => *v,
            Reading::Defaulted { value, .. } => *value,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Reading::Defaulted { .. })
    }
}

/// A single external signal feeding the stability index.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Short metric name used in logs.
    fn name(&self) -> &str;

    /// Value used when the fetch fails.
    fn fallback(&self) -> f64;

    /// Fetch and derive the metric.
    async fn fetch(&self) -> Result<f64, FetchError>;

    /// Fetch, substituting the fallback on failure.
    async fn read(&self) -> Reading {
        match self.fetch().await {
            Ok(value) => Reading::Measured(value),
            Err(e) => Reading::Defaulted {
                value: self.fallback(),
                reason: e.to_string(),
            },
        }
    }
}
