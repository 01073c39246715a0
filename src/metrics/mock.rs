//! Mock metric source for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

use super::{FetchError, MetricSource};

/// Scripted metric source.
///
/// Returns the same result on every fetch and counts calls.
pub struct MockSource {
    name: String,
    fallback: f64,
    result: Result<f64, FetchError>,
    call_count: AtomicU32,
}

impl MockSource {
    /// Source that always measures `value`.
    pub fn measuring(name: impl Into<String>, fallback: f64, value: f64) -> Self {
        Self {
            name: name.into(),
            fallback,
            result: Ok(value),
            call_count: AtomicU32::new(0),
        }
    }

    /// Source whose fetch always fails with `error`.
    pub fn failing(name: impl Into<String>, fallback: f64, error: FetchError) -> Self {
        Self {
            name: name.into(),
            fallback,
            result: Err(error),
            call_count: AtomicU32::new(0),
        }
    }

    /// Number of fetches so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fallback(&self) -> f64 {
        self.fallback
    }

    async fn fetch(&self) -> Result<f64, FetchError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}
