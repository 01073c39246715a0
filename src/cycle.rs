//! One stability index update
//!
//! Reads both metrics in order, combines them and publishes the result.
//! Readings are plain values passed along; nothing is kept between cycles.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::index::{compute_index, StabilityIndex};
use crate::metrics::{MetricSource, Reading};
use crate::oracle::{OraclePublisher, PublishOutcome};

/// What happened during one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub financial: Reading,
    pub engagement: Reading,
    pub index: StabilityIndex,
    pub publication: PublishOutcome,
}

/// Fetch, combine and publish, in that order.
pub struct UpdateCycle {
    financial: Arc<dyn MetricSource>,
    engagement: Arc<dyn MetricSource>,
    publisher: OraclePublisher,
    dry_run: bool,
}

impl UpdateCycle {
    pub fn new(
        financial: Arc<dyn MetricSource>,
        engagement: Arc<dyn MetricSource>,
        publisher: OraclePublisher,
    ) -> Self {
        Self {
            financial,
            engagement,
            publisher,
            dry_run: false,
        }
    }

    /// Skip the transaction and only log the value that would be sent.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one full update. Always completes; failures show up in the report.
    pub async fn run(&self) -> CycleReport {
        info!(started_at = %Utc::now().to_rfc3339(), "Updating stability index");

        let financial = read_metric(self.financial.as_ref()).await;
        let engagement = read_metric(self.engagement.as_ref()).await;

        let index = compute_index(financial.value(), engagement.value());
        info!(
            index = index.value(),
            scaled = index.scaled(),
            financial = financial.value(),
            engagement = engagement.value(),
            "Calculated stability index"
        );

        let publication = if self.dry_run {
            warn!(scaled = index.scaled(), "Dry run, not publishing");
            PublishOutcome::Skipped {
                scaled: index.scaled(),
            }
        } else {
            self.publisher.publish(index).await
        };

        CycleReport {
            financial,
            engagement,
            index,
            publication,
        }
    }
}

async fn read_metric(source: &dyn MetricSource) -> Reading {
    let reading = source.read().await;

    match &reading {
        Reading::Measured(value) => {
            info!(metric = source.name(), value, "Metric measured");
        }
        Reading::Defaulted { value, reason } => {
            error!(
                metric = source.name(),
                fallback = value,
                reason = %reason,
                "Error fetching metric, using fallback"
            );
        }
    }

    reading
}
