//! Stability Oracle - periodic stability index publisher
//!
//! Computes a composite stability index for one organization from two
//! external signals and publishes it to an on-chain oracle contract.
//!
//! ## Pipeline
//!
//! ```text
//! Scheduler ──▶ Financial fetcher ──▶ Engagement fetcher
//!                                           │
//!          sleep ◀── Oracle publisher ◀── Index calculator
//! ```
//!
//! - **Financial**: nonprofit filings, (revenue - expenses) / revenue
//! - **Engagement**: mean search interest for a keyword over the past month
//! - **Index**: 0.6 * financial + 0.4 * engagement, both clamped to [0, 100]
//! - **Publisher**: `setStabilityIndex(round(index * 10^4))`
//!
//! Fetch and publish failures never escape a cycle; they degrade to a
//! default reading or a failed publication and the loop carries on.

pub mod config;
pub mod cycle;
pub mod index;
pub mod logging;
pub mod metrics;
pub mod oracle;
pub mod scheduler;

pub use config::{Args, ConfigError};
pub use cycle::{CycleReport, UpdateCycle};
pub use index::{compute_index, StabilityIndex};
pub use metrics::{FetchError, MetricSource, Reading};
pub use oracle::{OracleChain, OraclePublisher, PublishError, PublishOutcome};
pub use scheduler::Scheduler;
