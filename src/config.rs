//! Configuration for the stability oracle
//!
//! CLI arguments and environment variable handling using clap. A `.env`
//! file is loaded by `main` before parsing, so every option can live there.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use clap::{Parser, ValueEnum};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::metrics::{FilingsConfig, TrendsConfig};
use crate::oracle::{GasPolicy, ReceiptPolicy};

/// Thirty days, the default update cadence.
pub const DEFAULT_INTERVAL_SECS: u64 = 30 * 24 * 60 * 60;

/// Stability Oracle - publishes a composite stability index on-chain
#[derive(Parser, Debug, Clone)]
#[command(name = "stability-oracle")]
#[command(about = "Publishes a stability index from filings and search interest to an oracle")]
pub struct Args {
    /// Ethereum JSON-RPC endpoint
    #[arg(long, env = "ETH_NODE_URL")]
    pub rpc_url: String,

    /// Hex private key used to sign oracle updates
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: PrivateKey,

    /// Oracle contract address
    #[arg(long, env = "ORACLE_ADDRESS")]
    pub oracle_address: String,

    /// Employer Identification Number of the organization
    #[arg(long, env = "ORGANIZATION_EIN")]
    pub ein: String,

    /// Nonprofit filings API base URL
    #[arg(long, env = "FILINGS_API_URL", default_value = "https://projects.propublica.org/nonprofits/api/v2")]
    pub filings_api_url: String,

    /// Search trends host
    #[arg(long, env = "TRENDS_URL", default_value = "https://trends.google.com")]
    pub trends_url: String,

    /// Keyword whose search interest is averaged
    #[arg(long, env = "TRENDS_KEYWORD", default_value = "Catholic Church")]
    pub trends_keyword: String,

    /// Trends timeframe (past month by default)
    #[arg(long, env = "TRENDS_TIMEFRAME", default_value = "today 1-m")]
    pub trends_timeframe: String,

    /// Trends host language
    #[arg(long, env = "TRENDS_HL", default_value = "en-US")]
    pub trends_hl: String,

    /// Trends timezone offset in minutes
    #[arg(long, env = "TRENDS_TZ", default_value = "360", allow_negative_numbers = true)]
    pub trends_tz: i32,

    /// Gas limit for oracle updates
    #[arg(long, env = "GAS_LIMIT", default_value = "200000")]
    pub gas_limit: u64,

    /// Gas price for oracle updates, in gwei
    #[arg(long, env = "GAS_PRICE_GWEI", default_value = "50")]
    pub gas_price_gwei: u64,

    /// Seconds to wait for a transaction receipt
    #[arg(long, env = "RECEIPT_TIMEOUT_SECS", default_value = "120")]
    pub receipt_timeout_secs: u64,

    /// Receipt polling interval in milliseconds
    #[arg(long, env = "RECEIPT_POLL_MS", default_value = "1000")]
    pub receipt_poll_ms: u64,

    /// Seconds between update cycles
    #[arg(long, env = "UPDATE_INTERVAL_SECS", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval_secs: u64,

    /// Compute and log the index without sending a transaction
    #[arg(long, env = "DRY_RUN", default_value = "false")]
    pub dry_run: bool,

    /// Run a single cycle and exit
    #[arg(long, env = "RUN_ONCE", default_value = "false")]
    pub once: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Signing key, redacted in debug output and wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

impl FromStr for PrivateKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let digits = hex.strip_prefix("0x").unwrap_or(hex);

        if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidPrivateKey);
        }

        Ok(Self(hex.to_string()))
    }
}

/// Configuration errors, fatal at startup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("PRIVATE_KEY must be 32 bytes of hex")]
    InvalidPrivateKey,

    #[error("Invalid {name} URL '{value}': {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid ORACLE_ADDRESS '{0}'")]
    InvalidAddress(String),

    #[error("ORGANIZATION_EIN must not be empty")]
    MissingEin,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("RECEIPT_TIMEOUT_SECS must be at least RECEIPT_POLL_MS")]
    ReceiptTimeoutTooShort,
}

impl Args {
    /// Check everything that would otherwise fail later, mid-cycle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("ETH_NODE_URL", &self.rpc_url)?;
        check_url("FILINGS_API_URL", &self.filings_api_url)?;
        check_url("TRENDS_URL", &self.trends_url)?;

        self.oracle_address()?;

        if self.ein.trim().is_empty() {
            return Err(ConfigError::MissingEin);
        }
        if self.gas_limit == 0 {
            return Err(ConfigError::Zero("GAS_LIMIT"));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::Zero("UPDATE_INTERVAL_SECS"));
        }
        if self.receipt_poll_ms == 0 {
            return Err(ConfigError::Zero("RECEIPT_POLL_MS"));
        }
        if self.receipt_timeout_secs.saturating_mul(1000) < self.receipt_poll_ms {
            return Err(ConfigError::ReceiptTimeoutTooShort);
        }

        Ok(())
    }

    /// Parsed oracle contract address.
    pub fn oracle_address(&self) -> Result<Address, ConfigError> {
        self.oracle_address
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.oracle_address.clone()))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn gas_policy(&self) -> GasPolicy {
        GasPolicy {
            gas_limit: self.gas_limit,
            gas_price_gwei: self.gas_price_gwei,
        }
    }

    pub fn receipt_policy(&self) -> ReceiptPolicy {
        ReceiptPolicy {
            timeout: Duration::from_secs(self.receipt_timeout_secs),
            poll_interval: Duration::from_millis(self.receipt_poll_ms),
        }
    }

    pub fn filings_config(&self) -> FilingsConfig {
        FilingsConfig {
            base_url: self.filings_api_url.clone(),
            ein: self.ein.trim().to_string(),
        }
    }

    pub fn trends_config(&self) -> TrendsConfig {
        TrendsConfig {
            base_url: self.trends_url.clone(),
            keyword: self.trends_keyword.clone(),
            timeframe: self.trends_timeframe.clone(),
            hl: self.trends_hl.clone(),
            tz: self.trends_tz,
        }
    }
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    reqwest::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        })
}
