//! Financial health from nonprofit filings
//!
//! Reads the organization record from the ProPublica Nonprofit Explorer API
//! and derives an operating margin from the most recent filing:
//!
//! ```text
//! health = (totrevenue - totfuncexpns) / totrevenue * 100
//! ```
//!
//! Non-positive revenue gives 0. Any fetch or parse failure, or an
//! organization without filings, reads as the fallback of 0.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{FetchError, MetricSource};

/// Fallback financial health when filings are unavailable.
pub const FINANCIAL_FALLBACK: f64 = 0.0;

/// Filings API configuration
#[derive(Debug, Clone)]
pub struct FilingsConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Employer Identification Number of the organization
    pub ein: String,
}

impl FilingsConfig {
    /// Organization endpoint for the configured EIN.
    pub fn organization_url(&self) -> String {
        format!(
            "{}/organizations/{}.json",
            self.base_url.trim_end_matches('/'),
            self.ein
        )
    }
}

impl Default for FilingsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://projects.propublica.org/nonprofits/api/v2".to_string(),
            ein: String::new(),
        }
    }
}

/// Organization payload, reduced to the fields we use.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationFilings {
    #[serde(default)]
    pub filings_with_data: Option<Vec<Filing>>,
}

/// One annual filing. Totals may be missing or null in older records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filing {
    #[serde(default)]
    pub totrevenue: Option<f64>,
    #[serde(default)]
    pub totfuncexpns: Option<f64>,
}

impl Filing {
    pub fn revenue(&self) -> f64 {
        self.totrevenue.unwrap_or(0.0)
    }

    pub fn expenses(&self) -> f64 {
        self.totfuncexpns.unwrap_or(0.0)
    }
}

/// Operating margin as a percentage; 0 when revenue is not positive.
pub fn financial_health(revenue: f64, expenses: f64) -> f64 {
    if revenue > 0.0 {
        (revenue - expenses) / revenue * 100.0
    } else {
        0.0
    }
}

/// Financial health source backed by the filings API.
pub struct FilingsSource {
    client: Client,
    config: FilingsConfig,
}

impl FilingsSource {
    pub fn new(config: FilingsConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("stability-oracle/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Fetch the most recent filing for the organization.
    pub async fn latest_filing(&self) -> Result<Filing, FetchError> {
        let url = self.config.organization_url();
        debug!(url = %url, "Fetching filings");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let organization: OrganizationFilings =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        organization
            .filings_with_data
            .and_then(|filings| filings.into_iter().next())
            .ok_or_else(|| FetchError::NoFilings(self.config.ein.clone()))
    }
}

#[async_trait]
impl MetricSource for FilingsSource {
    fn name(&self) -> &str {
        "financial_health"
    }

    fn fallback(&self) -> f64 {
        FINANCIAL_FALLBACK
    }

    async fn fetch(&self) -> Result<f64, FetchError> {
        let filing = self.latest_filing().await?;
        let health = financial_health(filing.revenue(), filing.expenses());

        info!(
            ein = %self.config.ein,
            revenue = filing.revenue(),
            expenses = filing.expenses(),
            health,
            "Financial health computed"
        );

        Ok(health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_financial_health_margin() {
        assert!((financial_health(1_000_000.0, 800_000.0) - 20.0).abs() < 1e-9);
        assert!((financial_health(500.0, 500.0)).abs() < 1e-9);
        // Deficits produce negative health; the index clamps it later
        assert!((financial_health(100.0, 150.0) + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_financial_health_non_positive_revenue() {
        assert_eq!(financial_health(0.0, 800_000.0), 0.0);
        assert_eq!(financial_health(-10.0, 5.0), 0.0);
    }

    #[test]
    fn test_parse_organization_payload() {
        let body = r#"{
            "organization": {"ein": 123456789, "name": "Example"},
            "filings_with_data": [
                {"tax_prd_yr": 2022, "totrevenue": 1000000, "totfuncexpns": 800000},
                {"tax_prd_yr": 2021, "totrevenue": 900000, "totfuncexpns": 950000}
            ]
        }"#;

        let org: OrganizationFilings = serde_json::from_str(body).unwrap();
        let latest = org.filings_with_data.unwrap().into_iter().next().unwrap();
        assert_eq!(latest.revenue(), 1_000_000.0);
        assert_eq!(latest.expenses(), 800_000.0);
    }

    #[test]
    fn test_parse_missing_and_null_fields() {
        let org: OrganizationFilings = serde_json::from_str(r#"{"organization": {}}"#).unwrap();
        assert!(org.filings_with_data.is_none());

        let org: OrganizationFilings =
            serde_json::from_str(r#"{"filings_with_data": null}"#).unwrap();
        assert!(org.filings_with_data.is_none());

        let filing: Filing = serde_json::from_str(r#"{"totrevenue": null}"#).unwrap();
        assert_eq!(filing.revenue(), 0.0);
        assert_eq!(filing.expenses(), 0.0);
    }

    #[test]
    fn test_organization_url() {
        let config = FilingsConfig {
            base_url: "http://localhost:9000/api/v2/".to_string(),
            ein: "530196605".to_string(),
        };
        assert_eq!(
            config.organization_url(),
            "http://localhost:9000/api/v2/organizations/530196605.json"
        );
    }
}
