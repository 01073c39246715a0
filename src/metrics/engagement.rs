//! Community engagement from search interest
//!
//! Talks to the public Google Trends web endpoints:
//!
//! 1. `GET /?geo=..` to pick up session cookies
//! 2. `GET /trends/api/explore` to obtain the TIMESERIES widget token
//! 3. `GET /trends/api/widgetdata/multiline` for the interest-over-time points
//!
//! Responses carry an anti-XSSI prefix (`)]}'`) that is stripped before
//! parsing. Engagement is the mean of the keyword's series; an empty series
//! or any failure reads as the fallback of 50.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{FetchError, MetricSource};

/// Fallback engagement when the trends query fails or is empty.
pub const ENGAGEMENT_FALLBACK: f64 = 50.0;

const TIMESERIES_WIDGET: &str = "TIMESERIES";

/// Trends query configuration
#[derive(Debug, Clone)]
pub struct TrendsConfig {
    /// Trends host, without trailing slash
    pub base_url: String,
    /// Keyword whose interest is averaged
    pub keyword: String,
    /// Trends timeframe expression
    pub timeframe: String,
    /// Host language
    pub hl: String,
    /// Timezone offset in minutes
    pub tz: i32,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://trends.google.com".to_string(),
            keyword: "Catholic Church".to_string(),
            timeframe: "today 1-m".to_string(),
            hl: "en-US".to_string(),
            tz: 360,
        }
    }
}

impl TrendsConfig {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Country code used for cookie priming, taken from the language tag.
    fn geo(&self) -> &str {
        self.hl.rsplit('-').next().unwrap_or("US")
    }

    fn explore_request(&self) -> serde_json::Value {
        json!({
            "comparisonItem": [{
                "keyword": self.keyword,
                "time": self.timeframe,
                "geo": "",
            }],
            "category": 0,
            "property": "",
        })
    }
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    id: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    request: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: Timeline,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    value: Vec<f64>,
}

/// Drop the anti-XSSI prefix that precedes the JSON body.
pub fn strip_xssi(body: &str) -> &str {
    match body.find(|c: char| c == '{' || c == '[') {
        Some(start) if body[..start].contains(")]}'") => &body[start..],
        _ => body.trim_start(),
    }
}

/// Parse a multiline widget response into the keyword's interest series.
pub fn parse_interest_series(body: &str) -> Result<Vec<f64>, FetchError> {
    let response: MultilineResponse =
        serde_json::from_str(strip_xssi(body)).map_err(|e| FetchError::Parse(e.to_string()))?;

    Ok(response
        .default
        .timeline_data
        .into_iter()
        .filter_map(|point| point.value.first().copied())
        .collect())
}

/// Arithmetic mean, `None` for an empty series.
pub fn mean(series: &[f64]) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    Some(series.iter().sum::<f64>() / series.len() as f64)
}

/// Community engagement source backed by Google Trends.
pub struct TrendsSource {
    client: Client,
    config: TrendsConfig,
}

impl TrendsSource {
    pub fn new(config: TrendsConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("stability-oracle/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Fetch the interest-over-time series for the configured keyword.
    pub async fn interest_over_time(&self) -> Result<Vec<f64>, FetchError> {
        self.prime_cookies().await;

        let widget = self.timeseries_widget().await?;
        let token = widget
            .token
            .ok_or_else(|| FetchError::MissingToken(TIMESERIES_WIDGET.to_string()))?;

        let url = self.config.url("/trends/api/widgetdata/multiline");
        let body = self
            .get_text(&url, &[("req", widget.request.to_string()), ("token", token)])
            .await?;

        parse_interest_series(&body)
    }

    /// Cookie priming failures are not fatal; the data calls report their own errors.
    async fn prime_cookies(&self) {
        let url = self.config.url("/");
        if let Err(e) = self
            .client
            .get(&url)
            .query(&[("geo", self.config.geo())])
            .send()
            .await
        {
            debug!(error = %e, "Trends cookie request failed");
        }
    }

    async fn timeseries_widget(&self) -> Result<Widget, FetchError> {
        let url = self.config.url("/trends/api/explore");
        let body = self
            .get_text(&url, &[("req", self.config.explore_request().to_string())])
            .await?;

        let explore: ExploreResponse =
            serde_json::from_str(strip_xssi(&body)).map_err(|e| FetchError::Parse(e.to_string()))?;

        explore
            .widgets
            .into_iter()
            .find(|w| w.id == TIMESERIES_WIDGET)
            .ok_or_else(|| FetchError::MissingWidget(TIMESERIES_WIDGET.to_string()))
    }

    async fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String, FetchError> {
        debug!(url = %url, "Trends request");

        let response = self
            .client
            .get(url)
            .query(&[("hl", self.config.hl.clone()), ("tz", self.config.tz.to_string())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetricSource for TrendsSource {
    fn name(&self) -> &str {
        "community_engagement"
    }

    fn fallback(&self) -> f64 {
        ENGAGEMENT_FALLBACK
    }

    async fn fetch(&self) -> Result<f64, FetchError> {
        let series = self.interest_over_time().await?;
        let engagement =
            mean(&series).ok_or_else(|| FetchError::EmptySeries(self.config.keyword.clone()))?;

        info!(
            keyword = %self.config.keyword,
            timeframe = %self.config.timeframe,
            points = series.len(),
            engagement,
            "Community engagement computed"
        );

        Ok(engagement)
    }
}
