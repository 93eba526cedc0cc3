//! Time-windowed alert event query against a source's proxy endpoint

use alert_history_common::{QueryResponse, RawSeriesResult, TimeWindow};
use async_trait::async_trait;
use serde::Serialize;

use crate::client::{ClientError, Result, SourceClient};
use crate::config::QueryConfig;

/// Outcome of an alert query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The backend returned a series for the window
    Series(RawSeriesResult),
    /// No alert events in the window
    Empty,
}

/// Issues the alert query for a window
#[async_trait]
pub trait AlertQueryClient: Send + Sync {
    async fn fetch(&self, proxy_url: &str, window: &TimeWindow) -> Result<QueryOutcome>;
}

#[derive(Debug, Serialize)]
struct ProxyRequest<'a> {
    query: String,
    db: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rp: Option<&'a str>,
}

/// Alert query through an InfluxDB-compatible proxy
#[derive(Clone, Debug)]
pub struct InfluxAlertQuery {
    client: SourceClient,
    config: QueryConfig,
}

impl InfluxAlertQuery {
    pub fn new(client: SourceClient, config: QueryConfig) -> Self {
        Self { client, config }
    }

    /// InfluxQL for alert events within `window`, newest first
    pub fn build_query(&self, window: &TimeWindow) -> String {
        format!(
            "SELECT host, value, level, alertName FROM \"{}\" WHERE time >= '{}' AND time <= '{}' ORDER BY time desc",
            escape(&self.config.measurement, '"'),
            escape(&window.lower, '\''),
            escape(&window.upper, '\''),
        )
    }
}

#[async_trait]
impl AlertQueryClient for InfluxAlertQuery {
    async fn fetch(&self, proxy_url: &str, window: &TimeWindow) -> Result<QueryOutcome> {
        let request = ProxyRequest {
            query: self.build_query(window),
            db: &self.config.database,
            rp: self.config.retention_policy.as_deref(),
        };
        tracing::debug!(lower = %window.lower, upper = %window.upper, db = request.db, "Querying alert history");

        let response: QueryResponse = self.client.post(proxy_url, &request).await.map_err(|e| {
            tracing::warn!(window = %window, timed_out = e.is_timeout(), "Alert query failed: {}", e);
            e
        })?;

        if let Some(error) = response.first_error() {
            tracing::warn!("Alert query rejected: {}", error);
            return Err(ClientError::Statement(error.to_string()));
        }

        match response.first_series() {
            Some(series) => {
                tracing::debug!(
                    series = response.results[0].series.len(),
                    rows = series.values.len(),
                    "Alert query returned"
                );
                Ok(QueryOutcome::Series(series.clone()))
            }
            None => {
                tracing::debug!("Alert query returned no series");
                Ok(QueryOutcome::Empty)
            }
        }
    }
}

fn escape(raw: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == quote || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
