//! Wire shapes returned by the time-series proxy and the alerting engine listing

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tabular series: named columns, row-oriented values
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawSeriesResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// Result of one statement within a query
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatementResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_id: Option<u64>,
    #[serde(default)]
    pub series: Vec<RawSeriesResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of a proxied query response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<StatementResult>,
}

impl QueryResponse {
    /// The first statement's first series, if it has any
    pub fn first_series(&self) -> Option<&RawSeriesResult> {
        self.results.first().and_then(|r| r.series.first())
    }

    /// The first statement's error, if the backend reported one
    pub fn first_error(&self) -> Option<&str> {
        self.results.first().and_then(|r| r.error.as_deref())
    }
}

/// Summary of a configured alerting engine
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KapacitorSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Body of the alerting engine listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KapacitorsResponse {
    #[serde(default)]
    pub kapacitors: Vec<KapacitorSummary>,
}
