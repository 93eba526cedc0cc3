//! Common test utilities and helpers

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alert_history::capability::CapabilityProbe;
use alert_history::client::{ClientError, Result};
use alert_history::query::{AlertQueryClient, QueryOutcome};
use alert_history_common::{RawSeriesResult, Source, SourceLinks, TimeWindow};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::oneshot;

pub const KAPACITORS_PATH: &str = "/chronograf/v1/sources/1/kapacitors";
pub const PROXY_PATH: &str = "/chronograf/v1/sources/1/proxy";

pub fn test_source() -> Source {
    Source {
        id: "1".to_string(),
        name: "Influx 1".to_string(),
        source_type: Some("influx-enterprise".to_string()),
        links: SourceLinks {
            proxy: PROXY_PATH.to_string(),
            kapacitors: KAPACITORS_PATH.to_string(),
        },
    }
}

pub fn window(lower: &str) -> TimeWindow {
    TimeWindow::new(lower, "2024-03-01T12:00:00Z")
}

pub fn alert_columns() -> Vec<String> {
    ["time", "host", "value", "level", "alertName"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Series with `rows` alerts; host names carry the row index
pub fn alert_series(rows: usize) -> RawSeriesResult {
    RawSeriesResult {
        name: Some("alerts".to_string()),
        columns: alert_columns(),
        values: (0..rows)
            .map(|i| {
                vec![
                    json!(format!("2024-03-01T11:{:02}:00Z", i)),
                    json!(format!("host-{}", i)),
                    json!(i * 10),
                    json!("CRITICAL"),
                    json!("cpu_high"),
                ]
            })
            .collect(),
    }
}

/// Proxy response body wrapping a series
pub fn query_body(series: &RawSeriesResult) -> Value {
    json!({"results": [{"statement_id": 0, "series": [series]}]})
}

/// Probe returning a fixed answer and counting calls
pub struct ScriptedProbe {
    answer: std::result::Result<bool, u16>,
    pub calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn available() -> Self {
        Self { answer: Ok(true), calls: AtomicUsize::new(0) }
    }

    pub fn unavailable() -> Self {
        Self { answer: Ok(false), calls: AtomicUsize::new(0) }
    }

    pub fn failing(status: u16) -> Self {
        Self { answer: Err(status), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityProbe for ScriptedProbe {
    async fn probe(&self, _source: &Source) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.map_err(|status| ClientError::Api {
            status,
            message: "probe failed".to_string(),
        })
    }
}

/// Query that answers every call with the same outcome and records windows
pub struct RecordingQuery {
    outcome: QueryOutcome,
    pub windows: Mutex<Vec<TimeWindow>>,
}

impl RecordingQuery {
    pub fn new(outcome: QueryOutcome) -> Self {
        Self { outcome, windows: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<TimeWindow> {
        self.windows.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertQueryClient for RecordingQuery {
    async fn fetch(&self, _proxy_url: &str, window: &TimeWindow) -> Result<QueryOutcome> {
        self.windows.lock().unwrap().push(window.clone());
        Ok(self.outcome.clone())
    }
}

/// Query whose responses are released by the test, keyed by window lower bound
#[derive(Default)]
pub struct GatedQuery {
    gates: Mutex<HashMap<String, oneshot::Receiver<QueryOutcome>>>,
    pub started: AtomicUsize,
}

impl GatedQuery {
    /// Register a gate for `lower`; send on the returned sender to complete the call
    pub fn gate(&self, lower: &str) -> oneshot::Sender<QueryOutcome> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(lower.to_string(), rx);
        tx
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertQueryClient for GatedQuery {
    async fn fetch(&self, _proxy_url: &str, window: &TimeWindow) -> Result<QueryOutcome> {
        let gate = self.gates.lock().unwrap().remove(&window.lower);
        self.started.fetch_add(1, Ordering::SeqCst);

        match gate {
            Some(rx) => rx.await.map_err(|_| ClientError::Api {
                status: 499,
                message: "gate dropped".to_string(),
            }),
            None => Ok(QueryOutcome::Empty),
        }
    }
}

/// Capability check that panics instead of answering
pub struct PanickingCapability;

#[async_trait]
impl CapabilityProbe for PanickingCapability {
    async fn probe(&self, _source: &Source) -> Result<bool> {
        panic!("capability check blew up");
    }
}

/// Query that panics on every call
pub struct PanickingQuery;

#[async_trait]
impl AlertQueryClient for PanickingQuery {
    async fn fetch(&self, _proxy_url: &str, _window: &TimeWindow) -> Result<QueryOutcome> {
        panic!("alert query blew up");
    }
}
