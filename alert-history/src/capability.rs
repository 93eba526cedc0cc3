//! Detection of an alerting engine behind a source

use alert_history_common::{KapacitorSummary, KapacitorsResponse, Source};
use async_trait::async_trait;

use crate::client::{Result, SourceClient};

/// Answers whether alert history can be queried for a source
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    async fn probe(&self, source: &Source) -> Result<bool>;
}

/// Probe that lists the alerting engines configured for the source
#[derive(Clone, Debug)]
pub struct KapacitorProbe {
    client: SourceClient,
}

impl KapacitorProbe {
    pub fn new(client: SourceClient) -> Self {
        Self { client }
    }

    /// Fetch the configured alerting engines
    pub async fn list(&self, source: &Source) -> Result<Vec<KapacitorSummary>> {
        let response: KapacitorsResponse = self.client.get(&source.links.kapacitors).await?;
        Ok(response.kapacitors)
    }
}

#[async_trait]
impl CapabilityProbe for KapacitorProbe {
    async fn probe(&self, source: &Source) -> Result<bool> {
        tracing::debug!(
            source_id = %source.id,
            source_type = source.source_type.as_deref().unwrap_or("influx"),
            "Probing for alerting engine"
        );

        let kapacitors = self.list(source).await.map_err(|e| {
            tracing::warn!(source_id = %source.id, timed_out = e.is_timeout(), "Alerting engine probe failed: {}", e);
            e
        })?;

        match kapacitors.first() {
            Some(first) => {
                tracing::info!(
                    source_id = %source.id,
                    kapacitor = first.name.as_deref().unwrap_or("unnamed"),
                    url = first.url.as_deref().unwrap_or(""),
                    count = kapacitors.len(),
                    "Alerting engine available"
                );
                Ok(true)
            }
            None => {
                tracing::info!(source_id = %source.id, "No alerting engine configured");
                Ok(false)
            }
        }
    }
}
