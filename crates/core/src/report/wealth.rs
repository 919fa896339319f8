use crate::config::Settings;
use crate::ingest::provider::FredClient;
use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;

pub const WEALTH_CACHE_MAX_AGE_SECS: u32 = 43_200;

pub struct WealthReport {
    client: Arc<dyn FredClient>,
    series_id: String,
}

impl WealthReport {
    pub fn new(client: Arc<dyn FredClient>, settings: &Settings) -> Self {
        Self {
            client,
            series_id: settings.wealth_series_id.clone(),
        }
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub async fn run(&self) -> Result<Value> {
        tracing::info!(
            series_id = %self.series_id,
            provider = self.client.provider_name(),
            "wealth passthrough"
        );
        self.client
            .fetch_series_raw(&self.series_id)
            .await
            .with_context(|| format!("fetching wealth series {}", self.series_id))
    }
}
