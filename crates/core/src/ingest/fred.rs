use crate::config::Settings;
use crate::error::{Upstream, UpstreamError};
use crate::ingest::provider::{build_http_client, join_url, send_json, FredClient};
use crate::ingest::types::{ObservationsResponse, SeriesObservation};
use anyhow::Result;
use chrono::NaiveDate;
use serde_json::Value;

const OBSERVATIONS_PATH: &str = "series/observations";

#[derive(Debug, Clone)]
pub struct HttpFredClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpFredClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            build_http_client(settings)?,
            settings.fred_base_url.clone(),
            settings.fred_api_key.clone(),
        ))
    }

    pub fn new(http: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    fn query(&self, series_id: &str, start: Option<NaiveDate>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("series_id", series_id.to_string()),
            ("file_type", "json".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        if let Some(start) = start {
            params.push(("observation_start", start.format("%Y-%m-%d").to_string()));
        }
        params
    }

    async fn get(&self, series_id: &str, start: Option<NaiveDate>) -> Result<Value> {
        let req = self
            .http
            .get(join_url(&self.base_url, OBSERVATIONS_PATH))
            .query(&self.query(series_id, start));

        tracing::debug!(series_id, ?start, "fetching FRED observations");
        send_json(req, Upstream::Fred, series_id).await
    }
}

#[async_trait::async_trait]
impl FredClient for HttpFredClient {
    fn provider_name(&self) -> &'static str {
        "fred"
    }

    async fn fetch_series_raw(&self, series_id: &str) -> Result<Value> {
        self.get(series_id, None).await
    }

    async fn fetch_observations(
        &self,
        series_id: &str,
        start: Option<NaiveDate>,
    ) -> Result<Vec<SeriesObservation>> {
        let raw = self.get(series_id, start).await?;
        let parsed = serde_json::from_value::<ObservationsResponse>(raw).map_err(|e| {
            UpstreamError::decode(
                Upstream::Fred,
                series_id,
                format!("unexpected observations shape: {e}"),
            )
        })?;
        Ok(parsed.observations)
    }
}
