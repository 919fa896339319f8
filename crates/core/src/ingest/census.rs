use crate::config::Settings;
use crate::error::{Upstream, UpstreamError};
use crate::ingest::provider::{build_http_client, join_url, send_json, CensusClient};
use crate::ingest::types::CensusTable;
use anyhow::Result;

pub const NAME_COLUMN: &str = "NAME";
pub const MEDIAN_INCOME_COLUMN: &str = "B19013_001E";
pub const AGGREGATE_INCOME_COLUMN: &str = "B19025_001E";
pub const GINI_INDEX_COLUMN: &str = "B19083_001E";

#[derive(Debug, Clone)]
pub struct HttpCensusClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpCensusClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            build_http_client(settings)?,
            settings.census_base_url.clone(),
            settings.census_api_key.clone(),
        ))
    }

    pub fn new(http: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let columns = [
            NAME_COLUMN,
            MEDIAN_INCOME_COLUMN,
            AGGREGATE_INCOME_COLUMN,
            GINI_INDEX_COLUMN,
        ]
        .join(",");
        let mut params = vec![("get", columns), ("for", "state:*".to_string())];
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        params
    }
}

#[async_trait::async_trait]
impl CensusClient for HttpCensusClient {
    fn provider_name(&self) -> &'static str {
        "census_acs1"
    }

    async fn fetch_state_income(&self, year: i32) -> Result<CensusTable> {
        let target = year.to_string();
        let url = join_url(&self.base_url, &format!("{year}/acs/acs1"));
        let req = self.http.get(url).query(&self.query());

        tracing::debug!(year, "fetching census state rows");
        let raw = send_json(req, Upstream::Census, &target).await?;

        let rows = serde_json::from_value::<Vec<Vec<Option<String>>>>(raw).map_err(|e| {
            UpstreamError::decode(Upstream::Census, &target, format!("unexpected table shape: {e}"))
        })?;
        CensusTable::from_rows(rows)
            .map_err(|e| UpstreamError::decode(Upstream::Census, &target, e.to_string()).into())
    }
}
