use crate::config::Settings;
use crate::error::{Upstream, UpstreamError};
use crate::ingest::types::{CensusTable, SeriesObservation};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;

#[async_trait::async_trait]
pub trait CensusClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// One ACS 1-year release, one row per state.
    async fn fetch_state_income(&self, year: i32) -> Result<CensusTable>;
}

#[async_trait::async_trait]
pub trait FredClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_series_raw(&self, series_id: &str) -> Result<Value>;

    async fn fetch_observations(
        &self,
        series_id: &str,
        start: Option<NaiveDate>,
    ) -> Result<Vec<SeriesObservation>>;
}

pub fn build_http_client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(settings.upstream_timeout)
        .build()
        .context("failed to build upstream http client")
}

/// Non-2xx statuses and non-JSON bodies become [`UpstreamError`]s carrying the body.
pub(crate) async fn send_json(
    req: reqwest::RequestBuilder,
    upstream: Upstream,
    target: &str,
) -> Result<Value> {
    let res = req
        .send()
        .await
        .map_err(|e| UpstreamError::request(upstream, target, e))?;

    let status = res.status();
    let text = res
        .text()
        .await
        .map_err(|e| UpstreamError::request(upstream, target, e))?;

    if !status.is_success() {
        return Err(UpstreamError::status(upstream, target, status, text).into());
    }

    serde_json::from_str::<Value>(&text).map_err(|e| {
        let mut err = UpstreamError::decode(upstream, target, format!("response is not JSON: {e}"));
        err.body = Some(text);
        err.into()
    })
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
