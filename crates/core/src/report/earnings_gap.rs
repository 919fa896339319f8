use crate::config::{EarningsSeriesIds, Settings};
use crate::domain::earnings_gap::{
    compute, default_start_date, project, EarningsInputs, GapFormat, GapRow,
};
use crate::ingest::provider::FredClient;
use crate::ingest::types::SeriesObservation;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

const DESCRIPTION: &str = "Mean weekly earnings (average hourly earnings x average weekly hours) \
compared with median usual weekly earnings. Annual figures are weekly figures x 52.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarningsGapRequest {
    pub start_date: NaiveDate,
    pub format: GapFormat,
}

impl Default for EarningsGapRequest {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            format: GapFormat::default(),
        }
    }
}

impl EarningsGapRequest {
    /// Blank values fall back to the defaults.
    pub fn parse(start_date: Option<&str>, format: Option<&str>) -> Result<Self> {
        let mut out = Self::default();
        if let Some(s) = start_date.map(str::trim).filter(|s| !s.is_empty()) {
            out.start_date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("startDate must be YYYY-MM-DD (got {s:?})"))?;
        }
        if let Some(f) = format.filter(|f| !f.trim().is_empty()) {
            out.format = f.parse()?;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMetadata {
    pub mean_hourly_earnings: String,
    pub average_weekly_hours: String,
    pub median_weekly_earnings: String,
}

impl From<&EarningsSeriesIds> for SeriesMetadata {
    fn from(ids: &EarningsSeriesIds) -> Self {
        Self {
            mean_hourly_earnings: ids.hourly_earnings.clone(),
            average_weekly_hours: ids.weekly_hours.clone(),
            median_weekly_earnings: ids.median_weekly_earnings.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsGapMetadata {
    pub series: SeriesMetadata,
    pub description: &'static str,
    pub format: GapFormat,
    pub start_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub skipped_observations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EarningsGapResponse {
    pub metadata: EarningsGapMetadata,
    pub data: Vec<GapRow>,
}

pub struct EarningsGapReport {
    client: Arc<dyn FredClient>,
    series: EarningsSeriesIds,
}

impl EarningsGapReport {
    pub fn new(client: Arc<dyn FredClient>, settings: &Settings) -> Self {
        Self {
            client,
            series: settings.earnings_series.clone(),
        }
    }

    /// Any failed series fails the whole report.
    pub async fn run(&self, req: EarningsGapRequest) -> Result<EarningsGapResponse> {
        let start = Some(req.start_date);
        let (hourly, hours, median) = tokio::try_join!(
            self.fetch(&self.series.hourly_earnings, start),
            self.fetch(&self.series.weekly_hours, start),
            self.fetch(&self.series.median_weekly_earnings, start),
        )?;

        let computed = compute(
            EarningsInputs {
                hourly_earnings: &hourly,
                weekly_hours: &hours,
                median_weekly: &median,
            },
            req.start_date,
        );

        tracing::info!(
            provider = self.client.provider_name(),
            start_date = %req.start_date,
            format = %req.format,
            years = computed.records.len(),
            skipped_observations = computed.skipped_observations,
            "earnings gap computed"
        );

        Ok(EarningsGapResponse {
            metadata: EarningsGapMetadata {
                series: SeriesMetadata::from(&self.series),
                description: DESCRIPTION,
                format: req.format,
                start_date: req.start_date,
                generated_at: Utc::now(),
                skipped_observations: computed.skipped_observations,
            },
            data: project(&computed.records, req.format),
        })
    }

    async fn fetch(
        &self,
        series_id: &str,
        start: Option<NaiveDate>,
    ) -> Result<Vec<SeriesObservation>> {
        self.client
            .fetch_observations(series_id, start)
            .await
            .with_context(|| format!("fetching FRED series {series_id}"))
    }
}
