use crate::config::{parse_year_list, Settings};
use crate::domain::census::{aggregate_year, CensusYearRecord, YearAggregation};
use crate::error::log_failure;
use crate::ingest::provider::CensusClient;
use anyhow::{Context, Result};
use futures_util::future::join_all;
use std::sync::Arc;

pub struct CensusReport {
    client: Arc<dyn CensusClient>,
    default_years: Vec<i32>,
}

impl CensusReport {
    pub fn new(client: Arc<dyn CensusClient>, settings: &Settings) -> Self {
        Self {
            client,
            default_years: settings.census_default_years.clone(),
        }
    }

    /// Absent or blank means the configured default list.
    pub fn resolve_years(&self, requested: Option<&str>) -> Vec<i32> {
        let Some(raw) = requested.filter(|s| !s.trim().is_empty()) else {
            return self.default_years.clone();
        };

        let years = parse_year_list(raw);
        let tokens = raw.split(',').filter(|t| !t.trim().is_empty()).count();
        if years.len() != tokens {
            tracing::warn!(requested = raw, ?years, "ignoring invalid year tokens");
        }
        years
    }

    /// A year whose task fails or panics is dropped from the output.
    pub async fn run(&self, years: &[i32]) -> Result<Vec<CensusYearRecord>> {
        tracing::info!(?years, provider = self.client.provider_name(), "census report start");

        let handles = years.iter().map(|&year| {
            let client = Arc::clone(&self.client);
            tokio::spawn(async move { fetch_year(client.as_ref(), year).await })
        });
        let joined = join_all(handles).await;

        let mut out = Vec::with_capacity(years.len());
        for (year, res) in years.iter().zip(joined) {
            let res = match res {
                Ok(res) => res,
                Err(join_err) => {
                    tracing::error!(year, error = %join_err, "census year task crashed");
                    continue;
                }
            };
            match res {
                Ok(agg) => {
                    tracing::info!(
                        year,
                        states = agg.states,
                        skipped = ?agg.skipped,
                        "census year aggregated"
                    );
                    out.push(agg.record);
                }
                Err(err) => {
                    log_failure(&err, "census year");
                    tracing::warn!(year, "dropping census year from report");
                }
            }
        }

        Ok(out)
    }
}

async fn fetch_year(client: &dyn CensusClient, year: i32) -> Result<YearAggregation> {
    let table = client
        .fetch_state_income(year)
        .await
        .with_context(|| format!("census fetch for {year} failed"))?;
    aggregate_year(year, &table).with_context(|| format!("census aggregation for {year} failed"))
}
