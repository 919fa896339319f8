use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inequality_core::config::Settings;
use inequality_core::domain::chart::wealth_chart_points;
use inequality_core::ingest::census::HttpCensusClient;
use inequality_core::ingest::fred::HttpFredClient;
use inequality_core::report::{CensusReport, EarningsGapReport, EarningsGapRequest, WealthReport};

#[derive(Debug, Parser)]
#[command(name = "inequality_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// National median income, aggregate income and Gini index per ACS year.
    Census {
        /// Comma-separated years. Defaults to CENSUS_DEFAULT_YEARS.
        #[arg(long)]
        years: Option<String>,
    },

    /// Top-1% share of net worth, as returned by FRED.
    Wealth {
        /// Emit `[{date: year, value}]` chart points instead of the raw body.
        #[arg(long)]
        chart: bool,
    },

    /// Mean vs. median earnings gap per year.
    EarningsGap {
        /// First observation date (YYYY-MM-DD). Defaults to 2010-01-01.
        #[arg(long)]
        start_date: Option<String>,

        /// combined, weekly or annual.
        #[arg(long)]
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let output = match run(&settings, args.command).await {
        Ok(v) => v,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            inequality_core::error::log_failure(&err, "worker run");
            return Err(err);
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("serialize output failed")?
    );
    Ok(())
}

async fn run(settings: &Settings, command: Command) -> anyhow::Result<serde_json::Value> {
    match command {
        Command::Census { years } => {
            let client = Arc::new(HttpCensusClient::from_settings(settings)?);
            let report = CensusReport::new(client, settings);
            let years = report.resolve_years(years.as_deref());
            let records = report.run(&years).await?;
            tracing::info!(requested = years.len(), returned = records.len(), "census done");
            Ok(serde_json::to_value(records)?)
        }
        Command::Wealth { chart } => {
            let client = Arc::new(HttpFredClient::from_settings(settings)?);
            let report = WealthReport::new(client, settings);
            let raw = report.run().await?;
            if chart {
                let points = wealth_chart_points(&raw)
                    .with_context(|| format!("charting series {}", report.series_id()))?;
                return Ok(serde_json::to_value(points)?);
            }
            Ok(raw)
        }
        Command::EarningsGap { start_date, format } => {
            let req = EarningsGapRequest::parse(start_date.as_deref(), format.as_deref())?;
            let client = Arc::new(HttpFredClient::from_settings(settings)?);
            let report = EarningsGapReport::new(client, settings);
            Ok(serde_json::to_value(report.run(req).await?)?)
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_earnings_gap_flags() {
        let args = Args::try_parse_from([
            "inequality_worker",
            "earnings-gap",
            "--start-date",
            "2012-01-01",
            "--format",
            "annual",
        ])
        .unwrap();
        match args.command {
            Command::EarningsGap { start_date, format } => {
                assert_eq!(start_date.as_deref(), Some("2012-01-01"));
                assert_eq!(format.as_deref(), Some("annual"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_wealth_chart_flag() {
        let args = Args::try_parse_from(["inequality_worker", "wealth", "--chart"]).unwrap();
        assert!(matches!(args.command, Command::Wealth { chart: true }));
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(Args::try_parse_from(["inequality_worker"]).is_err());
    }

    #[test]
    fn census_years_are_optional() {
        let args = Args::try_parse_from(["inequality_worker", "census"]).unwrap();
        assert!(matches!(args.command, Command::Census { years: None }));
    }
}
