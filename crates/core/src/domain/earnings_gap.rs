use crate::domain::observation::{latest_per_year, ParsedSeries};
use crate::domain::{round_to, WEEKS_PER_YEAR};
use crate::ingest::types::SeriesObservation;
use anyhow::bail;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_START_DATE: (i32, u32, u32) = (2010, 1, 1);

pub fn default_start_date() -> NaiveDate {
    let (y, m, d) = DEFAULT_START_DATE;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GapFormat {
    #[default]
    Combined,
    Weekly,
    Annual,
}

impl FromStr for GapFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combined" => Ok(Self::Combined),
            "weekly" => Ok(Self::Weekly),
            "annual" => Ok(Self::Annual),
            other => bail!("unknown format {other:?} (expected combined, weekly or annual)"),
        }
    }
}

impl fmt::Display for GapFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Combined => "combined",
            Self::Weekly => "weekly",
            Self::Annual => "annual",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsGapRecord {
    pub year: i32,
    pub mean_weekly: f64,
    pub median_weekly: f64,
    pub weekly_gap: f64,
    pub weekly_gap_percent: f64,
    pub mean_annual: f64,
    pub median_annual: f64,
    pub annual_gap: f64,
    pub annual_gap_percent: f64,
}

impl EarningsGapRecord {
    pub fn from_weekly(year: i32, mean_weekly: f64, median_weekly: f64) -> Self {
        let gap = mean_weekly - median_weekly;
        let gap_percent = round_to(100.0 * gap / median_weekly, 1);
        Self {
            year,
            mean_weekly: round_to(mean_weekly, 2),
            median_weekly: round_to(median_weekly, 2),
            weekly_gap: round_to(gap, 2),
            weekly_gap_percent: gap_percent,
            mean_annual: round_to(mean_weekly * WEEKS_PER_YEAR, 2),
            median_annual: round_to(median_weekly * WEEKS_PER_YEAR, 2),
            annual_gap: round_to(gap * WEEKS_PER_YEAR, 2),
            // Scaling both sides by 52 leaves the ratio unchanged.
            annual_gap_percent: gap_percent,
        }
    }

    pub fn weekly_view(&self) -> GapView {
        GapView {
            year: self.year,
            mean: self.mean_weekly,
            median: self.median_weekly,
            gap: self.weekly_gap,
            gap_percent: self.weekly_gap_percent,
        }
    }

    pub fn annual_view(&self) -> GapView {
        GapView {
            year: self.year,
            mean: self.mean_annual,
            median: self.median_annual,
            gap: self.annual_gap,
            gap_percent: self.annual_gap_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapView {
    pub year: i32,
    pub mean: f64,
    pub median: f64,
    pub gap: f64,
    pub gap_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GapRow {
    Combined(EarningsGapRecord),
    View(GapView),
}

pub fn project(records: &[EarningsGapRecord], format: GapFormat) -> Vec<GapRow> {
    records
        .iter()
        .map(|r| match format {
            GapFormat::Combined => GapRow::Combined(r.clone()),
            GapFormat::Weekly => GapRow::View(r.weekly_view()),
            GapFormat::Annual => GapRow::View(r.annual_view()),
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct EarningsInputs<'a> {
    pub hourly_earnings: &'a [SeriesObservation],
    pub weekly_hours: &'a [SeriesObservation],
    pub median_weekly: &'a [SeriesObservation],
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarningsGapComputation {
    pub records: Vec<EarningsGapRecord>,
    pub skipped_observations: usize,
}

/// A year is reported only when both a mean and a median value exist for it.
pub fn compute(inputs: EarningsInputs<'_>, start: NaiveDate) -> EarningsGapComputation {
    let hourly = ParsedSeries::parse(inputs.hourly_earnings, start);
    let hours = ParsedSeries::parse(inputs.weekly_hours, start);
    let median = ParsedSeries::parse(inputs.median_weekly, start);

    let hours_by_date = hours.by_date();
    let mean_weekly_by_year = latest_per_year(
        hourly
            .points
            .iter()
            .filter_map(|(date, rate)| hours_by_date.get(date).map(|h| (*date, rate * h))),
    );
    let median_by_year = latest_per_year(median.points.iter().copied());

    let records = join_years(&mean_weekly_by_year, &median_by_year)
        .map(|(year, mean, median)| EarningsGapRecord::from_weekly(year, mean, median))
        .collect();

    EarningsGapComputation {
        records,
        skipped_observations: hourly.skipped() + hours.skipped() + median.skipped(),
    }
}

fn join_years<'a>(
    mean: &'a BTreeMap<i32, f64>,
    median: &'a BTreeMap<i32, f64>,
) -> impl Iterator<Item = (i32, f64, f64)> + 'a {
    mean.iter()
        .filter_map(|(year, m)| median.get(year).map(|md| (*year, *m, *md)))
}
