use crate::domain::round_to;
use crate::ingest::census::{
    AGGREGATE_INCOME_COLUMN, GINI_INDEX_COLUMN, MEDIAN_INCOME_COLUMN, NAME_COLUMN,
};
use crate::ingest::types::CensusTable;
use serde::Serialize;

pub const EXCLUDED_REGIONS: [&str; 2] = ["Puerto Rico", "District of Columbia"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CensusYearRecord {
    pub year: i32,
    /// Unweighted mean of state medians, not a true national median.
    pub median_income: Option<f64>,
    pub aggregate_income: f64,
    pub gini_index: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipReport {
    pub excluded_regions: usize,
    pub invalid_median_income: usize,
    pub invalid_aggregate_income: usize,
    pub invalid_gini_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearAggregation {
    pub record: CensusYearRecord,
    pub states: usize,
    pub skipped: SkipReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateRow<'a> {
    pub name: &'a str,
    pub median_income: Option<f64>,
    pub aggregate_income: Option<f64>,
    pub gini_index: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    name: usize,
    median_income: usize,
    aggregate_income: usize,
    gini_index: usize,
}

impl Columns {
    fn locate(table: &CensusTable) -> anyhow::Result<Self> {
        Ok(Self {
            name: table.column(NAME_COLUMN)?,
            median_income: table.column(MEDIAN_INCOME_COLUMN)?,
            aggregate_income: table.column(AGGREGATE_INCOME_COLUMN)?,
            gini_index: table.column(GINI_INDEX_COLUMN)?,
        })
    }
}

fn cell(row: &[Option<String>], idx: usize) -> Option<&str> {
    row.get(idx).and_then(|c| c.as_deref())
}

// ACS annotations ("not available", "too few samples") are large negative numbers.
fn parse_amount(s: Option<&str>) -> Option<f64> {
    s?.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

pub fn is_excluded_region(name: &str) -> bool {
    EXCLUDED_REGIONS.iter().any(|r| name.contains(r))
}

/// Fails only when a required column is absent from the header.
pub fn aggregate_year(year: i32, table: &CensusTable) -> anyhow::Result<YearAggregation> {
    let cols = Columns::locate(table)?;
    let mut skipped = SkipReport::default();

    let mut states = 0usize;
    let mut aggregate_total = 0.0;
    let mut median_sum = 0.0;
    let mut median_count = 0usize;
    let mut gini_weighted = 0.0;
    let mut gini_weight = 0.0;

    for raw in &table.rows {
        let name = cell(raw, cols.name).unwrap_or("");
        if is_excluded_region(name) {
            skipped.excluded_regions += 1;
            continue;
        }
        states += 1;

        let row = StateRow {
            name,
            median_income: parse_amount(cell(raw, cols.median_income)),
            aggregate_income: parse_amount(cell(raw, cols.aggregate_income)),
            gini_index: parse_amount(cell(raw, cols.gini_index))
                .filter(|g| (0.0..=1.0).contains(g)),
        };

        match row.median_income {
            Some(v) => {
                median_sum += v;
                median_count += 1;
            }
            None => skipped.invalid_median_income += 1,
        }

        match row.aggregate_income {
            Some(v) => aggregate_total += v,
            None => skipped.invalid_aggregate_income += 1,
        }

        match (row.gini_index, row.aggregate_income) {
            (Some(g), Some(w)) => {
                gini_weighted += g * w;
                gini_weight += w;
            }
            (None, _) => skipped.invalid_gini_index += 1,
            (Some(_), None) => {}
        }

        tracing::trace!(year, state = row.name, ?row, "census state row");
    }

    let median_income = (median_count > 0).then(|| round_to(median_sum / median_count as f64, 0));
    let gini_index = (gini_weight > 0.0).then(|| gini_weighted / gini_weight);

    Ok(YearAggregation {
        record: CensusYearRecord {
            year,
            median_income,
            aggregate_income: round_to(aggregate_total, 0),
            gini_index,
        },
        states,
        skipped,
    })
}
