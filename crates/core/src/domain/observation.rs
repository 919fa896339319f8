use crate::ingest::types::{SeriesObservation, MISSING_SENTINEL};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObservationValue {
    Reported(NaiveDate, f64),
    Missing,
    Invalid,
}

pub fn classify(obs: &SeriesObservation) -> ObservationValue {
    let Ok(date) = NaiveDate::parse_from_str(obs.date.trim(), "%Y-%m-%d") else {
        return ObservationValue::Invalid;
    };
    let value = obs.value.trim();
    if value == MISSING_SENTINEL {
        return ObservationValue::Missing;
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => ObservationValue::Reported(date, v),
        _ => ObservationValue::Invalid,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSeries {
    pub points: Vec<(NaiveDate, f64)>,
    pub missing: usize,
    pub invalid: usize,
}

impl ParsedSeries {
    /// Observations before `start` are dropped without being counted as skipped.
    pub fn parse(observations: &[SeriesObservation], start: NaiveDate) -> Self {
        let mut out = Self::default();
        for obs in observations {
            match classify(obs) {
                ObservationValue::Reported(date, _) if date < start => {}
                ObservationValue::Reported(date, v) => out.points.push((date, v)),
                ObservationValue::Missing => out.missing += 1,
                ObservationValue::Invalid => out.invalid += 1,
            }
        }
        // Stable, so same-date duplicates keep upstream order.
        out.points.sort_by_key(|(date, _)| *date);
        out
    }

    pub fn skipped(&self) -> usize {
        self.missing + self.invalid
    }

    pub fn by_date(&self) -> BTreeMap<NaiveDate, f64> {
        self.points.iter().copied().collect()
    }
}

/// Reduces date-sorted points to one value per calendar year: the latest-dated one.
pub fn latest_per_year<I>(points: I) -> BTreeMap<i32, f64>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let mut out = BTreeMap::new();
    for (date, value) in points {
        out.insert(date.year(), value);
    }
    out
}
