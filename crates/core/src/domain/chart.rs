use crate::domain::observation::{classify, ObservationValue};
use crate::ingest::types::ObservationsResponse;
use anyhow::Context;
use chrono::Datelike;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: i32,
    pub value: f64,
}

/// Missing and invalid observations are left out rather than plotted as gaps.
pub fn wealth_chart_points(raw: &Value) -> anyhow::Result<Vec<ChartPoint>> {
    let parsed = serde_json::from_value::<ObservationsResponse>(raw.clone())
        .context("FRED body has no observations list")?;
    Ok(parsed
        .observations
        .iter()
        .filter_map(|obs| match classify(obs) {
            ObservationValue::Reported(date, value) => Some(ChartPoint {
                date: date.year(),
                value,
            }),
            ObservationValue::Missing | ObservationValue::Invalid => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_observations_to_year_points() {
        let raw = json!({
            "units": "lin",
            "observations": [
                {"date": "1989-07-01", "value": "22.8"},
                {"date": "1989-10-01", "value": "."},
                {"date": "2024-01-01", "value": "30.5"}
            ]
        });
        let points = wealth_chart_points(&raw).unwrap();
        assert_eq!(
            points,
            vec![
                ChartPoint { date: 1989, value: 22.8 },
                ChartPoint { date: 2024, value: 30.5 },
            ]
        );
    }

    #[test]
    fn rejects_body_without_observation_objects() {
        let raw = json!({"observations": "nope"});
        assert!(wealth_chart_points(&raw).is_err());
    }
}
