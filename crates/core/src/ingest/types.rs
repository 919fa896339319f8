use serde::{Deserialize, Serialize};

pub const MISSING_SENTINEL: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesObservation {
    pub date: String,
    pub value: String,
}

impl SeriesObservation {
    pub fn new(date: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationsResponse {
    #[serde(default)]
    pub observations: Vec<SeriesObservation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CensusTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl CensusTable {
    /// The first row of the upstream array names the columns.
    pub fn from_rows(mut raw: Vec<Vec<Option<String>>>) -> anyhow::Result<Self> {
        anyhow::ensure!(!raw.is_empty(), "census response has no header row");
        let rows = raw.split_off(1);
        let header = raw
            .pop()
            .unwrap_or_default()
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        Ok(Self { header, rows })
    }

    pub fn column(&self, name: &str) -> anyhow::Result<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow::anyhow!("census response is missing column {name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_observations_ignoring_extra_fields() {
        let v = json!({
            "realtime_start": "2025-01-01",
            "count": 2,
            "observations": [
                {"realtime_start": "2025-01-01", "date": "2020-01-01", "value": "28.5"},
                {"realtime_start": "2025-01-01", "date": "2020-04-01", "value": "."}
            ]
        });
        let parsed: ObservationsResponse = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.observations.len(), 2);
        assert_eq!(parsed.observations[1].value, MISSING_SENTINEL);
    }

    #[test]
    fn splits_census_header_from_rows() {
        let raw: Vec<Vec<Option<String>>> = serde_json::from_value(json!([
            ["NAME", "B19013_001E", "state"],
            ["Alabama", "59609", "01"],
            ["Alaska", null, "02"]
        ]))
        .unwrap();
        let table = CensusTable::from_rows(raw).unwrap();
        assert_eq!(table.header, vec!["NAME", "B19013_001E", "state"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][1], None);
        assert_eq!(table.column("B19013_001E").unwrap(), 1);
        assert!(table.column("B19083_001E").is_err());
    }

    #[test]
    fn rejects_empty_census_payload() {
        assert!(CensusTable::from_rows(Vec::new()).is_err());
    }
}
