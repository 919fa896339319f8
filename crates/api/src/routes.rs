use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use inequality_core::config::Settings;
use inequality_core::error::log_failure;
use inequality_core::ingest::census::HttpCensusClient;
use inequality_core::ingest::fred::HttpFredClient;
use inequality_core::ingest::provider::{CensusClient, FredClient};
use inequality_core::report::wealth::WEALTH_CACHE_MAX_AGE_SECS;
use inequality_core::report::{CensusReport, EarningsGapReport, EarningsGapRequest, WealthReport};

#[derive(Clone)]
pub struct AppState {
    census: Arc<CensusReport>,
    wealth: Arc<WealthReport>,
    earnings_gap: Arc<EarningsGapReport>,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let census: Arc<dyn CensusClient> = Arc::new(HttpCensusClient::from_settings(settings)?);
        let fred: Arc<dyn FredClient> = Arc::new(HttpFredClient::from_settings(settings)?);
        Ok(Self::new(census, fred, settings))
    }

    pub fn new(
        census: Arc<dyn CensusClient>,
        fred: Arc<dyn FredClient>,
        settings: &Settings,
    ) -> Self {
        Self {
            census: Arc::new(CensusReport::new(census, settings)),
            wealth: Arc::new(WealthReport::new(Arc::clone(&fred), settings)),
            earnings_gap: Arc::new(EarningsGapReport::new(fred, settings)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/census-data", get(census_data))
        .route("/wealth-data", get(wealth_data))
        .route("/earnings-gap", get(earnings_gap))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct CensusQuery {
    years: Option<String>,
}

async fn census_data(
    State(state): State<AppState>,
    Query(query): Query<CensusQuery>,
) -> Response {
    let years = state.census.resolve_years(query.years.as_deref());
    match state.census.run(&years).await {
        Ok(records) => Json(records).into_response(),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            log_failure(&err, "census report");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to fetch Census data",
                    "details": format!("{err:#}"),
                })),
            )
                .into_response()
        }
    }
}

async fn wealth_data(State(state): State<AppState>) -> Response {
    match state.wealth.run().await {
        Ok(body) => (
            [(
                header::CACHE_CONTROL,
                format!("max-age={WEALTH_CACHE_MAX_AGE_SECS}"),
            )],
            Json(body),
        )
            .into_response(),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            log_failure(&err, "wealth passthrough");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch data" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EarningsGapQuery {
    start_date: Option<String>,
    format: Option<String>,
}

async fn earnings_gap(
    State(state): State<AppState>,
    Query(query): Query<EarningsGapQuery>,
) -> Response {
    let req = match EarningsGapRequest::parse(query.start_date.as_deref(), query.format.as_deref())
    {
        Ok(req) => req,
        Err(err) => {
            tracing::info!(error = %err, "rejecting earnings gap request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid request parameters",
                    "message": format!("{err:#}"),
                })),
            )
                .into_response();
        }
    };

    match state.earnings_gap.run(req).await {
        Ok(res) => Json(res).into_response(),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            log_failure(&err, "earnings gap report");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to fetch earnings data",
                    "message": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use inequality_core::ingest::types::{CensusTable, SeriesObservation};
    use serde_json::Value;
    use std::collections::HashMap;
    use tower::ServiceExt;

    #[derive(Default)]
    struct StubCensus {
        tables: HashMap<i32, CensusTable>,
    }

    #[async_trait::async_trait]
    impl CensusClient for StubCensus {
        fn provider_name(&self) -> &'static str {
            "stub_census"
        }

        async fn fetch_state_income(&self, year: i32) -> anyhow::Result<CensusTable> {
            self.tables
                .get(&year)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no table for {year}"))
        }
    }

    #[derive(Default)]
    struct StubFred {
        series: HashMap<String, Vec<SeriesObservation>>,
    }

    impl StubFred {
        fn with(mut self, id: &str, obs: &[(&str, &str)]) -> Self {
            self.series.insert(
                id.to_string(),
                obs.iter()
                    .map(|(d, v)| SeriesObservation::new(*d, *v))
                    .collect(),
            );
            self
        }
    }

    #[async_trait::async_trait]
    impl FredClient for StubFred {
        fn provider_name(&self) -> &'static str {
            "stub_fred"
        }

        async fn fetch_series_raw(&self, series_id: &str) -> anyhow::Result<Value> {
            let obs = self
                .series
                .get(series_id)
                .ok_or_else(|| anyhow::anyhow!("no series {series_id}"))?;
            Ok(json!({ "observations": obs }))
        }

        async fn fetch_observations(
            &self,
            series_id: &str,
            _start: Option<NaiveDate>,
        ) -> anyhow::Result<Vec<SeriesObservation>> {
            self.series
                .get(series_id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no series {series_id}"))
        }
    }

    fn census_table() -> CensusTable {
        let raw = serde_json::from_value(json!([
            ["NAME", "B19013_001E", "B19025_001E", "B19083_001E", "state"],
            ["Alabama", "50000", "100", "0.40", "01"],
            ["Alaska", "70000", "300", "0.50", "02"],
            ["District of Columbia", "90000", "900000", "0.60", "11"]
        ]))
        .unwrap();
        CensusTable::from_rows(raw).unwrap()
    }

    fn earnings_fred() -> StubFred {
        StubFred::default()
            .with("CES0500000003", &[("2020-01-01", "20")])
            .with("AWHAETP", &[("2020-01-01", "35")])
            .with("LES1252881600Q", &[("2020-01-01", "650")])
            .with("WFRBST01134", &[("2024-01-01", "30.5")])
    }

    fn app(census: StubCensus, fred: StubFred) -> Router {
        router(AppState::new(
            Arc::new(census),
            Arc::new(fred),
            &Settings::default(),
        ))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
        let res = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    #[tokio::test]
    async fn census_drops_failed_years_and_allows_any_origin() {
        let mut census = StubCensus::default();
        census.tables.insert(2019, census_table());
        let (status, headers, body) =
            get(app(census, StubFred::default()), "/census-data?years=2019,2020").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["year"], 2019);
        assert_eq!(rows[0]["aggregateIncome"], 400.0);
        assert_eq!(rows[0]["medianIncome"], 60000.0);
        let gini = rows[0]["giniIndex"].as_f64().unwrap();
        assert!((gini - 0.475).abs() < 1e-12);
    }

    #[tokio::test]
    async fn census_uses_default_years_without_parameter() {
        let mut census = StubCensus::default();
        census.tables.insert(2021, census_table());
        census.tables.insert(2022, census_table());
        let (status, _, body) = get(app(census, StubFred::default()), "/census-data").await;
        assert_eq!(status, StatusCode::OK);
        let years: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["year"].as_i64().unwrap())
            .collect();
        assert_eq!(years, vec![2021, 2022]);
    }

    #[tokio::test]
    async fn wealth_passthrough_sets_cache_control() {
        let (status, headers, body) =
            get(app(StubCensus::default(), earnings_fred()), "/wealth-data").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CACHE_CONTROL], "max-age=43200");
        assert_eq!(body["observations"][0]["date"], "2024-01-01");
    }

    #[tokio::test]
    async fn wealth_failure_is_generic_500() {
        let (status, _, body) =
            get(app(StubCensus::default(), StubFred::default()), "/wealth-data").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to fetch data" }));
    }

    #[tokio::test]
    async fn earnings_gap_weekly_format() {
        let (status, _, body) = get(
            app(StubCensus::default(), earnings_fred()),
            "/earnings-gap?startDate=2015-01-01&format=weekly",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["format"], "weekly");
        assert_eq!(body["metadata"]["startDate"], "2015-01-01");
        assert_eq!(
            body["data"],
            json!([{ "year": 2020, "mean": 700.0, "median": 650.0, "gap": 50.0, "gapPercent": 7.7 }])
        );
    }

    #[tokio::test]
    async fn earnings_gap_upstream_failure_is_500() {
        let fred = StubFred::default().with("AWHAETP", &[("2020-01-01", "35")]);
        let (status, _, body) =
            get(app(StubCensus::default(), fred), "/earnings-gap").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch earnings data");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn earnings_gap_rejects_bad_parameters() {
        let (status, _, body) = get(
            app(StubCensus::default(), earnings_fred()),
            "/earnings-gap?format=hourly",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request parameters");
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let res = app(StubCensus::default(), StubFred::default())
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
