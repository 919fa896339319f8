pub mod domain;
pub mod error;
pub mod ingest;
pub mod report;

pub mod config {
    use std::time::Duration;

    pub const DEFAULT_CENSUS_BASE_URL: &str = "https://api.census.gov/data";
    pub const DEFAULT_FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred";
    pub const DEFAULT_WEALTH_SERIES_ID: &str = "WFRBST01134";
    pub const DEFAULT_HOURLY_EARNINGS_SERIES_ID: &str = "CES0500000003";
    pub const DEFAULT_WEEKLY_HOURS_SERIES_ID: &str = "AWHAETP";
    pub const DEFAULT_MEDIAN_WEEKLY_SERIES_ID: &str = "LES1252881600Q";
    pub const DEFAULT_CENSUS_YEARS: [i32; 3] = [2019, 2021, 2022];
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EarningsSeriesIds {
        pub hourly_earnings: String,
        pub weekly_hours: String,
        pub median_weekly_earnings: String,
    }

    impl Default for EarningsSeriesIds {
        fn default() -> Self {
            Self {
                hourly_earnings: DEFAULT_HOURLY_EARNINGS_SERIES_ID.to_string(),
                weekly_hours: DEFAULT_WEEKLY_HOURS_SERIES_ID.to_string(),
                median_weekly_earnings: DEFAULT_MEDIAN_WEEKLY_SERIES_ID.to_string(),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub census_api_key: Option<String>,
        pub fred_api_key: Option<String>,
        pub census_base_url: String,
        pub fred_base_url: String,
        pub wealth_series_id: String,
        pub earnings_series: EarningsSeriesIds,
        pub census_default_years: Vec<i32>,
        pub upstream_timeout: Duration,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                census_api_key: None,
                fred_api_key: None,
                census_base_url: DEFAULT_CENSUS_BASE_URL.to_string(),
                fred_base_url: DEFAULT_FRED_BASE_URL.to_string(),
                wealth_series_id: DEFAULT_WEALTH_SERIES_ID.to_string(),
                earnings_series: EarningsSeriesIds::default(),
                census_default_years: DEFAULT_CENSUS_YEARS.to_vec(),
                upstream_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Blank values count as unset.
        pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
        where
            F: Fn(&str) -> Option<String>,
        {
            let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
            let defaults = Self::default();

            let census_default_years = match get("CENSUS_DEFAULT_YEARS") {
                Some(v) => match parse_year_list(&v) {
                    years if years.is_empty() => {
                        tracing::warn!(
                            value = %v,
                            "CENSUS_DEFAULT_YEARS has no valid years, using defaults"
                        );
                        defaults.census_default_years
                    }
                    years => years,
                },
                None => defaults.census_default_years,
            };

            let upstream_timeout = get("UPSTREAM_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.upstream_timeout);

            Ok(Self {
                census_api_key: get("CENSUS_API_KEY"),
                fred_api_key: get("FRED_API_KEY"),
                census_base_url: get("CENSUS_BASE_URL").unwrap_or(defaults.census_base_url),
                fred_base_url: get("FRED_BASE_URL").unwrap_or(defaults.fred_base_url),
                wealth_series_id: get("FRED_WEALTH_SERIES_ID")
                    .unwrap_or(defaults.wealth_series_id),
                earnings_series: EarningsSeriesIds {
                    hourly_earnings: get("FRED_HOURLY_EARNINGS_SERIES_ID")
                        .unwrap_or(defaults.earnings_series.hourly_earnings),
                    weekly_hours: get("FRED_WEEKLY_HOURS_SERIES_ID")
                        .unwrap_or(defaults.earnings_series.weekly_hours),
                    median_weekly_earnings: get("FRED_MEDIAN_WEEKLY_SERIES_ID")
                        .unwrap_or(defaults.earnings_series.median_weekly_earnings),
                },
                census_default_years,
                upstream_timeout,
                sentry_dsn: get("SENTRY_DSN"),
            })
        }
    }

    pub fn parse_year_list(s: &str) -> Vec<i32> {
        s.split(',')
            .map(str::trim)
            .filter(|t| t.len() == 4 && t.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|t| t.parse::<i32>().ok())
            .collect()
    }

}
