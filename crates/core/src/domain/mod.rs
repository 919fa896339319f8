pub mod census;
pub mod chart;
pub mod earnings_gap;
pub mod observation;

pub const WEEKS_PER_YEAR: f64 = 52.0;

/// Rounds half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
