pub mod census;
pub mod earnings_gap;
pub mod wealth;

pub use census::CensusReport;
pub use earnings_gap::{EarningsGapReport, EarningsGapRequest, EarningsGapResponse};
pub use wealth::WealthReport;
