pub mod census;
pub mod fred;
pub mod provider;
pub mod types;
