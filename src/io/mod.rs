/// Hourly CSV export.
pub mod export;
