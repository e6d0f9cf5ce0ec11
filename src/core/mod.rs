//! Core data structures for hourly series analysis.

mod resample;
mod time_series;

pub use resample::{resample, EdgeFill};
pub use time_series::TimeSeries;
