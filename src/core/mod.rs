//! Core data structures: raw samples, prepared series, forecast rows.

pub mod forecast;
pub mod prepare;

pub use forecast::{ForecastRow, FutureFrame};
pub use prepare::{prepare, PreparedSeries, RawSample, RawTimestamp};
