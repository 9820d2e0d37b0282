//! Core data structures: the daily series, its CSV loader and forecast results.

mod forecast;
mod loader;
mod time_series;

pub use forecast::{FittedPoint, ForecastPoint, ForecastResult};
pub use loader::{load_series, parse_date, CsvLoader};
pub use time_series::{MissingValuePolicy, Series};
