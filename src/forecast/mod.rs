//! Forecast engine: point forecasts, noisy future paths and intervals.

mod engine;

pub use engine::{historical_volatility, ForecastEngine, DEFAULT_LEVEL, VOLATILITY_WINDOW};
