//! # forecast-dialog
//!
//! Conversational ARIMA forecasting. A user uploads a date-indexed CSV,
//! names a column and asks for plots; the crate tests the column for a unit
//! root, picks the differencing order, searches ARIMA orders by BIC and
//! renders the raw series, a noise-perturbed forecast with 95% intervals,
//! the ACF/PACF and the model residuals.
//!
//! The pipeline can also be used without the dialogue:
//!
//! ```no_run
//! use forecast_dialog::prelude::*;
//! use std::path::Path;
//!
//! let series = load_series(Path::new("prices.csv"), "Close")?;
//! let (model, d) = build_model(&series)?;
//! let forecast = ForecastEngine::with_seed(7).forecast(&model, &series, 30)?;
//! println!("d = {d}, order = {:?}, last = {:?}", forecast.order, forecast.points.last());
//! # Ok::<(), PipelineError>(())
//! ```

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod dialogue;
pub mod error;
pub mod features;
pub mod forecast;
pub mod models;
pub mod plot;
pub mod utils;
pub mod validation;

pub use error::{PipelineError, Result};

pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::core::{load_series, ForecastResult, Series};
    pub use crate::dialogue::{Dialogue, Incoming, SessionId, Stage, Transport};
    pub use crate::error::{PipelineError, Result};
    pub use crate::forecast::ForecastEngine;
    pub use crate::models::arima::{build_model, AutoARIMA, ARIMA};
    pub use crate::models::Forecaster;
    pub use crate::plot::{PlotDispatcher, PlotKind, PlottersRenderer, Renderer};
    pub use crate::validation::differencing_order;
}
