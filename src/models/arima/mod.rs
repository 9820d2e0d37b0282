//! Non-seasonal ARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - ARIMA models with a fixed (p, d, q) specification
//! - AutoARIMA, which derives d from ADF tests and searches (p, q) by BIC

mod auto_arima;
mod diff;
mod model;

pub use auto_arima::{build_model, build_model_with, AutoARIMA, AutoARIMAConfig};
pub use diff::{difference, differencing_polynomial, integrate};
pub use model::{ARIMASpec, ARIMA};
