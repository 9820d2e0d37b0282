//! Forecaster trait defining the common interface for all models.

use crate::core::Series;
use crate::error::Result;

/// Out-of-sample predictions, optionally with interval bounds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Prediction {
    /// Point forecasts, one per step ahead.
    pub point: Vec<f64>,
    /// Lower interval bounds.
    pub lower: Option<Vec<f64>>,
    /// Upper interval bounds.
    pub upper: Option<Vec<f64>>,
}

impl Prediction {
    pub fn from_values(point: Vec<f64>) -> Self {
        Self {
            point,
            lower: None,
            upper: None,
        }
    }

    pub fn with_intervals(point: Vec<f64>, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            point,
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Number of steps ahead.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }
}

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the series.
    fn fit(&mut self, series: &Series) -> Result<()>;

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Prediction>;

    /// Generate predictions with confidence intervals.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Prediction> {
        let _ = level;
        self.predict(horizon)
    }

    /// In-sample predictions on the scale of the input series.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Residuals (actual - fitted), aligned with the input series.
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use forecast_dialog::models::arima::ARIMA;
/// use forecast_dialog::models::{BoxedForecaster, Forecaster};
///
/// let model: BoxedForecaster = Box::new(ARIMA::new(1, 1, 0));
/// assert_eq!(model.name(), "ARIMA");
/// assert!(!model.is_fitted());
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;
