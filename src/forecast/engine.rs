//! Forecast generation with noise-perturbed paths and confidence intervals.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;
use tracing::{debug, info};

use crate::config::Settings;
use crate::core::{FittedPoint, ForecastPoint, ForecastResult, Series};
use crate::error::{PipelineError, Result};
use crate::models::arima::{AutoARIMA, ARIMA};
use crate::models::Forecaster;
use crate::utils::stats::{pct_change, std_dev};

/// Confidence level of the reported intervals.
pub const DEFAULT_LEVEL: f64 = 0.95;

/// Number of trailing observations used for the volatility estimate.
pub const VOLATILITY_WINDOW: usize = 30;

/// Sample standard deviation of period-over-period relative changes over
/// the last `window` observations.
///
/// Changes relative to a zero value are skipped. Returns 0 when fewer than
/// two valid changes remain.
pub fn historical_volatility(values: &[f64], window: usize) -> f64 {
    let start = values.len().saturating_sub(window);
    let changes = pct_change(&values[start..]);
    if changes.len() < 2 {
        return 0.0;
    }
    std_dev(&changes)
}

/// Produces forecasts from a fitted [`AutoARIMA`].
///
/// Every future value is the model's point forecast perturbed by
/// multiplicative Gaussian noise whose scale is the recent historical
/// volatility. Intervals come from refitting a plain [`ARIMA`] of the
/// selected order.
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    rng: StdRng,
    level: f64,
    window: usize,
}

impl ForecastEngine {
    /// Engine with an entropy-seeded noise source.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Engine with a reproducible noise source.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_settings(settings: &Settings) -> Self {
        match settings.noise_seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        }
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            level: DEFAULT_LEVEL,
            window: VOLATILITY_WINDOW,
        }
    }

    /// Set the interval confidence level.
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Forecast `horizon` days past the last observation of `series`.
    ///
    /// `model` must have been fitted to `series`.
    ///
    /// # Errors
    /// `Forecast` for a zero horizon or when the interval refit fails;
    /// `FitRequired` when `model` is unfitted.
    #[tracing::instrument(skip(self, model, series), fields(column = series.name()))]
    pub fn forecast(
        &mut self,
        model: &AutoARIMA,
        series: &Series,
        horizon: usize,
    ) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(PipelineError::Forecast("horizon must be positive".into()));
        }
        let spec = model.selected_spec().ok_or(PipelineError::FitRequired)?;
        let origin = series.last_date().ok_or(PipelineError::EmptyData)?;

        let point = model.predict(horizon)?.point;

        let volatility = historical_volatility(series.values(), self.window);
        let noise = self.draw_noise(volatility, horizon);
        debug!(volatility, "drawing forecast noise");

        let mut refit = ARIMA::from_spec(spec);
        refit
            .fit(series)
            .map_err(|e| PipelineError::Forecast(format!("{spec} refit failed: {e}")))?;
        let intervals = refit
            .predict_with_intervals(horizon, self.level)
            .map_err(|e| match e {
                PipelineError::Forecast(_) => e,
                other => PipelineError::Forecast(other.to_string()),
            })?;
        let (Some(lower), Some(upper)) = (intervals.lower, intervals.upper) else {
            return Err(PipelineError::Forecast(format!(
                "{spec} returned no interval bounds"
            )));
        };

        let dates = series.future_dates(horizon)?;
        let points = dates
            .into_iter()
            .zip(point)
            .zip(noise)
            .zip(lower.into_iter().zip(upper))
            .map(|(((date, point), shock), (lower, upper))| ForecastPoint {
                date,
                value: point + shock * point,
                point,
                lower,
                upper,
            })
            .collect();

        let fitted = model.fitted_values().ok_or(PipelineError::FitRequired)?;
        let history = series
            .iter()
            .zip(fitted)
            .map(|((date, actual), &fitted)| FittedPoint {
                date,
                actual,
                fitted,
            })
            .collect();

        info!(order = %spec, horizon, volatility, "forecast ready");
        Ok(ForecastResult {
            origin,
            level: self.level,
            volatility,
            order: (spec.p, spec.d, spec.q),
            history,
            points,
        })
    }

    /// `count` draws of N(0, volatility); zeros when the scale is degenerate.
    fn draw_noise(&mut self, volatility: f64, count: usize) -> Vec<f64> {
        match Normal::new(0.0, volatility) {
            Ok(normal) if volatility > 0.0 => {
                (0..count).map(|_| normal.sample(&mut self.rng)).collect()
            }
            _ => vec![0.0; count],
        }
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new()
    }
}
