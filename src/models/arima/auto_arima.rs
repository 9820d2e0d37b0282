//! Automatic ARIMA order selection.

use std::collections::BTreeMap;

use crate::core::Series;
use crate::error::{PipelineError, Result};
use crate::models::arima::model::{ARIMASpec, ARIMA};
use crate::models::{Forecaster, Prediction};
use crate::validation::{differencing_order_with, DEFAULT_SIGNIFICANCE};
use tracing::{debug, info};

/// Fit outcome per visited order; `None` when the order could not be fitted.
type Candidates = BTreeMap<ARIMASpec, Option<(ARIMA, f64)>>;

/// (p, q) moves tried from the current best order.
const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
];

/// Configuration for AutoARIMA.
#[derive(Debug, Clone)]
pub struct AutoARIMAConfig {
    /// Maximum AR order to consider.
    pub max_p: usize,
    /// Maximum MA order to consider.
    pub max_q: usize,
    /// Fixed differencing order; derived from the ADF test when `None`.
    pub d: Option<usize>,
    /// ADF significance used when deriving `d`.
    pub significance: f64,
    /// Use stepwise search (faster) vs exhaustive.
    pub stepwise: bool,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            d: None,
            significance: DEFAULT_SIGNIFICANCE,
            stepwise: true,
        }
    }
}

impl AutoARIMAConfig {
    /// Set maximum AR and MA orders.
    pub fn with_max_orders(mut self, max_p: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_q = max_q;
        self
    }

    /// Skip the stationarity search and use `d` differences.
    pub fn with_d(mut self, d: usize) -> Self {
        self.d = Some(d);
        self
    }

    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    /// Use exhaustive search instead of stepwise.
    pub fn exhaustive(mut self) -> Self {
        self.stepwise = false;
        self
    }
}

/// Automatic ARIMA model selection.
///
/// The differencing order comes from repeated ADF tests; (p, q) minimise BIC
/// with that order held fixed. Every candidate is conditioned on the first
/// `max(max_p, max_q)` differenced observations, so all BIC values are
/// computed on the same sample. The winning order is then refitted on the
/// full series. The stepwise search starts from ARIMA(2,d,2),
/// ARIMA(0,d,0), ARIMA(1,d,0) and ARIMA(0,d,1), then moves to the best
/// neighbouring order (p±1 and/or q±1) until no neighbour improves.
#[derive(Debug, Clone)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
    selected_model: Option<ARIMA>,
    selected_order: Option<ARIMASpec>,
    /// Every successfully fitted candidate, best first.
    model_scores: Vec<(ARIMASpec, f64)>,
}

impl AutoARIMA {
    /// Create a new AutoARIMA with default configuration.
    pub fn new() -> Self {
        Self::with_config(AutoARIMAConfig::default())
    }

    /// Create AutoARIMA with custom configuration.
    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            selected_model: None,
            selected_order: None,
            model_scores: Vec::new(),
        }
    }

    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }

    /// Get the selected order.
    pub fn selected_order(&self) -> Option<(usize, usize, usize)> {
        self.selected_order.map(|o| (o.p, o.d, o.q))
    }

    pub fn selected_spec(&self) -> Option<ARIMASpec> {
        self.selected_order
    }

    /// Differencing order used by the selected model.
    pub fn differencing_order(&self) -> Option<usize> {
        self.selected_order.map(|o| o.d)
    }

    /// The fitted model of the selected order.
    pub fn selected_model(&self) -> Option<&ARIMA> {
        self.selected_model.as_ref()
    }

    /// BIC of every fitted candidate, best first.
    pub fn model_scores(&self) -> &[(ARIMASpec, f64)] {
        &self.model_scores
    }

    /// Differenced observations held back from every candidate's likelihood.
    fn conditioning(&self) -> usize {
        self.config.max_p.max(self.config.max_q)
    }

    fn evaluate(&self, series: &Series, spec: ARIMASpec) -> Option<(ARIMA, f64)> {
        let mut model = ARIMA::from_spec(spec).conditioned_on(self.conditioning());
        if series.len() < model.min_observations() {
            return None;
        }
        match model.fit(series) {
            Ok(()) => {
                let bic = model.bic().filter(|b| b.is_finite())?;
                debug!(order = %spec, bic, "candidate fitted");
                Some((model, bic))
            }
            Err(err) => {
                debug!(order = %spec, %err, "candidate rejected");
                None
            }
        }
    }

    fn exhaustive_search(&self, series: &Series, d: usize) -> Candidates {
        let mut visited = Candidates::new();
        for p in 0..=self.config.max_p {
            for q in 0..=self.config.max_q {
                let spec = ARIMASpec::new(p, d, q);
                visited.insert(spec, self.evaluate(series, spec));
            }
        }
        visited
    }

    fn stepwise_search(&self, series: &Series, d: usize) -> Candidates {
        let (max_p, max_q) = (self.config.max_p, self.config.max_q);
        let mut visited = Candidates::new();
        let mut best: Option<(ARIMASpec, f64)> = None;

        let consider = |spec: ARIMASpec, visited: &mut Candidates| -> Option<f64> {
            visited
                .entry(spec)
                .or_insert_with(|| self.evaluate(series, spec))
                .as_ref()
                .map(|(_, bic)| *bic)
        };

        for (p, q) in [(2, 2), (0, 0), (1, 0), (0, 1)] {
            let spec = ARIMASpec::new(p.min(max_p), d, q.min(max_q));
            if let Some(bic) = consider(spec, &mut visited) {
                if best.map_or(true, |(_, b)| bic < b) {
                    best = Some((spec, bic));
                }
            }
        }

        while let Some((current, current_bic)) = best {
            let mut improved = None;
            for (dp, dq) in NEIGHBOURS {
                let p = current.p as i64 + dp;
                let q = current.q as i64 + dq;
                if p < 0 || q < 0 || p as usize > max_p || q as usize > max_q {
                    continue;
                }
                let spec = ARIMASpec::new(p as usize, d, q as usize);
                if let Some(bic) = consider(spec, &mut visited) {
                    let threshold = improved.map_or(current_bic, |(_, b)| b);
                    if bic < threshold {
                        improved = Some((spec, bic));
                    }
                }
            }
            match improved {
                Some(next) => best = Some(next),
                None => break,
            }
        }

        visited
    }
}

impl Default for AutoARIMA {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoARIMA {
    #[tracing::instrument(name = "auto_arima_fit", skip(self, series), fields(n = series.len()))]
    fn fit(&mut self, series: &Series) -> Result<()> {
        if series.is_empty() {
            return Err(PipelineError::EmptyData);
        }

        let d = match self.config.d {
            Some(d) => d,
            None => differencing_order_with(series.values(), self.config.significance)?,
        };

        let visited = if self.config.stepwise {
            self.stepwise_search(series, d)
        } else {
            self.exhaustive_search(series, d)
        };

        let mut fitted: Vec<(ARIMASpec, ARIMA, f64)> = visited
            .into_iter()
            .filter_map(|(spec, result)| result.map(|(model, bic)| (spec, model, bic)))
            .collect();
        // Ties resolve to the smaller order.
        fitted.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)));

        self.model_scores = fitted.iter().map(|(spec, _, bic)| (*spec, *bic)).collect();
        let Some((spec, model, bic)) = fitted.into_iter().next() else {
            self.selected_model = None;
            self.selected_order = None;
            return Err(PipelineError::ModelFit(format!(
                "no ARIMA(p,{d},q) candidate could be fitted to {} observations",
                series.len()
            )));
        };

        info!(order = %spec, bic, candidates = self.model_scores.len(), "selected model");
        let mut full = ARIMA::from_spec(spec);
        let model = match full.fit(series) {
            Ok(()) => full,
            Err(err) => {
                debug!(order = %spec, %err, "full-sample refit failed, keeping conditioned fit");
                model
            }
        };
        self.selected_model = Some(model);
        self.selected_order = Some(spec);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Prediction> {
        self.selected_model
            .as_ref()
            .ok_or(PipelineError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Prediction> {
        self.selected_model
            .as_ref()
            .ok_or(PipelineError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        "AutoARIMA"
    }
}

/// Derive the differencing order and fit the best ARIMA(p, d, q) to `series`.
///
/// Returns the fitted selector together with `d`.
pub fn build_model(series: &Series) -> Result<(AutoARIMA, usize)> {
    build_model_with(series, AutoARIMAConfig::default())
}

/// [`build_model`] with explicit search settings.
#[tracing::instrument(skip(series, config), fields(column = series.name(), n = series.len()))]
pub fn build_model_with(series: &Series, config: AutoARIMAConfig) -> Result<(AutoARIMA, usize)> {
    let mut model = AutoARIMA::with_config(config);
    model.fit(series)?;
    let d = model
        .differencing_order()
        .ok_or(PipelineError::FitRequired)?;
    Ok((model, d))
}
