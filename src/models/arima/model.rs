//! ARIMA (Autoregressive Integrated Moving Average) model.

use std::fmt;

use crate::core::Series;
use crate::error::{PipelineError, Result};
use crate::models::arima::diff::{
    difference, differencing_polynomial, integrate, multiply_polynomials, undifference_at,
};
use crate::models::{Forecaster, Prediction};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, quantile_normal};
use tracing::warn;

/// Floor on the innovation variance so that perfect fits keep a finite likelihood.
const MIN_VARIANCE: f64 = 1e-12;

/// ARIMA model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    /// Create a new ARIMA order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Whether a mean is estimated for the differenced series.
    ///
    /// Twice-differenced models carry no constant.
    pub fn has_intercept(&self) -> bool {
        self.d < 2
    }

    /// Number of parameters counted by the information criteria, including
    /// the innovation variance.
    pub fn num_params(&self) -> usize {
        self.p + self.q + usize::from(self.has_intercept()) + 1
    }

    /// Leading observations of the differenced series without a residual.
    fn warmup(&self) -> usize {
        self.p.max(self.q)
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for ARIMASpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA forecasting model estimated by conditional sum of squares.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing for stationarity
/// - MA(q): Moving average component
///
/// Fitted values and residuals are reported on the scale of the input
/// series. The first `d + max(p, q)` observations have no one-step
/// prediction; they are reported with the actual value as fit and a zero
/// residual.
///
/// The sum of squares and the likelihood start at the larger of `max(p, q)`
/// and the conditioning offset, so models fitted with the same offset are
/// scored on the same observations.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    /// Leading differenced observations excluded from estimation.
    conditioning: usize,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Mean of the differenced series.
    intercept: f64,
    observed: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    /// One-step innovations on the differenced scale.
    innovations: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    log_likelihood: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    converged: bool,
}

impl ARIMA {
    /// Create a new ARIMA model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_spec(ARIMASpec::new(p, d, q))
    }

    pub fn from_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            conditioning: 0,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            observed: None,
            differenced: None,
            innovations: None,
            fitted: None,
            residuals: None,
            sigma2: None,
            log_likelihood: None,
            aic: None,
            bic: None,
            converged: false,
        }
    }

    /// Get the model order.
    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    /// Condition estimation on the first `offset` differenced observations.
    pub fn conditioned_on(mut self, offset: usize) -> Self {
        self.conditioning = offset;
        self
    }

    /// First differenced index that enters the sum of squares.
    fn sample_start(&self) -> usize {
        self.spec.warmup().max(self.conditioning)
    }

    /// Minimum number of observations needed to fit this model.
    pub fn min_observations(&self) -> usize {
        self.spec.d + self.sample_start() + self.spec.num_params()
    }

    /// Get AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Get MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Mean of the differenced series (zero when not estimated).
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Innovation variance.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Whether the optimiser stopped on its tolerance rather than its
    /// iteration limit.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// One-step innovations of the recursion, zero during warmup.
    fn css_innovations(w: &[f64], ar: &[f64], ma: &[f64], intercept: f64) -> Vec<f64> {
        let start = ar.len().max(ma.len());
        let mut innovations = vec![0.0; w.len()];

        for t in start..w.len() {
            let mut pred = intercept;
            for (i, phi) in ar.iter().enumerate() {
                pred += phi * (w[t - 1 - i] - intercept);
            }
            for (i, theta) in ma.iter().enumerate() {
                pred += theta * innovations[t - 1 - i];
            }
            innovations[t] = w[t] - pred;
        }

        innovations
    }

    fn conditional_sum_of_squares(
        w: &[f64],
        start: usize,
        ar: &[f64],
        ma: &[f64],
        intercept: f64,
    ) -> f64 {
        if w.len() <= start {
            return f64::MAX;
        }
        Self::css_innovations(w, ar, ma, intercept)[start..]
            .iter()
            .map(|e| e * e)
            .sum()
    }

    /// Estimate parameters using conditional least squares.
    ///
    /// The optimiser works on the standardised series, so the estimates do
    /// not depend on the units of the data.
    fn estimate_parameters(&mut self, w: &[f64]) -> Result<()> {
        let ARIMASpec { p, q, .. } = self.spec;
        let with_mean = self.spec.has_intercept();
        let center = if with_mean { mean(w) } else { 0.0 };

        if p == 0 && q == 0 {
            self.intercept = center;
            self.ar_coefficients.clear();
            self.ma_coefficients.clear();
            self.converged = true;
            return Ok(());
        }

        let n = w.len() as f64;
        let spread = (w.iter().map(|x| (x - center).powi(2)).sum::<f64>() / n).sqrt();
        let scale = if spread.is_finite() && spread > 0.0 {
            spread
        } else {
            1.0
        };
        let z: Vec<f64> = w.iter().map(|x| (x - center) / scale).collect();
        let start = self.sample_start();

        let mut initial = Vec::with_capacity(p + q + 1);
        let mut bounds = Vec::with_capacity(p + q + 1);
        if with_mean {
            initial.push(0.0);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        // AR and MA coefficients are kept inside the unit interval.
        for i in 0..p + q {
            let lag = if i < p { i } else { i - p };
            initial.push(0.1 / (lag + 1) as f64);
            bounds.push((-0.99, 0.99));
        }

        let config = NelderMeadConfig {
            max_iter: 500 * initial.len(),
            tolerance: 1e-8,
            ..Default::default()
        };

        let result = nelder_mead(
            |params| {
                let (mu, ar, ma) = split_params(params, with_mean, p);
                Self::conditional_sum_of_squares(&z, start, ar, ma, mu)
            },
            &initial,
            Some(&bounds),
            config,
        );

        if !result.optimal_value.is_finite()
            || result.optimal_point.iter().any(|v| !v.is_finite())
        {
            return Err(PipelineError::ModelFit(format!(
                "{} estimation produced non-finite parameters",
                self.spec
            )));
        }
        if !result.converged {
            warn!(
                order = %self.spec,
                iterations = result.iterations,
                "CSS optimisation stopped at the iteration limit"
            );
        }

        let (mu, ar, ma) = split_params(&result.optimal_point, with_mean, p);
        self.intercept = center + scale * mu;
        self.ar_coefficients = ar.to_vec();
        self.ma_coefficients = ma.to_vec();
        self.converged = result.converged;
        Ok(())
    }

    /// Psi weights of the integrated model, `ψ_0 = 1`.
    fn psi_weights(&self, count: usize) -> Vec<f64> {
        let ar_poly: Vec<f64> = std::iter::once(1.0)
            .chain(self.ar_coefficients.iter().map(|c| -c))
            .collect();
        let phi: Vec<f64> = multiply_polynomials(&ar_poly, &differencing_polynomial(self.spec.d))
            .iter()
            .skip(1)
            .map(|c| -c)
            .collect();

        let mut psi = vec![0.0; count];
        for j in 0..count {
            psi[j] = if j == 0 {
                1.0
            } else {
                let theta = self.ma_coefficients.get(j - 1).copied().unwrap_or(0.0);
                (1..=phi.len().min(j)).fold(theta, |acc, i| acc + phi[i - 1] * psi[j - i])
            };
        }
        psi
    }
}

/// Split an optimiser point into (mean, AR, MA).
fn split_params(params: &[f64], with_mean: bool, p: usize) -> (f64, &[f64], &[f64]) {
    if with_mean {
        (params[0], &params[1..1 + p], &params[1 + p..])
    } else {
        (0.0, &params[..p], &params[p..])
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::from_spec(ARIMASpec::default())
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &Series) -> Result<()> {
        let values = series.values();
        let min_len = self.min_observations();
        if values.len() < min_len {
            return Err(PipelineError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let d = self.spec.d;
        let w = difference(values, d);
        self.estimate_parameters(&w)?;

        let innovations =
            Self::css_innovations(&w, &self.ar_coefficients, &self.ma_coefficients, self.intercept);
        let start = self.sample_start();
        let n_eff = (w.len() - start) as f64;
        let sigma2 = (innovations[start..].iter().map(|e| e * e).sum::<f64>() / n_eff)
            .max(MIN_VARIANCE);

        let k = self.spec.num_params() as f64;
        let ll = -0.5 * n_eff * (1.0 + sigma2.ln() + (2.0 * std::f64::consts::PI).ln());
        if !ll.is_finite() {
            return Err(PipelineError::ModelFit(format!(
                "{} has a non-finite likelihood",
                self.spec
            )));
        }

        let warmup = d + self.spec.warmup();
        let fitted: Vec<f64> = (0..values.len())
            .map(|t| {
                if t < warmup {
                    values[t]
                } else {
                    undifference_at(w[t - d] - innovations[t - d], values, t, d)
                }
            })
            .collect();
        let residuals = values.iter().zip(&fitted).map(|(y, f)| y - f).collect();

        self.sigma2 = Some(sigma2);
        self.log_likelihood = Some(ll);
        self.aic = Some(-2.0 * ll + 2.0 * k);
        self.bic = Some(-2.0 * ll + k * n_eff.ln());
        self.observed = Some(values.to_vec());
        self.differenced = Some(w);
        self.innovations = Some(innovations);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Prediction> {
        let observed = self.observed.as_ref().ok_or(PipelineError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(PipelineError::FitRequired)?;
        let innovations = self.innovations.as_ref().ok_or(PipelineError::FitRequired)?;

        if horizon == 0 {
            return Ok(Prediction::default());
        }

        let mut extended = w.clone();
        let mut extended_innovations = innovations.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;
            for (i, phi) in self.ar_coefficients.iter().enumerate() {
                if t > i {
                    pred += phi * (extended[t - 1 - i] - self.intercept);
                }
            }
            for (i, theta) in self.ma_coefficients.iter().enumerate() {
                if t > i {
                    pred += theta * extended_innovations[t - 1 - i];
                }
            }
            extended.push(pred);
            extended_innovations.push(0.0);
        }

        let forecast_diff = &extended[w.len()..];
        Ok(Prediction::from_values(integrate(
            forecast_diff,
            observed,
            self.spec.d,
        )))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Prediction> {
        if !(level > 0.0 && level < 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "confidence level must lie in (0, 1), got {level}"
            )));
        }
        let prediction = self.predict(horizon)?;
        let sigma2 = self.sigma2.ok_or(PipelineError::FitRequired)?;

        let z = quantile_normal((1.0 + level) / 2.0);
        let psi = self.psi_weights(horizon);

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        let mut cumulative = 0.0;
        for (point, weight) in prediction.point.iter().zip(&psi) {
            cumulative += weight * weight;
            let se = (sigma2 * cumulative).sqrt();
            lower.push(point - z * se);
            upper.push(point + z * se);
        }

        if lower.iter().chain(&upper).any(|b| !b.is_finite()) {
            return Err(PipelineError::Forecast(format!(
                "{} produced non-finite interval bounds",
                self.spec
            )));
        }

        Ok(Prediction::with_intervals(prediction.point, lower, upper))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rand::distributions::Distribution;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use statrs::distribution::Normal;

    fn make_series(values: Vec<f64>) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Series::daily("value", start, values).unwrap()
    }

    fn gaussian_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let mut level = 0.0;
        gaussian_noise(n, seed)
            .into_iter()
            .map(|e| {
                level = phi * level + e;
                10.0 + level
            })
            .collect()
    }

    #[test]
    fn arima_ar1_recovers_coefficient() {
        let series = make_series(ar1(400, 0.7, 42));
        let mut model = ARIMA::new(1, 0, 0);
        model.fit(&series).unwrap();

        assert_relative_eq!(model.ar_coefficients()[0], 0.7, epsilon = 0.1);
        assert_relative_eq!(model.intercept(), 10.0, epsilon = 0.5);
        assert!(model.converged());
    }

    #[test]
    fn arima_with_differencing_continues_trend() {
        let noise = gaussian_noise(100, 3);
        let values: Vec<f64> = (0..100).map(|i| 10.0 + 2.0 * i as f64 + 0.1 * noise[i]).collect();
        let series = make_series(values.clone());

        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&series).unwrap();

        let forecast = model.predict(5).unwrap();
        let last = *values.last().unwrap();
        for (h, value) in forecast.point.iter().enumerate() {
            assert_relative_eq!(*value, last + 2.0 * (h + 1) as f64, epsilon = 1.0);
        }
    }

    #[test]
    fn random_walk_intervals_grow_with_sqrt_horizon() {
        let series = make_series(
            gaussian_noise(200, 8)
                .iter()
                .scan(50.0, |acc, e| {
                    *acc += e;
                    Some(*acc)
                })
                .collect(),
        );

        let mut model = ARIMA::new(0, 1, 0);
        model.fit(&series).unwrap();
        let forecast = model.predict_with_intervals(9, 0.95).unwrap();
        let lower = forecast.lower.unwrap();
        let upper = forecast.upper.unwrap();

        let width_1 = upper[0] - lower[0];
        let width_9 = upper[8] - lower[8];
        assert_relative_eq!(width_9 / width_1, 3.0, epsilon = 1e-9);

        let expected = 2.0 * 1.959964 * model.sigma2().unwrap().sqrt();
        assert_relative_eq!(width_1, expected, epsilon = 1e-4);
    }

    #[test]
    fn psi_weights_of_ar1_are_powers() {
        let series = make_series(ar1(300, 0.5, 17));
        let mut model = ARIMA::new(1, 0, 0);
        model.fit(&series).unwrap();

        let phi = model.ar_coefficients()[0];
        let psi = model.psi_weights(5);
        for (j, weight) in psi.iter().enumerate() {
            assert_relative_eq!(*weight, phi.powi(j as i32), epsilon = 1e-12);
        }
    }

    #[test]
    fn psi_weights_include_ma_and_integration() {
        let mut model = ARIMA::new(0, 1, 1);
        model.ma_coefficients = vec![0.4];
        // (1 - B) y = (1 + 0.4 B) e  =>  psi = 1, 1.4, 1.4, ...
        let psi = model.psi_weights(4);
        assert_relative_eq!(psi[0], 1.0);
        assert_relative_eq!(psi[1], 1.4, epsilon = 1e-12);
        assert_relative_eq!(psi[3], 1.4, epsilon = 1e-12);
    }

    #[test]
    fn fitted_values_on_original_scale() {
        let values: Vec<f64> = ar1(120, 0.6, 5)
            .iter()
            .scan(0.0, |acc, v| {
                *acc += v - 10.0;
                Some(100.0 + *acc)
            })
            .collect();
        let series = make_series(values.clone());

        let mut model = ARIMA::new(2, 1, 1);
        model.fit(&series).unwrap();

        let fitted = model.fitted_values().unwrap();
        let residuals = model.residuals().unwrap();
        assert_eq!(fitted.len(), values.len());
        assert_eq!(residuals.len(), values.len());

        // Warmup: d + max(p, q) = 3 observations.
        for t in 0..3 {
            assert_eq!(fitted[t], values[t]);
            assert_eq!(residuals[t], 0.0);
        }
        for t in 3..values.len() {
            assert_relative_eq!(fitted[t] + residuals[t], values[t], epsilon = 1e-9);
            assert!((fitted[t] - values[t]).abs() < 10.0);
        }
    }

    #[test]
    fn intercept_only_below_second_difference() {
        assert!(ARIMASpec::new(1, 0, 0).has_intercept());
        assert!(ARIMASpec::new(1, 1, 0).has_intercept());
        assert!(!ARIMASpec::new(1, 2, 0).has_intercept());
        assert_eq!(ARIMASpec::new(2, 1, 3).num_params(), 7);
        assert_eq!(ARIMASpec::new(2, 2, 3).num_params(), 6);

        let values: Vec<f64> = (0..60).map(|i| (i * i) as f64 * 0.1 + (i as f64).sin()).collect();
        let mut model = ARIMA::new(1, 2, 0);
        model.fit(&make_series(values)).unwrap();
        assert_eq!(model.intercept(), 0.0);
    }

    #[test]
    fn constant_series_keeps_finite_criteria() {
        let mut model = ARIMA::new(0, 1, 0);
        model.fit(&make_series(vec![7.0; 30])).unwrap();
        assert!(model.bic().unwrap().is_finite());
        assert_eq!(model.predict(3).unwrap().point, vec![7.0, 7.0, 7.0]);
    }

    #[test]
    fn arima_information_criteria() {
        let mut model = ARIMA::new(1, 0, 1);
        model.fit(&make_series(ar1(80, 0.3, 2))).unwrap();
        let (aic, bic) = (model.aic().unwrap(), model.bic().unwrap());
        assert!(aic.is_finite() && bic.is_finite());
        assert!(bic > aic);
    }

    #[test]
    fn conditioning_fixes_the_sample() {
        let series = make_series(ar1(150, 0.5, 21));
        let mut short = ARIMA::new(1, 0, 0).conditioned_on(4);
        let mut long = ARIMA::new(3, 0, 2).conditioned_on(4);
        short.fit(&series).unwrap();
        long.fit(&series).unwrap();

        // Same 146 observations enter both likelihoods.
        let n = 146.0_f64;
        for model in [&short, &long] {
            let sigma2 = model.sigma2().unwrap();
            let ll = -0.5 * n * (1.0 + sigma2.ln() + (2.0 * std::f64::consts::PI).ln());
            assert_relative_eq!(model.log_likelihood().unwrap(), ll, epsilon = 1e-9);
        }
        assert_eq!(short.min_observations(), 4 + 3);
        assert_eq!(long.min_observations(), 4 + 7);
    }

    #[test]
    fn estimates_follow_the_units_of_the_data() {
        let values = ar1(200, 0.6, 30);
        let mut unit = ARIMA::new(1, 0, 1);
        let mut scaled = ARIMA::new(1, 0, 1);
        unit.fit(&make_series(values.clone())).unwrap();
        scaled
            .fit(&make_series(values.iter().map(|v| v * 256.0).collect()))
            .unwrap();

        assert_eq!(unit.ar_coefficients(), scaled.ar_coefficients());
        assert_eq!(unit.ma_coefficients(), scaled.ma_coefficients());
        assert_relative_eq!(scaled.intercept(), 256.0 * unit.intercept(), max_relative = 1e-12);
        assert_relative_eq!(
            scaled.sigma2().unwrap(),
            65536.0 * unit.sigma2().unwrap(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn arima_insufficient_data() {
        let mut model = ARIMA::new(2, 1, 1);
        assert!(matches!(
            model.fit(&make_series(vec![1.0, 2.0, 3.0])),
            Err(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn arima_requires_fit() {
        let model = ARIMA::new(1, 1, 1);
        assert!(matches!(model.predict(5), Err(PipelineError::FitRequired)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn arima_zero_horizon_and_bad_level() {
        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&make_series(ar1(50, 0.2, 1))).unwrap();
        assert_eq!(model.predict(0).unwrap().horizon(), 0);
        assert!(model.predict_with_intervals(3, 1.5).is_err());
    }

    #[test]
    fn arima_spec_display_and_name() {
        assert_eq!(ARIMASpec::new(2, 1, 3).to_string(), "ARIMA(2,1,3)");
        assert_eq!(ARIMA::default().spec(), ARIMASpec::new(1, 1, 1));
        assert_eq!(ARIMA::new(1, 1, 1).name(), "ARIMA");
    }
}
