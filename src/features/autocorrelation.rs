//! Sample autocorrelation and partial autocorrelation.

use crate::error::{PipelineError, Result};
use crate::utils::stats::{mean, quantile_normal};

/// Returns the autocorrelation at a specific lag.
///
/// Uses the biased estimator (denominator over the full series), which keeps
/// the sequence positive semi-definite. Constant series give 0 for every
/// non-zero lag.
pub fn autocorrelation(series: &[f64], lag: usize) -> f64 {
    if series.len() <= lag {
        return f64::NAN;
    }
    if lag == 0 {
        return 1.0;
    }

    let m = mean(series);
    let denominator: f64 = series.iter().map(|x| (x - m).powi(2)).sum();
    if denominator < 1e-10 {
        return 0.0;
    }

    let numerator: f64 = series
        .iter()
        .skip(lag)
        .zip(series)
        .map(|(x, lagged)| (x - m) * (lagged - m))
        .sum();

    numerator / denominator
}

/// Autocorrelations for lags `0..=nlags`.
pub fn acf(series: &[f64], nlags: usize) -> Vec<f64> {
    (0..=nlags).map(|lag| autocorrelation(series, lag)).collect()
}

/// Partial autocorrelations for lags `0..=nlags` via Durbin-Levinson.
///
/// Lag 0 is 1 by convention. Lags past a numerically singular step are NaN.
pub fn pacf(series: &[f64], nlags: usize) -> Vec<f64> {
    let r = acf(series, nlags);
    let mut out = vec![f64::NAN; nlags + 1];
    out[0] = 1.0;
    if nlags == 0 || r.iter().any(|x| x.is_nan()) {
        return out;
    }

    let mut phi = vec![r[1]];
    out[1] = r[1];

    for k in 2..=nlags {
        let num = r[k] - (1..k).map(|j| phi[j - 1] * r[k - j]).sum::<f64>();
        let denom = 1.0 - (1..k).map(|j| phi[j - 1] * r[j]).sum::<f64>();
        if denom.abs() < 1e-10 {
            break;
        }

        let phi_kk = num / denom;
        let mut next: Vec<f64> = (1..k).map(|j| phi[j - 1] - phi_kk * phi[k - j - 1]).collect();
        next.push(phi_kk);
        phi = next;
        out[k] = phi_kk;
    }

    out
}

/// Partial autocorrelation at a single lag.
pub fn partial_autocorrelation(series: &[f64], lag: usize) -> f64 {
    if series.len() <= lag {
        return f64::NAN;
    }
    pacf(series, lag)[lag]
}

/// ACF and PACF of a series with the white-noise significance band.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlogram {
    /// Autocorrelations, index = lag, starting at 0.
    pub acf: Vec<f64>,
    /// Partial autocorrelations, index = lag, starting at 0.
    pub pacf: Vec<f64>,
    /// Half-width of the band `±z / sqrt(n)` at the chosen level.
    pub band: f64,
}

impl Correlogram {
    /// Number of non-zero lags.
    pub fn nlags(&self) -> usize {
        self.acf.len().saturating_sub(1)
    }

    /// Compute both functions up to `max_lags`, capped at `n/2 - 1`.
    ///
    /// # Errors
    /// `InsufficientData` when fewer than 4 observations are available.
    pub fn compute(series: &[f64], max_lags: usize, level: f64) -> Result<Self> {
        let n = series.len();
        if n < 4 {
            return Err(PipelineError::InsufficientData { needed: 4, got: n });
        }
        if !(level > 0.0 && level < 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "confidence level must lie in (0, 1), got {level}"
            )));
        }

        let nlags = max_lags.min(n / 2 - 1).max(1);
        Ok(Self {
            acf: acf(series, nlags),
            pacf: pacf(series, nlags),
            band: quantile_normal((1.0 + level) / 2.0) / (n as f64).sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn autocorrelation_lag_0() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(autocorrelation(&series, 0), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn autocorrelation_linear_trend() {
        let series: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let acf1 = autocorrelation(&series, 1);
        assert!(acf1 > 0.8, "Expected high ACF(1) for linear trend, got {}", acf1);
    }

    #[test]
    fn autocorrelation_alternating() {
        let series: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let acf1 = autocorrelation(&series, 1);
        assert!(acf1 < -0.5, "Expected negative ACF(1) for alternating, got {}", acf1);
    }

    #[test]
    fn autocorrelation_constant_and_short() {
        assert_eq!(autocorrelation(&[2.0; 10], 3), 0.0);
        assert!(autocorrelation(&[1.0, 2.0], 5).is_nan());
    }

    #[test]
    fn pacf_lag_one_equals_acf() {
        let series: Vec<f64> = (0..50).map(|i| ((i * 7) % 11) as f64).collect();
        let r = acf(&series, 3);
        let p = pacf(&series, 3);
        assert_eq!(p[0], 1.0);
        assert_relative_eq!(p[1], r[1], epsilon = 1e-12);
    }

    #[test]
    fn pacf_of_ar1_cuts_off() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(99);
        let mut series = vec![0.0];
        for i in 1..1000 {
            let shock: f64 = rng.gen_range(-1.0..1.0);
            series.push(0.6 * series[i - 1] + shock);
        }
        let p = pacf(&series, 5);
        assert_relative_eq!(p[1], 0.6, epsilon = 0.1);
        for lag in 2..=5 {
            assert!(p[lag].abs() < 0.15, "lag {lag}: {}", p[lag]);
        }
    }

    #[test]
    fn pacf_matches_single_lag_helper() {
        let series: Vec<f64> = (0..60).map(|i| (i as f64 * 0.4).sin() + 0.01 * i as f64).collect();
        let all = pacf(&series, 4);
        assert_relative_eq!(partial_autocorrelation(&series, 4), all[4], epsilon = 1e-12);
    }

    #[test]
    fn correlogram_caps_lags_by_length() {
        let series: Vec<f64> = (0..30).map(|i| (i as f64).cos()).collect();
        let c = Correlogram::compute(&series, 20, 0.95).unwrap();
        assert_eq!(c.nlags(), 14);
        assert_eq!(c.pacf.len(), 15);
        assert_relative_eq!(c.band, 1.959964 / 30f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn correlogram_requires_data() {
        assert!(Correlogram::compute(&[1.0, 2.0], 20, 0.95).is_err());
        assert!(Correlogram::compute(&[1.0; 10], 20, 2.0).is_err());
    }
}
