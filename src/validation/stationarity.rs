//! Stationarity tests for time series.
//!
//! The augmented Dickey-Fuller test decides whether a unit root is present,
//! and [`differencing_order`] uses it to find how many first differences a
//! series needs before it looks stationary.

use crate::error::{PipelineError, Result};
use crate::models::arima::difference;
use crate::utils::{cdf_normal, ols_fit, stats::is_near_constant};
use tracing::debug;

/// Significance level used when none is given.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Shortest series the ADF regression is attempted on.
pub const MIN_ADF_OBSERVATIONS: usize = 8;

/// Result of an augmented Dickey-Fuller test.
#[derive(Debug, Clone)]
pub struct AdfResult {
    /// t-statistic of the lagged level coefficient.
    pub statistic: f64,
    /// MacKinnon approximate p-value.
    pub p_value: f64,
    /// Number of lagged differences selected.
    pub lags: usize,
    /// Observations in the final regression.
    pub nobs: usize,
    /// BIC of the selected lag length.
    pub bic: f64,
    /// Finite-sample critical values.
    pub critical_values: CriticalValues,
}

impl AdfResult {
    /// Whether the unit-root null is rejected at `significance`.
    ///
    /// A non-finite p-value never rejects.
    pub fn rejects_unit_root(&self, significance: f64) -> bool {
        self.p_value.is_finite() && self.p_value <= significance
    }
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Default)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

impl CriticalValues {
    /// MacKinnon (2010) response surface, constant only.
    fn constant_only(nobs: usize) -> Self {
        let surface = |b: [f64; 4]| {
            let inv = 1.0 / nobs as f64;
            b[0] + b[1] * inv + b[2] * inv.powi(2) + b[3] * inv.powi(3)
        };
        Self {
            cv_1pct: surface([-3.43035, -6.5393, -16.786, -79.433]),
            cv_5pct: surface([-2.86154, -2.8903, -4.234, -40.040]),
            cv_10pct: surface([-2.56677, -1.5384, -2.809, 0.0]),
        }
    }
}

/// Augmented Dickey-Fuller test with a constant term.
///
/// Regresses `Δy_t` on `[1, y_{t-1}, Δy_{t-1}, .., Δy_{t-k}]`. The lag count
/// `k` minimises BIC over `0..=max_lags` on a common sample, then the
/// regression is refitted on all rows available for that `k`. `max_lags`
/// defaults to `ceil(12 * (n/100)^(1/4))` and is capped at `n/2 - 2`.
///
/// # Errors
/// `InsufficientData` for series too short to test, `ComputationError` for
/// near-constant series or a singular regression.
pub fn adf_test(series: &[f64], max_lags: Option<usize>) -> Result<AdfResult> {
    let n = series.len();
    if n < MIN_ADF_OBSERVATIONS {
        return Err(PipelineError::InsufficientData {
            needed: MIN_ADF_OBSERVATIONS,
            got: n,
        });
    }
    let scale = series.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);
    if is_near_constant(series, scale * 1e-12) {
        return Err(PipelineError::ComputationError(
            "ADF test on a constant series".into(),
        ));
    }

    let default_lags = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    let max_lags = max_lags.unwrap_or(default_lags).min(n / 2 - 2);

    let diff = difference(series, 1);

    let mut best: Option<(usize, f64)> = None;
    for lags in 0..=max_lags {
        let (y, rows) = adf_design(series, &diff, max_lags, lags);
        let Ok(fit) = ols_fit(&y, &rows) else {
            continue;
        };
        let bic = fit.bic();
        debug!(lags, bic, "ADF lag candidate");
        if best.map_or(true, |(_, b)| bic < b) {
            best = Some((lags, bic));
        }
    }
    let (lags, bic) = best.ok_or_else(|| {
        PipelineError::ComputationError("no ADF lag length could be fitted".into())
    })?;

    let (y, rows) = adf_design(series, &diff, lags, lags);
    let fit = ols_fit(&y, &rows)?;
    let statistic = fit.t_stat(1);
    let nobs = fit.nobs;

    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p_value(statistic),
        lags,
        nobs,
        bic,
        critical_values: CriticalValues::constant_only(nobs),
    })
}

/// Rows `t = start..` of the ADF regression using `lags` lagged differences.
///
/// `start` fixes the first row so that regressions with different lag counts
/// share a sample.
fn adf_design(
    level: &[f64],
    diff: &[f64],
    start: usize,
    lags: usize,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    (start..diff.len())
        .map(|t| {
            let mut row = Vec::with_capacity(lags + 2);
            row.push(1.0);
            row.push(level[t]);
            row.extend((1..=lags).map(|k| diff[t - k]));
            (diff[t], row)
        })
        .unzip()
}

/// MacKinnon (1994) approximate p-value for the constant-only ADF statistic.
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    const TAU_MAX: f64 = 2.74;
    const TAU_MIN: f64 = -18.83;
    const TAU_STAR: f64 = -1.61;
    const SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
    const LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }

    let coefs: &[f64] = if statistic <= TAU_STAR {
        &SMALL_P
    } else {
        &LARGE_P
    };
    let z = coefs.iter().rev().fold(0.0, |acc, c| acc * statistic + c);
    cdf_normal(z)
}

/// Minimal number of first differences making `series` stationary at the
/// default 5% level.
pub fn differencing_order(series: &[f64]) -> Result<usize> {
    differencing_order_with(series, DEFAULT_SIGNIFICANCE)
}

/// Minimal number of first differences after which the ADF test rejects the
/// unit root at `significance`.
///
/// A test that cannot be computed counts as failure to reject. The search
/// gives up with `NonStationarySeries` after `n/2` differences, or earlier if
/// the differenced series becomes too short to test.
#[tracing::instrument(skip(series), fields(n = series.len()))]
pub fn differencing_order_with(series: &[f64], significance: f64) -> Result<usize> {
    if series.is_empty() {
        return Err(PipelineError::EmptyData);
    }
    if !(significance > 0.0 && significance < 1.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "significance must lie in (0, 1), got {significance}"
        )));
    }

    let cap = series.len() / 2;
    let mut current = series.to_vec();
    let mut d = 0;

    loop {
        if current.len() < MIN_ADF_OBSERVATIONS {
            debug!(d, len = current.len(), "series too short for ADF");
            return Err(PipelineError::NonStationarySeries { iterations: d });
        }
        match adf_test(&current, None) {
            Ok(adf) => {
                debug!(d, statistic = adf.statistic, p_value = adf.p_value, lags = adf.lags, "ADF");
                if adf.rejects_unit_root(significance) {
                    return Ok(d);
                }
            }
            Err(err) => debug!(d, %err, "ADF not computable"),
        }
        if d >= cap {
            return Err(PipelineError::NonStationarySeries { iterations: d });
        }
        current = difference(&current, 1);
        d += 1;
    }
}
