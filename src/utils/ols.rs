//! Ordinary Least Squares (OLS) regression on a dense design matrix.
//!
//! Used by the augmented Dickey-Fuller regression, which needs coefficient
//! standard errors and the Gaussian log-likelihood for lag selection.

use crate::error::{PipelineError, Result};

/// Fitted OLS regression.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Regression coefficients, one per design column.
    pub coefficients: Vec<f64>,
    /// Standard errors of the coefficients.
    pub std_errors: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Number of observations.
    pub nobs: usize,
}

impl OLSResult {
    /// Number of estimated coefficients.
    pub fn num_params(&self) -> usize {
        self.coefficients.len()
    }

    /// Gaussian log-likelihood at the OLS estimate.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.rss / n).ln() + 1.0)
    }

    /// Akaike information criterion.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.num_params() as f64
    }

    /// Bayesian information criterion.
    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood() + self.num_params() as f64 * (self.nobs as f64).ln()
    }

    /// t-statistic of coefficient `index`.
    pub fn t_stat(&self, index: usize) -> f64 {
        self.coefficients[index] / self.std_errors[index]
    }
}

/// Fit `y = X @ beta` where `rows` holds one design row per observation.
///
/// Solves the normal equations with a Cholesky decomposition. Fails when the
/// design is rank deficient or has no residual degrees of freedom.
pub fn ols_fit(y: &[f64], rows: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    if n == 0 {
        return Err(PipelineError::InsufficientData { needed: 1, got: 0 });
    }
    if rows.len() != n {
        return Err(PipelineError::InvalidParameter(format!(
            "dimension mismatch: {} targets, {} design rows",
            n,
            rows.len()
        )));
    }

    let k = rows[0].len();
    if k == 0 || n <= k {
        return Err(PipelineError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in rows.iter().zip(y) {
        if row.len() != k {
            return Err(PipelineError::InvalidParameter(format!(
                "dimension mismatch: expected {} columns, got {}",
                k,
                row.len()
            )));
        }
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        PipelineError::ComputationError("OLS design matrix is singular".into())
    })?;
    let coefficients = cholesky_solve(&chol, &xty);

    let rss: f64 = rows
        .iter()
        .zip(y)
        .map(|(row, &target)| {
            let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
            (target - fitted).powi(2)
        })
        .sum();

    let sigma_sq = rss / (n - k) as f64;
    let std_errors = (0..k)
        .map(|i| {
            let mut unit = vec![0.0; k];
            unit[i] = 1.0;
            let col = cholesky_solve(&chol, &unit);
            (sigma_sq * col[i]).sqrt()
        })
        .collect();

    Ok(OLSResult {
        coefficients,
        std_errors,
        rss,
        nobs: n,
    })
}

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                // Pivot relative to the column's own scale detects collinearity.
                if sum <= 0.0 || sum <= a[i][i].abs() * 1e-12 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// Solve `L L' x = b` given the Cholesky factor `L`.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn with_intercept(x: &[f64]) -> Vec<Vec<f64>> {
        x.iter().map(|&v| vec![1.0, v]).collect()
    }

    #[test]
    fn ols_fit_simple_linear() {
        // y = 2 + 3*x
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [5.0, 8.0, 11.0, 14.0, 17.0];

        let result = ols_fit(&y, &with_intercept(&x)).unwrap();

        assert_relative_eq!(result.coefficients[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(result.coefficients[1], 3.0, epsilon = 1e-8);
        assert!(result.rss < 1e-12);
    }

    #[test]
    fn ols_standard_errors_match_closed_form() {
        // Simple regression: se(slope) = sqrt(s^2 / Sxx)
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [1.1, 1.9, 3.2, 3.8, 5.1, 6.0];
        let result = ols_fit(&y, &with_intercept(&x)).unwrap();

        let x_mean = 3.5;
        let sxx: f64 = x.iter().map(|v| (v - x_mean).powi(2)).sum();
        let s2 = result.rss / 4.0;
        assert_relative_eq!(result.std_errors[1], (s2 / sxx).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn ols_information_criteria_order() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|v| 1.0 + 0.5 * v + (v * 0.7).sin())
            .collect();
        let result = ols_fit(&y, &with_intercept(&x)).unwrap();

        assert!(result.log_likelihood().is_finite());
        // ln(50) > 2, so BIC penalises harder than AIC.
        assert!(result.bic() > result.aic());
    }

    #[test]
    fn ols_singular_design_fails() {
        let rows: Vec<Vec<f64>> = (0..5).map(|i| vec![1.0, i as f64, 2.0 * i as f64]).collect();
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(ols_fit(&y, &rows).is_err());
    }

    #[test]
    fn ols_requires_degrees_of_freedom() {
        let rows = vec![vec![1.0, 0.0], vec![1.0, 1.0]];
        assert!(matches!(
            ols_fit(&[1.0, 2.0], &rows),
            Err(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn ols_dimension_mismatch() {
        let rows = vec![vec![1.0, 0.0], vec![1.0, 1.0]];
        assert!(ols_fit(&[1.0, 2.0, 3.0], &rows).is_err());
    }
}
