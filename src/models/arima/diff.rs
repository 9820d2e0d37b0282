//! Differencing utilities for ARIMA models.

/// Apply differencing to a time series.
///
/// Each pass drops the leading undefined value, so the result is `d`
/// elements shorter than the input.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Integrate forecasts made on the `d`-times differenced scale.
///
/// `original` supplies the starting level for every differencing pass.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let init_value = difference(original, level).last().copied().unwrap_or(0.0);
        result = result
            .iter()
            .scan(init_value, |acc, &step| {
                *acc += step;
                Some(*acc)
            })
            .collect();
    }

    result
}

/// Coefficients of `(1 - B)^d`, constant term first.
///
/// ```
/// use forecast_dialog::models::arima::differencing_polynomial;
///
/// assert_eq!(differencing_polynomial(2), vec![1.0, -2.0, 1.0]);
/// ```
pub fn differencing_polynomial(d: usize) -> Vec<f64> {
    (0..d).fold(vec![1.0], |poly, _| multiply_polynomials(&poly, &[1.0, -1.0]))
}

/// Product of two polynomials in the backshift operator.
pub(crate) fn multiply_polynomials(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Rebuild level `t` of the original series from a value `w` on the
/// differenced scale and the `d` preceding levels.
///
/// Solves `(1 - B)^d y_t = w` for `y_t`.
pub(crate) fn undifference_at(w: f64, original: &[f64], t: usize, d: usize) -> f64 {
    differencing_polynomial(d)
        .iter()
        .enumerate()
        .skip(1)
        .fold(w, |acc, (k, c)| acc - c * original[t - k])
}
