//! Derivative-free minimisation used for ARIMA parameter estimation.

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the simplex met both tolerances before `max_iter`.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of objective values.
    pub tolerance: f64,
    /// Convergence tolerance on the largest vertex distance from the best vertex.
    pub x_tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step, relative to the magnitude of each coordinate.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            x_tolerance: 1e-6,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

struct Simplex<'a> {
    vertices: Vec<Vec<f64>>,
    values: Vec<f64>,
    bounds: Option<&'a [(f64, f64)]>,
}

impl<'a> Simplex<'a> {
    fn clamp(&self, mut point: Vec<f64>) -> Vec<f64> {
        if let Some(bounds) = self.bounds {
            for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
                *x = x.clamp(lo, hi);
            }
        }
        point
    }

    /// Indices ordered from best to worst vertex.
    fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.vertices.len()).collect();
        order.sort_by(|&a, &b| self.values[a].total_cmp(&self.values[b]));
        order
    }

    fn centroid_without(&self, excluded: usize) -> Vec<f64> {
        let dim = self.vertices[0].len();
        let count = (self.vertices.len() - 1) as f64;
        let mut centroid = vec![0.0; dim];
        for (i, vertex) in self.vertices.iter().enumerate() {
            if i != excluded {
                for (c, v) in centroid.iter_mut().zip(vertex) {
                    *c += v / count;
                }
            }
        }
        centroid
    }

    /// Largest distance of any vertex from `anchor`.
    fn size_around(&self, anchor: usize) -> f64 {
        let origin = &self.vertices[anchor];
        self.vertices
            .iter()
            .map(|v| {
                v.iter()
                    .zip(origin)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max)
    }

    fn replace(&mut self, index: usize, point: Vec<f64>, value: f64) {
        self.vertices[index] = point;
        self.values[index] = value;
    }
}

/// Move from `from` along the direction to `towards`, scaled by `coef`.
fn step(from: &[f64], towards: &[f64], coef: f64) -> Vec<f64> {
    from.iter()
        .zip(towards)
        .map(|(f, t)| f + coef * (t - f))
        .collect()
}

/// Perform Nelder-Mead simplex optimization.
///
/// Non-finite objective values are treated as `+inf`, so infeasible regions
/// are never preferred.
///
/// # Example
/// ```
/// use forecast_dialog::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let mut simplex = Simplex {
        vertices: Vec::with_capacity(n + 1),
        values: Vec::with_capacity(n + 1),
        bounds,
    };
    let start = simplex.clamp(initial.to_vec());
    for i in 0..=n {
        let mut vertex = start.clone();
        if i > 0 {
            let magnitude = vertex[i - 1].abs();
            vertex[i - 1] += if magnitude > 1e-10 {
                config.initial_step * magnitude
            } else {
                config.initial_step
            };
        }
        let vertex = simplex.clamp(vertex);
        simplex.values.push(eval(&vertex));
        simplex.vertices.push(vertex);
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let order = simplex.ranking();
        let (best, worst, second_worst) = (order[0], order[n], order[n - 1]);

        // Equal values either side of a minimum are not convergence on their own.
        let spread = simplex.values[worst] - simplex.values[best];
        let size = simplex.size_around(best);
        if spread.is_finite() && spread.abs() < config.tolerance && size < config.x_tolerance {
            converged = true;
            break;
        }

        let centroid = simplex.centroid_without(worst);
        let reflected = simplex.clamp(step(&centroid, &simplex.vertices[worst], -config.alpha));
        let reflected_value = eval(&reflected);

        if reflected_value < simplex.values[best] {
            let expanded = simplex.clamp(step(&centroid, &reflected, config.gamma));
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex.replace(worst, expanded, expanded_value);
            } else {
                simplex.replace(worst, reflected, reflected_value);
            }
            continue;
        }

        if reflected_value < simplex.values[second_worst] {
            simplex.replace(worst, reflected, reflected_value);
            continue;
        }

        let (target, target_value) = if reflected_value < simplex.values[worst] {
            (reflected.clone(), reflected_value)
        } else {
            (simplex.vertices[worst].clone(), simplex.values[worst])
        };
        let contracted = simplex.clamp(step(&centroid, &target, config.rho));
        let contracted_value = eval(&contracted);
        if contracted_value < target_value {
            simplex.replace(worst, contracted, contracted_value);
            continue;
        }

        let anchor = simplex.vertices[best].clone();
        for i in 0..=n {
            if i != best {
                let shrunk = simplex.clamp(step(&anchor, &simplex.vertices[i], config.sigma));
                let value = eval(&shrunk);
                simplex.replace(i, shrunk, value);
            }
        }
    }

    let best = simplex.ranking()[0];
    NelderMeadResult {
        optimal_point: simplex.vertices[best].clone(),
        optimal_value: simplex.values[best],
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nelder_mead_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
        assert!(result.optimal_value < 1e-6);
    }

    #[test]
    fn nelder_mead_rosenbrock() {
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[-1.0, 1.0],
            None,
            NelderMeadConfig {
                max_iter: 5000,
                tolerance: 1e-12,
                ..Default::default()
            },
        );

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 2e-2);
    }

    #[test]
    fn nelder_mead_respects_bounds() {
        let bounds = [(-0.5, 0.5)];
        let result = nelder_mead(
            |x| (x[0] - 3.0).powi(2),
            &[0.0],
            Some(&bounds),
            NelderMeadConfig::default(),
        );

        assert!(result.optimal_point[0] <= 0.5);
        assert_relative_eq!(result.optimal_point[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn nelder_mead_avoids_infeasible_region() {
        // Objective is undefined for x < 0.
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 1.0).powi(2) },
            &[0.2],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn symmetric_vertices_do_not_stop_the_search() {
        // f(0.99) == f(1.01): the spread is zero while the simplex is still wide.
        let result = nelder_mead(
            |x| (x[0] - 1.0).powi(2),
            &[0.99],
            None,
            NelderMeadConfig {
                initial_step: 0.02 / 0.99,
                ..Default::default()
            },
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn nelder_mead_empty_input() {
        let result = nelder_mead(|_| 0.0, &[], None, NelderMeadConfig::default());
        assert!(!result.converged);
        assert!(result.optimal_point.is_empty());
    }
}
