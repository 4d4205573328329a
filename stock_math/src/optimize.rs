//! Derivative-free minimisation with the Nelder-Mead simplex method

use serde::{Deserialize, Serialize};

/// Settings for the Nelder-Mead minimiser
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadConfig {
    /// Iteration cap; reaching it without converging is reported, not hidden
    pub max_iter: usize,
    /// Relative spread of objective values across the simplex that counts as converged
    pub tolerance: f64,
    /// Offset used to build the initial simplex around the starting point
    pub initial_step: f64,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub rho: f64,
    /// Shrink coefficient
    pub sigma: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-10,
            initial_step: 0.5,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
        }
    }
}

/// Outcome of a Nelder-Mead run
#[derive(Debug, Clone, PartialEq)]
pub struct NelderMeadResult {
    /// Best point found
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point
    pub optimal_value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the tolerance was met before the iteration cap
    pub converged: bool,
}

/// Minimise `f` starting from `initial`
///
/// Non-finite objective values are treated as `+inf`, which keeps the simplex
/// away from regions where the objective cannot be evaluated.
pub fn nelder_mead<F>(f: F, initial: &[f64], config: NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = f(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: Vec::new(),
            optimal_value: eval(initial),
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(initial.to_vec());
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if vertex[i].abs() > 1e-8 {
            config.initial_step * vertex[i].abs().max(1.0)
        } else {
            config.initial_step
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|x| eval(x)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        // Order vertices best to worst; the stable sort keeps ties deterministic
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let best = values[0];
        let worst = values[n];
        if best.is_finite() && (worst - best).abs() <= config.tolerance * (best.abs() + config.tolerance) {
            converged = true;
            break;
        }

        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let towards = |coef: f64, from: &[f64]| -> Vec<f64> {
            centroid
                .iter()
                .zip(from)
                .map(|(c, x)| c + coef * (x - c))
                .collect()
        };

        let reflected = towards(-config.alpha, &simplex[n]);
        let f_reflected = eval(&reflected);

        if f_reflected < values[0] {
            let expanded = towards(-config.alpha * config.gamma, &simplex[n]);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let (contracted, f_contracted) = if f_reflected < values[n] {
            let outside = towards(-config.alpha * config.rho, &simplex[n]);
            let f_outside = eval(&outside);
            (outside, f_outside)
        } else {
            let inside = towards(config.rho, &simplex[n]);
            let f_inside = eval(&inside);
            (inside, f_inside)
        };

        if f_contracted < values[n].min(f_reflected) {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        let best_vertex = simplex[0].clone();
        for i in 1..=n {
            simplex[i] = best_vertex
                .iter()
                .zip(&simplex[i])
                .map(|(b, x)| b + config.sigma * (x - b))
                .collect();
            values[i] = eval(&simplex[i]);
        }
    }

    let (best_index, best_value) = values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |acc, (i, &v)| if v < acc.1 { (i, v) } else { acc });

    NelderMeadResult {
        optimal_point: simplex[best_index].clone(),
        optimal_value: best_value,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quadratic_bowl() {
        let result = nelder_mead(
            |x| (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2) + 2.0,
            &[0.0, 0.0],
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_abs_diff_eq!(result.optimal_point[0], 3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.optimal_point[1], -1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.optimal_value, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rosenbrock() {
        let config = NelderMeadConfig {
            max_iter: 5000,
            tolerance: 1e-14,
            ..Default::default()
        };
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
            &[-1.2, 1.0],
            config,
        );

        assert_abs_diff_eq!(result.optimal_point[0], 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(result.optimal_point[1], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_iteration_cap_is_reported() {
        let config = NelderMeadConfig {
            max_iter: 3,
            ..Default::default()
        };
        let result = nelder_mead(|x| (x[0] - 100.0).powi(2), &[0.0], config);

        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn test_non_finite_objective_is_avoided() {
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 1.0).powi(2) },
            &[2.0],
            NelderMeadConfig::default(),
        );

        assert!(result.optimal_value.is_finite());
        assert_abs_diff_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_flat_objective_converges_immediately() {
        let result = nelder_mead(|_| 0.0, &[0.3, -0.2], NelderMeadConfig::default());
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
    }
}
