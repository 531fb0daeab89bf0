// Unconstrained smooth minimizers: L-BFGS and plain gradient descent.
//
// Both take an objective that writes the gradient into a caller-provided
// buffer and returns the function value. Both use Armijo backtracking and
// stop when the largest absolute gradient component drops below `tolerance`.
// No randomness anywhere, so the same start point gives the same minimum.

use std::collections::VecDeque;

/// Stopping and memory settings shared by both solvers.
#[derive(Debug, Clone, Copy)]
pub struct SolverParams {
    pub max_iter: usize,
    pub tolerance: f64,
    /// Number of (s, y) correction pairs L-BFGS keeps
    pub memory: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-4,
            memory: 10,
        }
    }
}

/// Where a solver stopped.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Sufficient-decrease constant for the Armijo condition.
const ARMIJO_C: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;

/// Minimize `objective` with L-BFGS starting from `x0`.
///
/// `on_iter` is called after every accepted step with (iteration, value).
pub fn lbfgs<F, P>(x0: Vec<f64>, params: &SolverParams, mut objective: F, mut on_iter: P) -> Minimum
where
    F: FnMut(&[f64], &mut [f64]) -> f64,
    P: FnMut(usize, f64),
{
    let n = x0.len();
    let mut x = x0;
    let mut g = vec![0.0; n];
    let mut fx = objective(&x, &mut g);

    let mut history: VecDeque<(Vec<f64>, Vec<f64>, f64)> = VecDeque::with_capacity(params.memory);
    let mut x_new = vec![0.0; n];
    let mut g_new = vec![0.0; n];

    for iter in 0..params.max_iter {
        if max_abs(&g) <= params.tolerance {
            return Minimum {
                x,
                value: fx,
                iterations: iter,
                converged: true,
            };
        }

        let mut d = two_loop_direction(&g, &history);
        let mut slope = dot(&d, &g);
        if slope >= 0.0 {
            // Curvature info went stale; restart from steepest descent
            history.clear();
            d = g.iter().map(|v| -v).collect();
            slope = -dot(&g, &g);
        }

        // First step has no curvature estimate, so keep it short
        let initial = if history.is_empty() {
            (1.0 / norm(&g)).min(1.0)
        } else {
            1.0
        };

        let Some((step_value, _)) =
            backtrack(&x, &d, fx, slope, initial, &mut objective, &mut x_new, &mut g_new)
        else {
            return Minimum {
                x,
                value: fx,
                iterations: iter,
                converged: false,
            };
        };

        let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();
        let sy = dot(&s, &y);
        if sy > 1e-10 {
            if history.len() == params.memory {
                history.pop_front();
            }
            history.push_back((s, y, 1.0 / sy));
        }

        std::mem::swap(&mut x, &mut x_new);
        std::mem::swap(&mut g, &mut g_new);
        fx = step_value;
        on_iter(iter + 1, fx);
    }

    let converged = max_abs(&g) <= params.tolerance;
    Minimum {
        x,
        value: fx,
        iterations: params.max_iter,
        converged,
    }
}

/// Minimize `objective` with steepest descent and backtracking.
///
/// The accepted step length carries over (doubled) to the next iteration.
pub fn gradient_descent<F, P>(
    x0: Vec<f64>,
    params: &SolverParams,
    mut objective: F,
    mut on_iter: P,
) -> Minimum
where
    F: FnMut(&[f64], &mut [f64]) -> f64,
    P: FnMut(usize, f64),
{
    let n = x0.len();
    let mut x = x0;
    let mut g = vec![0.0; n];
    let mut fx = objective(&x, &mut g);
    let mut x_new = vec![0.0; n];
    let mut g_new = vec![0.0; n];
    let mut step = 1.0;

    for iter in 0..params.max_iter {
        if max_abs(&g) <= params.tolerance {
            return Minimum {
                x,
                value: fx,
                iterations: iter,
                converged: true,
            };
        }

        let d: Vec<f64> = g.iter().map(|v| -v).collect();
        let slope = -dot(&g, &g);
        let Some((step_value, accepted)) =
            backtrack(&x, &d, fx, slope, step, &mut objective, &mut x_new, &mut g_new)
        else {
            return Minimum {
                x,
                value: fx,
                iterations: iter,
                converged: false,
            };
        };

        step = accepted * 2.0;
        std::mem::swap(&mut x, &mut x_new);
        std::mem::swap(&mut g, &mut g_new);
        fx = step_value;
        on_iter(iter + 1, fx);
    }

    let converged = max_abs(&g) <= params.tolerance;
    Minimum {
        x,
        value: fx,
        iterations: params.max_iter,
        converged,
    }
}

/// Armijo backtracking along `d`. On success `x_new`/`g_new` hold the accepted
/// point and the return is (value, step length).
#[allow(clippy::too_many_arguments)]
fn backtrack<F>(
    x: &[f64],
    d: &[f64],
    fx: f64,
    slope: f64,
    initial: f64,
    objective: &mut F,
    x_new: &mut [f64],
    g_new: &mut [f64],
) -> Option<(f64, f64)>
where
    F: FnMut(&[f64], &mut [f64]) -> f64,
{
    let mut step = initial;
    for _ in 0..MAX_BACKTRACKS {
        for ((xn, xi), di) in x_new.iter_mut().zip(x).zip(d) {
            *xn = xi + step * di;
        }
        let value = objective(x_new, g_new);
        if value.is_finite() && value <= fx + ARMIJO_C * step * slope {
            return Some((value, step));
        }
        step *= 0.5;
    }
    None
}

/// Two-loop recursion: approximate -H⁻¹g from the stored correction pairs.
fn two_loop_direction(g: &[f64], history: &VecDeque<(Vec<f64>, Vec<f64>, f64)>) -> Vec<f64> {
    let mut q = g.to_vec();
    let mut alphas = Vec::with_capacity(history.len());

    for (s, y, rho) in history.iter().rev() {
        let alpha = rho * dot(s, &q);
        for (qi, yi) in q.iter_mut().zip(y) {
            *qi -= alpha * yi;
        }
        alphas.push(alpha);
    }

    let gamma = match history.back() {
        Some((s, y, _)) => {
            let yy = dot(y, y);
            if yy > 0.0 {
                dot(s, y) / yy
            } else {
                1.0
            }
        }
        None => 1.0,
    };
    for qi in &mut q {
        *qi *= gamma;
    }

    for ((s, y, rho), alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = rho * dot(y, &q);
        for (qi, si) in q.iter_mut().zip(s) {
            *qi += si * (alpha - beta);
        }
    }

    q.iter().map(|v| -v).collect()
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

fn max_abs(a: &[f64]) -> f64 {
    a.iter().fold(0.0, |m, v| m.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// f(x) = sum_i (i + 1) * (x_i - i)^2, minimum at x_i = i.
    fn quadratic(x: &[f64], g: &mut [f64]) -> f64 {
        let mut value = 0.0;
        for (i, (xi, gi)) in x.iter().zip(g.iter_mut()).enumerate() {
            let w = (i + 1) as f64;
            let diff = xi - i as f64;
            value += w * diff * diff;
            *gi = 2.0 * w * diff;
        }
        value
    }

    /// Rosenbrock in two dimensions, minimum at (1, 1).
    fn rosenbrock(x: &[f64], g: &mut [f64]) -> f64 {
        let (a, b) = (x[0], x[1]);
        g[0] = -2.0 * (1.0 - a) - 400.0 * a * (b - a * a);
        g[1] = 200.0 * (b - a * a);
        (1.0 - a).powi(2) + 100.0 * (b - a * a).powi(2)
    }

    #[test]
    fn test_lbfgs_quadratic() {
        let params = SolverParams {
            tolerance: 1e-8,
            ..SolverParams::default()
        };
        let min = lbfgs(vec![0.0; 5], &params, quadratic, |_, _| {});
        assert!(min.converged);
        for (i, xi) in min.x.iter().enumerate() {
            assert!((xi - i as f64).abs() < 1e-6, "x[{i}] = {xi}");
        }
    }

    #[test]
    fn test_lbfgs_rosenbrock() {
        let params = SolverParams {
            tolerance: 1e-5,
            ..SolverParams::default()
        };
        let min = lbfgs(vec![-1.2, 1.0], &params, rosenbrock, |_, _| {});
        assert!(min.converged);
        assert!((min.x[0] - 1.0).abs() < 1e-3);
        assert!((min.x[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_gradient_descent_quadratic() {
        let params = SolverParams {
            max_iter: 5000,
            tolerance: 1e-6,
            ..SolverParams::default()
        };
        let min = gradient_descent(vec![0.0; 3], &params, quadratic, |_, _| {});
        assert!(min.converged);
        for (i, xi) in min.x.iter().enumerate() {
            assert!((xi - i as f64).abs() < 1e-4);
        }
    }

    #[test]
    fn test_deterministic() {
        let params = SolverParams::default();
        let a = lbfgs(vec![-1.2, 1.0], &params, rosenbrock, |_, _| {});
        let b = lbfgs(vec![-1.2, 1.0], &params, rosenbrock, |_, _| {});
        assert_eq!(a.x, b.x);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_already_optimal_start() {
        let params = SolverParams::default();
        let mut calls = 0;
        let min = lbfgs(
            vec![0.0, 1.0],
            &params,
            |x, g| {
                calls += 1;
                quadratic(x, g)
            },
            |_, _| {},
        );
        assert!(min.converged);
        assert_eq!(min.iterations, 0);
        assert_eq!(calls, 1);
    }
}
