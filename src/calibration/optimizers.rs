//! Bounded derivative-free minimisation for likelihood fitting.
//!
//! References:
//! - Nelder and Mead (1965), simplex direct search.
//! - Gao and Han (2012), restarting the simplex to escape premature collapse.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::calibration::core::{BoxConstraints, ConvergenceInfo, TerminationReason};
use crate::error::{Result, TailRiskError};

/// Optimization payload returned by [`nelder_mead`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisationResult {
    pub x: Vec<f64>,
    pub objective: f64,
    pub convergence: ConvergenceInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NelderMeadOptions {
    pub max_iterations: usize,
    /// Initial vertex offset as a fraction of each bound width.
    pub initial_step: f64,
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
    /// Stop once the value spread is below `tolerance * (1 + |f_best|)`.
    pub tolerance: f64,
    /// Extra runs started from the incumbent optimum while they keep improving it.
    pub max_restarts: usize,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            initial_step: 0.08,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            tolerance: 1e-10,
            max_restarts: 3,
        }
    }
}

struct SimplexRun {
    x: Vec<f64>,
    objective: f64,
    iterations: usize,
    converged: bool,
    reason: TerminationReason,
}

/// Minimises `objective_fn` inside `bounds` starting from `initial`.
///
/// Infeasible points should evaluate to `f64::INFINITY`; they are handled by the usual
/// contraction and shrink moves.
pub fn nelder_mead<F>(
    initial: &[f64],
    bounds: &BoxConstraints,
    options: NelderMeadOptions,
    mut objective_fn: F,
) -> Result<OptimisationResult>
where
    F: FnMut(&[f64]) -> f64,
{
    if initial.len() != bounds.dimension() {
        return Err(TailRiskError::InvalidInput(
            "Nelder-Mead initial vector dimension does not match bounds".to_string(),
        ));
    }

    let mut evals = 0usize;
    let first = simplex_search(
        &bounds.clamp(initial),
        bounds,
        &options,
        &mut objective_fn,
        &mut evals,
    );

    let mut iterations = first.iterations;
    let mut best_x = first.x;
    let mut best_val = first.objective;
    let mut converged = first.converged;
    let mut reason = first.reason;
    let mut restarts = 0usize;

    for _ in 0..options.max_restarts {
        let run = simplex_search(&best_x, bounds, &options, &mut objective_fn, &mut evals);
        restarts += 1;
        iterations += run.iterations;

        let improvement = best_val - run.objective;
        if run.objective < best_val {
            best_x = run.x;
            best_val = run.objective;
            converged = run.converged;
            reason = run.reason;
        }
        trace!(restarts, improvement, objective = best_val, "simplex restart");
        if !(improvement > options.tolerance) {
            break;
        }
    }

    if !best_val.is_finite() {
        converged = false;
        reason = TerminationReason::NumericalFailure;
    }

    Ok(OptimisationResult {
        x: best_x,
        objective: best_val,
        convergence: ConvergenceInfo {
            iterations,
            objective_evaluations: evals,
            restarts,
            converged,
            reason,
        },
    })
}

/// Vertices paired with their objective values; best first after [`Simplex::sort`].
struct Simplex {
    vertices: Vec<(Vec<f64>, f64)>,
}

impl Simplex {
    /// `x0` plus one axis step per coordinate, stepping down instead when up would
    /// leave the box.
    fn around(
        x0: &[f64],
        bounds: &BoxConstraints,
        step: f64,
        eval: &mut impl FnMut(&[f64]) -> f64,
    ) -> Self {
        let mut vertices = Vec::with_capacity(x0.len() + 1);
        vertices.push((x0.to_vec(), eval(x0)));
        for d in 0..x0.len() {
            let h = (bounds.upper[d] - bounds.lower[d]).abs() * step;
            let mut x = x0.to_vec();
            x[d] = if x0[d] + h <= bounds.upper[d] {
                x0[d] + h
            } else {
                x0[d] - h
            };
            let x = bounds.clamp(&x);
            let fx = eval(&x);
            vertices.push((x, fx));
        }
        Self { vertices }
    }

    fn sort(&mut self) {
        self.vertices.sort_by(|a, b| a.1.total_cmp(&b.1));
    }

    fn best(&self) -> &(Vec<f64>, f64) {
        &self.vertices[0]
    }

    fn worst(&self) -> &(Vec<f64>, f64) {
        &self.vertices[self.vertices.len() - 1]
    }

    fn second_worst_value(&self) -> f64 {
        self.vertices[self.vertices.len().saturating_sub(2)].1
    }

    /// Mean of every vertex except the worst.
    fn centroid(&self) -> Vec<f64> {
        let kept = &self.vertices[..self.vertices.len() - 1];
        let mut c = vec![0.0; self.best().0.len()];
        for (x, _) in kept {
            for (ci, xi) in c.iter_mut().zip(x) {
                *ci += xi;
            }
        }
        let k = kept.len().max(1) as f64;
        c.iter_mut().for_each(|ci| *ci /= k);
        c
    }

    /// Values agree to `tolerance` relative to the best value and the vertices sit
    /// within `sqrt(tolerance)` of the centroid.
    fn has_converged(&self, centroid: &[f64], tolerance: f64) -> bool {
        let best = self.best().1;
        let spread = (self.worst().1 - best).abs();
        let radius = self
            .vertices
            .iter()
            .map(|(x, _)| distance(x, centroid))
            .fold(0.0_f64, f64::max);
        spread <= tolerance * (1.0 + best.abs()) && radius <= tolerance.sqrt()
    }

    fn replace_worst(&mut self, x: Vec<f64>, fx: f64) {
        let last = self.vertices.len() - 1;
        self.vertices[last] = (x, fx);
    }

    /// Pulls every vertex towards the best one by `factor`.
    fn shrink(
        &mut self,
        factor: f64,
        bounds: &BoxConstraints,
        eval: &mut impl FnMut(&[f64]) -> f64,
    ) {
        let (head, rest) = self.vertices.split_at_mut(1);
        let best = &head[0].0;
        for vertex in rest {
            vertex.0 = along(best, &vertex.0, factor, bounds);
            vertex.1 = eval(&vertex.0);
        }
    }

    fn into_best(mut self) -> (Vec<f64>, f64) {
        self.sort();
        self.vertices.swap_remove(0)
    }
}

/// `origin + t * (target - origin)`, clamped into the box.
fn along(origin: &[f64], target: &[f64], t: f64, bounds: &BoxConstraints) -> Vec<f64> {
    let x: Vec<f64> = origin
        .iter()
        .zip(target)
        .map(|(o, p)| o + t * (p - o))
        .collect();
    bounds.clamp(&x)
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn simplex_search<F>(
    x0: &[f64],
    bounds: &BoxConstraints,
    options: &NelderMeadOptions,
    objective_fn: &mut F,
    evals: &mut usize,
) -> SimplexRun
where
    F: FnMut(&[f64]) -> f64,
{
    let mut eval = |x: &[f64]| {
        *evals += 1;
        objective_fn(x)
    };
    let mut simplex = Simplex::around(x0, bounds, options.initial_step.max(1e-4), &mut eval);

    let mut iterations = 0usize;
    let mut converged = false;
    let mut reason = TerminationReason::MaxIterations;

    while iterations < options.max_iterations {
        iterations += 1;
        simplex.sort();
        let centroid = simplex.centroid();
        if simplex.has_converged(&centroid, options.tolerance) {
            converged = true;
            reason = TerminationReason::ObjectiveTolerance;
            break;
        }

        let (worst, f_worst) = simplex.worst().clone();
        let reflected = along(&centroid, &worst, -options.reflection, bounds);
        let f_reflected = eval(&reflected);

        if f_reflected < simplex.best().1 {
            let expanded = along(&centroid, &reflected, options.expansion, bounds);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex.replace_worst(expanded, f_expanded);
            } else {
                simplex.replace_worst(reflected, f_reflected);
            }
        } else if f_reflected < simplex.second_worst_value() {
            simplex.replace_worst(reflected, f_reflected);
        } else {
            let contracted = along(&centroid, &worst, options.contraction, bounds);
            let f_contracted = eval(&contracted);
            if f_contracted < f_worst {
                simplex.replace_worst(contracted, f_contracted);
            } else {
                simplex.shrink(options.shrink, bounds, &mut eval);
            }
        }
    }

    let (x, objective) = simplex.into_best();
    SimplexRun {
        x,
        objective,
        iterations,
        converged,
        reason,
    }
}
