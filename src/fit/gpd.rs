//! Generalized Pareto maximum likelihood for threshold exceedances.
//!
//! With the location fixed at zero the excess `y >= 0` has density
//! - `f(y) = (1/beta) * (1 + xi * y / beta)^(-1/xi - 1)` for `xi != 0`,
//! - `f(y) = (1/beta) * exp(-y / beta)` for `xi = 0`,
//!
//! supported on `1 + xi * y / beta > 0`.
//!
//! The optimizer works on `[xi, ln(beta)]`. The shape is box-bounded: for `xi < -1` the
//! likelihood is unbounded at the sample maximum, so the default lower bound sits just
//! above `-1`. Between `-1` and `-0.5` the estimator is non-regular (Smith, 1985) but a
//! local maximum still exists. A fit that ends on a shape bound is logged at `warn`.
//!
//! References:
//! - Smith (1985), maximum likelihood in non-regular cases.
//! - Hosking and Wallis (1987), GPD parameter estimation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calibration::{BoxConstraints, NelderMeadOptions, nelder_mead};
use crate::error::{Result, TailRiskError};
use crate::fit::{FitResult, MaximumLikelihood};

const EXPONENTIAL_LIMIT: f64 = 1e-8;
/// Smallest shape for which the likelihood stays bounded.
const MIN_SHAPE: f64 = -1.0 + 1e-6;
/// Moment starts never exceed this shape: the moment estimator needs `xi < 0.5`.
const MAX_MOMENT_SHAPE: f64 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpdShapeScale {
    /// Tail shape `xi`.
    pub shape: f64,
    /// Scale `beta > 0`.
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpdMleOptions {
    pub optimizer: NelderMeadOptions,
    /// Admissible `(min, max)` tail shape.
    pub shape_bounds: (f64, f64),
}

impl Default for GpdMleOptions {
    fn default() -> Self {
        Self {
            optimizer: NelderMeadOptions::default(),
            shape_bounds: (MIN_SHAPE, 5.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GpdMle {
    pub options: GpdMleOptions,
}

impl GpdMle {
    pub fn new(options: GpdMleOptions) -> Self {
        Self { options }
    }
}

impl MaximumLikelihood for GpdMle {
    type Params = GpdShapeScale;

    fn family(&self) -> &'static str {
        "generalized_pareto"
    }

    fn fit(&self, exceedances: &[f64]) -> Result<FitResult<GpdShapeScale>> {
        if exceedances.is_empty() {
            return Err(TailRiskError::InvalidInput(
                "exceedances must not be empty".to_string(),
            ));
        }
        if exceedances.iter().any(|&y| !(y.is_finite() && y > 0.0)) {
            return Err(TailRiskError::InvalidInput(
                "exceedances must be strictly positive and finite".to_string(),
            ));
        }
        let (xi_lo, xi_hi) = self.options.shape_bounds;
        if !(xi_lo.is_finite() && xi_hi.is_finite() && xi_lo < xi_hi) {
            return Err(TailRiskError::InvalidInput(format!(
                "invalid shape bounds ({xi_lo}, {xi_hi})"
            )));
        }

        let (xi0, beta0) = moment_start(exceedances, xi_lo, xi_hi);
        let ln_beta0 = beta0.ln();
        let bounds = BoxConstraints::new(
            vec![xi_lo, ln_beta0 - 20.0],
            vec![xi_hi, ln_beta0 + 20.0],
        )?;

        let out = nelder_mead(&[xi0, ln_beta0], &bounds, self.options.optimizer, |x| {
            let ll = gpd_log_likelihood(exceedances, x[0], x[1].exp());
            if ll.is_finite() { -ll } else { f64::INFINITY }
        })?;

        if !out.objective.is_finite() {
            return Err(TailRiskError::FitFailure(
                "GPD likelihood is not finite at the optimum".to_string(),
            ));
        }
        if !out.convergence.converged {
            warn!(
                family = "generalized_pareto",
                iterations = out.convergence.iterations,
                "optimizer stopped before reaching tolerance"
            );
        }

        let params = GpdShapeScale {
            shape: out.x[0],
            scale: out.x[1].exp(),
        };
        if bounds.hits_boundary(&out.x[..1], 1e-9) {
            warn!(
                family = "generalized_pareto",
                xi = params.shape,
                shape_bounds = ?self.options.shape_bounds,
                "optimum lies on a shape bound; the unconstrained maximum is outside it"
            );
        }
        debug!(
            family = "generalized_pareto",
            xi = params.shape,
            beta = params.scale,
            n = exceedances.len(),
            log_likelihood = -out.objective,
            "fitted"
        );

        Ok(FitResult {
            params,
            log_likelihood: -out.objective,
            convergence: Some(out.convergence),
        })
    }
}

/// GPD log-likelihood of `exceedances` with location zero.
///
/// Returns `-inf` outside the parameter space or the support.
pub fn gpd_log_likelihood(exceedances: &[f64], shape: f64, scale: f64) -> f64 {
    if !(scale > 0.0 && scale.is_finite() && shape.is_finite()) {
        return f64::NEG_INFINITY;
    }
    let n = exceedances.len() as f64;
    let ln_scale = scale.ln();

    if shape.abs() < EXPONENTIAL_LIMIT {
        let sum_y: f64 = exceedances.iter().sum();
        return -n * ln_scale - sum_y / scale;
    }

    let power = 1.0 + 1.0 / shape;
    let mut ll = -n * ln_scale;
    for &y in exceedances {
        if y < 0.0 {
            return f64::NEG_INFINITY;
        }
        let t = 1.0 + shape * y / scale;
        if t <= 0.0 {
            return f64::NEG_INFINITY;
        }
        ll -= power * t.ln();
    }
    ll
}

/// Method-of-moments starting point, pulled inside the shape bounds.
///
/// `mean = beta / (1 - xi)` and `mean^2 / var = 1 - 2 xi`.
fn moment_start(exceedances: &[f64], xi_lo: f64, xi_hi: f64) -> (f64, f64) {
    let n = exceedances.len() as f64;
    let mean = exceedances.iter().sum::<f64>() / n;
    let var = exceedances.iter().map(|y| (y - mean) * (y - mean)).sum::<f64>() / n;

    let xi = if var > 0.0 {
        0.5 * (1.0 - mean * mean / var)
    } else {
        0.0
    };
    let margin = 0.05 * (xi_hi - xi_lo);
    let lo = xi_lo + margin;
    let hi = (xi_hi - margin).min(MAX_MOMENT_SHAPE).max(lo);
    let xi = xi.clamp(lo, hi);
    let beta = (mean * (1.0 - xi)).max(mean * 1e-3);
    // The start must lie inside the support: 1 + xi * y_max / beta > 0.
    let y_max = exceedances.iter().copied().fold(0.0_f64, f64::max);
    let beta = if xi < 0.0 {
        beta.max(-xi * y_max * 1.01)
    } else {
        beta
    };
    (xi, beta)
}
