//! Location-scale Student-t maximum likelihood.
//!
//! Parameterised internally as `[location, ln(scale), ln(nu)]` so the simplex moves on an
//! unconstrained scale/dof axis inside box bounds.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;
use tracing::{debug, warn};

use crate::calibration::{BoxConstraints, NelderMeadOptions, nelder_mead};
use crate::error::{Result, TailRiskError, validate_nonempty_finite};
use crate::fit::{FitResult, MaximumLikelihood};

const MIN_STD: f64 = 1.0e-12;
const INITIAL_DOF: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudentTParams {
    pub degrees_of_freedom: f64,
    pub location: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudentTMleOptions {
    pub optimizer: NelderMeadOptions,
    /// Admissible `(min, max)` degrees of freedom.
    pub dof_bounds: (f64, f64),
}

impl Default for StudentTMleOptions {
    fn default() -> Self {
        Self {
            optimizer: NelderMeadOptions::default(),
            dof_bounds: (1.05, 200.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StudentTMle {
    pub options: StudentTMleOptions,
}

impl StudentTMle {
    pub fn new(options: StudentTMleOptions) -> Self {
        Self { options }
    }
}

impl MaximumLikelihood for StudentTMle {
    type Params = StudentTParams;

    fn family(&self) -> &'static str {
        "student_t"
    }

    fn fit(&self, sample: &[f64]) -> Result<FitResult<StudentTParams>> {
        validate_nonempty_finite(sample, "sample")?;
        if sample.len() < 2 {
            return Err(TailRiskError::InvalidInput(
                "student-t fit requires at least two observations".to_string(),
            ));
        }
        let (dof_lo, dof_hi) = self.options.dof_bounds;
        if !(dof_lo > 0.0 && dof_lo < dof_hi && dof_hi.is_finite()) {
            return Err(TailRiskError::InvalidInput(format!(
                "invalid degrees-of-freedom bounds ({dof_lo}, {dof_hi})"
            )));
        }

        let n = sample.len() as f64;
        let mean = sample.iter().sum::<f64>() / n;
        let std = (sample.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0)).sqrt();
        if std < MIN_STD {
            return Err(TailRiskError::InvalidInput(
                "sample has zero dispersion; student-t scale is not identifiable".to_string(),
            ));
        }
        let (min, max) = sample
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });

        let nu0 = INITIAL_DOF.clamp(dof_lo, dof_hi);
        let scale0 = std * ((nu0 - 2.0).max(0.5) / nu0).sqrt();
        let ln_std = std.ln();
        let bounds = BoxConstraints::new(
            vec![min, ln_std - 10.0, dof_lo.ln()],
            vec![max, ln_std + 5.0, dof_hi.ln()],
        )?;

        let out = nelder_mead(
            &[mean, scale0.ln(), nu0.ln()],
            &bounds,
            self.options.optimizer,
            |x| {
                let ll = student_t_log_likelihood(sample, x[0], x[1].exp(), x[2].exp());
                if ll.is_finite() { -ll } else { f64::INFINITY }
            },
        )?;

        if !out.objective.is_finite() {
            return Err(TailRiskError::FitFailure(
                "student-t likelihood is not finite at the optimum".to_string(),
            ));
        }
        if !out.convergence.converged {
            warn!(
                family = "student_t",
                iterations = out.convergence.iterations,
                "optimizer stopped before reaching tolerance"
            );
        }

        let params = StudentTParams {
            location: out.x[0],
            scale: out.x[1].exp(),
            degrees_of_freedom: out.x[2].exp(),
        };
        debug!(
            family = "student_t",
            df = params.degrees_of_freedom,
            location = params.location,
            scale = params.scale,
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

/// Log-likelihood of a location-scale Student-t sample.
pub fn student_t_log_likelihood(values: &[f64], mu: f64, scale: f64, nu: f64) -> f64 {
    if !(scale > 0.0 && nu > 0.0) {
        return f64::NEG_INFINITY;
    }
    let a = ln_gamma((nu + 1.0) * 0.5) - ln_gamma(nu * 0.5);
    let b = -0.5 * (nu * PI).ln() - scale.ln();
    values
        .iter()
        .map(|&x| {
            let z = (x - mu) / scale;
            a + b - 0.5 * (nu + 1.0) * (1.0 + (z * z) / nu).ln()
        })
        .sum::<f64>()
}
