//! Peak-over-threshold tail estimation with a Generalized Pareto model.
//!
//! Losses are `L = -r`. For a caller-chosen threshold `u` the excesses
//! `{L - u : L > u}` are fitted with a two-parameter GPD (shape `xi`, scale `beta`,
//! location zero) and the empirical exceedance probability `p = N_u / n` is recorded.
//! Tail measures at confidence `alpha` follow from `P(L > x) = p * S_gpd(x - u)`:
//!
//! ```text
//! q   = (1 - alpha) / p                       (must be <= 1)
//! VaR = u + beta / xi * (q^(-xi) - 1)         (xi != 0)
//! VaR = u - beta * ln(q)                      (xi -> 0)
//! ES  = (VaR + beta - xi * u) / (1 - xi)      (xi < 1)
//! ```
//!
//! VaR stays finite for every shape; ES is reported as
//! [`TailRiskError::NonFiniteTailMean`] once `xi >= 1`.
//!
//! References:
//! - Balkema and de Haan (1974), Pickands (1975), excess distributions over high thresholds.
//! - McNeil, Frey, Embrechts, *Quantitative Risk Management* (2015), Sec. 5.2.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calibration::ConvergenceInfo;
use crate::error::{Result, TailRiskError, validate_confidence, validate_nonempty_finite};
use crate::fit::{GpdMle, GpdShapeScale, MaximumLikelihood};

/// Controls the extrapolation formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtrapolationOptions {
    /// Shapes with `|xi| < shape_epsilon` use the exponential limit.
    pub shape_epsilon: f64,
}

impl Default for ExtrapolationOptions {
    fn default() -> Self {
        Self {
            shape_epsilon: 1e-8,
        }
    }
}

/// Fitted peak-over-threshold tail model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpdParameters {
    /// Tail shape `xi`; `xi >= 1` means the tail mean is infinite.
    pub shape: f64,
    /// Scale `beta > 0`.
    pub scale: f64,
    /// Threshold `u` in loss units.
    pub threshold: f64,
    /// Fraction of the sample whose loss exceeds `u`.
    pub exceedance_probability: f64,
}

/// Full output of a threshold fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpdFit {
    pub params: GpdParameters,
    /// Number of losses above the threshold.
    pub exceedances: usize,
    /// Sample size the exceedance probability is measured against.
    pub observations: usize,
    pub log_likelihood: f64,
    pub convergence: Option<ConvergenceInfo>,
}

impl GpdParameters {
    pub fn new(shape: f64, scale: f64, threshold: f64, exceedance_probability: f64) -> Self {
        Self {
            shape,
            scale,
            threshold,
            exceedance_probability,
        }
    }

    /// Whether Expected Shortfall exists under this model.
    pub fn has_finite_tail_mean(&self) -> bool {
        self.shape < 1.0
    }

    /// Value-at-Risk at confidence `alpha`, valid for any shape.
    pub fn var(&self, alpha: f64, options: &ExtrapolationOptions) -> Result<f64> {
        let q = self.tail_quantile_level(alpha)?;
        let (xi, beta, u) = (self.shape, self.scale, self.threshold);

        let var = if xi.abs() < options.shape_epsilon {
            u - beta * q.ln()
        } else {
            u + beta / xi * (q.powf(-xi) - 1.0)
        };
        Ok(var)
    }

    /// Expected Shortfall at confidence `alpha`.
    ///
    /// Fails with [`TailRiskError::NonFiniteTailMean`] when `shape >= 1`.
    pub fn expected_shortfall(&self, alpha: f64, options: &ExtrapolationOptions) -> Result<f64> {
        let var = self.var(alpha, options)?;
        if !self.has_finite_tail_mean() {
            return Err(TailRiskError::NonFiniteTailMean { shape: self.shape });
        }
        let (xi, beta, u) = (self.shape, self.scale, self.threshold);
        Ok((var + beta - xi * u) / (1.0 - xi))
    }

    /// Model probability that the loss exceeds `loss` (for `loss >= threshold`).
    ///
    /// Below the threshold the model says nothing; the empirical mass `p` is returned.
    pub fn survival(&self, loss: f64, options: &ExtrapolationOptions) -> f64 {
        let y = (loss - self.threshold).max(0.0);
        let (xi, beta) = (self.shape, self.scale);
        let survival = if xi.abs() < options.shape_epsilon {
            (-y / beta).exp()
        } else {
            let t = 1.0 + xi * y / beta;
            if t <= 0.0 { 0.0 } else { t.powf(-1.0 / xi) }
        };
        self.exceedance_probability * survival
    }

    /// `(1 - alpha) / p`, after validating the parameter set and `alpha`.
    fn tail_quantile_level(&self, alpha: f64) -> Result<f64> {
        validate_confidence(alpha)?;
        let p = self.exceedance_probability;
        if !(p > 0.0 && p <= 1.0) {
            return Err(TailRiskError::InvalidExceedanceProbability(p));
        }
        if !(self.shape.is_finite() && self.threshold.is_finite()) {
            return Err(TailRiskError::InvalidInput(
                "shape and threshold must be finite".to_string(),
            ));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(TailRiskError::InvalidInput(format!(
                "scale must be finite and > 0, got {}",
                self.scale
            )));
        }

        let q = (1.0 - alpha) / p;
        if q > 1.0 {
            return Err(TailRiskError::ThresholdNotReached {
                tail_probability: q,
            });
        }
        Ok(q)
    }
}

/// Fits the tail model above `threshold` with the default GPD maximum-likelihood fitter.
///
/// # Examples
/// ```rust
/// use tailrisk::risk::{fit_gpd, gpd_var_es};
///
/// let returns: Vec<f64> = (1..=200).map(|i| -0.0005 * i as f64).collect();
/// let params = fit_gpd(&returns, 0.0801).unwrap();
/// assert!((params.exceedance_probability - 0.2).abs() < 1e-12);
///
/// let (var, es) = gpd_var_es(&params, 0.99).unwrap();
/// assert!(var > 0.0801 && es >= var);
/// ```
pub fn fit_gpd(returns: &[f64], threshold: f64) -> Result<GpdParameters> {
    fit_gpd_with(returns, threshold, &GpdMle::default()).map(|fit| fit.params)
}

/// Fits the tail model above `threshold` with any GPD maximum-likelihood implementation.
pub fn fit_gpd_with<F>(returns: &[f64], threshold: f64, fitter: &F) -> Result<GpdFit>
where
    F: MaximumLikelihood<Params = GpdShapeScale>,
{
    validate_nonempty_finite(returns, "returns")?;
    if !threshold.is_finite() {
        return Err(TailRiskError::InvalidInput(
            "threshold must be finite".to_string(),
        ));
    }

    let excesses = threshold_excesses(returns, threshold);
    if excesses.is_empty() {
        return Err(TailRiskError::EmptyExceedanceSet { threshold });
    }

    let fit = fitter.fit(&excesses)?;
    let params = GpdParameters {
        shape: fit.params.shape,
        scale: fit.params.scale,
        threshold,
        exceedance_probability: excesses.len() as f64 / returns.len() as f64,
    };
    debug!(
        family = fitter.family(),
        threshold,
        exceedances = excesses.len(),
        observations = returns.len(),
        xi = params.shape,
        beta = params.scale,
        "threshold model fitted"
    );

    Ok(GpdFit {
        params,
        exceedances: excesses.len(),
        observations: returns.len(),
        log_likelihood: fit.log_likelihood,
        convergence: fit.convergence,
    })
}

/// Fits one tail model per threshold, preserving threshold order.
///
/// Fits are independent; with the `parallel` feature they run on the rayon pool.
pub fn fit_gpd_thresholds(returns: &[f64], thresholds: &[f64]) -> Vec<Result<GpdParameters>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        thresholds.par_iter().map(|&u| fit_gpd(returns, u)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        thresholds.iter().map(|&u| fit_gpd(returns, u)).collect()
    }
}

/// Excess losses `{-r - u : -r > u}`.
pub fn threshold_excesses(returns: &[f64], threshold: f64) -> Vec<f64> {
    returns
        .iter()
        .map(|r| -r)
        .filter(|&loss| loss > threshold)
        .map(|loss| loss - threshold)
        .collect()
}

/// Tail VaR at `alpha`; defined for every fitted shape.
pub fn gpd_var(params: &GpdParameters, alpha: f64) -> Result<f64> {
    params.var(alpha, &ExtrapolationOptions::default())
}

/// Tail Expected Shortfall at `alpha`; fails for `shape >= 1`.
pub fn gpd_es(params: &GpdParameters, alpha: f64) -> Result<f64> {
    params.expected_shortfall(alpha, &ExtrapolationOptions::default())
}

/// Model tail probability `P(L > loss)` with default extrapolation options.
pub fn gpd_survival(params: &GpdParameters, loss: f64) -> f64 {
    params.survival(loss, &ExtrapolationOptions::default())
}

/// `(VaR, ES)` at `alpha` in loss units.
pub fn gpd_var_es(params: &GpdParameters, alpha: f64) -> Result<(f64, f64)> {
    let options = ExtrapolationOptions::default();
    let var = params.var(alpha, &options)?;
    let es = params.expected_shortfall(alpha, &options)?;
    Ok((var, es))
}
