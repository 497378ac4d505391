//! Closed-form VaR/ES under Normal and location-scale Student-t return models.
//!
//! With `z = Q(1 - alpha)` the lower-tail quantile of the standardised model:
//! - Normal: `VaR = -(mu + sigma z)`, `ES = -(mu - sigma phi(z) / (1 - alpha))`,
//! - Student-t: `VaR = -(loc + scale t)`,
//!   `ES = -(loc - scale * f_nu(t) (nu + t^2) / ((1 - alpha)(nu - 1)))`.
//!
//! The Student-t ES is finite only for `nu > 1`.
//!
//! References:
//! - McNeil, Frey, Embrechts, *Quantitative Risk Management* (2015), Ex. 2.14 and 2.15.

use statrs::distribution::{Continuous, ContinuousCDF, StudentsT};

use crate::error::{Result, TailRiskError, validate_confidence, validate_nonempty_finite};
use crate::fit::{MaximumLikelihood, NormalParams, StudentTMle, StudentTParams};
use crate::math::{normal_inv_cdf, normal_pdf};

/// Normal VaR in loss units.
///
/// # Examples
/// ```rust
/// use tailrisk::risk::parametric_var_normal;
///
/// let var_99 = parametric_var_normal(0.0, 1.0, 0.99).unwrap();
/// assert!((var_99 - 2.326_347_874).abs() < 1e-6);
/// ```
pub fn parametric_var_normal(mu: f64, sigma: f64, alpha: f64) -> Result<f64> {
    validate_location_scale(mu, sigma)?;
    validate_confidence(alpha)?;
    let z = normal_inv_cdf(1.0 - alpha);
    Ok(-(mu + sigma * z))
}

/// Normal Expected Shortfall in loss units.
pub fn parametric_es_normal(mu: f64, sigma: f64, alpha: f64) -> Result<f64> {
    validate_location_scale(mu, sigma)?;
    validate_confidence(alpha)?;
    let z = normal_inv_cdf(1.0 - alpha);
    Ok(-(mu - sigma * normal_pdf(z) / (1.0 - alpha)))
}

/// Student-t VaR in loss units for returns `r = loc + scale * T_df`.
pub fn parametric_var_t(df: f64, loc: f64, scale: f64, alpha: f64) -> Result<f64> {
    validate_location_scale(loc, scale)?;
    validate_confidence(alpha)?;
    let t = standard_t(df)?.inverse_cdf(1.0 - alpha);
    Ok(-(loc + scale * t))
}

/// Student-t Expected Shortfall in loss units.
///
/// Fails with [`TailRiskError::NonFiniteTailMean`] when `df <= 1`; the reported shape
/// is the equivalent tail index `1 / df`.
pub fn parametric_es_t(df: f64, loc: f64, scale: f64, alpha: f64) -> Result<f64> {
    validate_location_scale(loc, scale)?;
    validate_confidence(alpha)?;
    let dist = standard_t(df)?;
    if df <= 1.0 {
        return Err(TailRiskError::NonFiniteTailMean { shape: 1.0 / df });
    }

    let t = dist.inverse_cdf(1.0 - alpha);
    let es_standard = dist.pdf(t) / ((1.0 - alpha) * (df - 1.0)) * (df + t * t);
    Ok(-(loc - scale * es_standard))
}

/// Mean and sample standard deviation (`n - 1` denominator) of a return sample.
pub fn fit_normal_params(returns: &[f64]) -> Result<NormalParams> {
    validate_nonempty_finite(returns, "returns")?;
    if returns.len() < 2 {
        return Err(TailRiskError::InvalidInput(
            "normal fit requires at least two observations".to_string(),
        ));
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
    Ok(NormalParams {
        mean,
        std_dev: var.sqrt(),
    })
}

/// Student-t maximum-likelihood parameters of a return sample.
pub fn fit_t_params(returns: &[f64]) -> Result<StudentTParams> {
    StudentTMle::default().fit(returns).map(|fit| fit.params)
}

fn standard_t(df: f64) -> Result<StudentsT> {
    if !(df.is_finite() && df > 0.0) {
        return Err(TailRiskError::InvalidInput(format!(
            "degrees of freedom must be finite and > 0, got {df}"
        )));
    }
    StudentsT::new(0.0, 1.0, df).map_err(|e| TailRiskError::InvalidInput(e.to_string()))
}

fn validate_location_scale(location: f64, scale: f64) -> Result<()> {
    if !location.is_finite() {
        return Err(TailRiskError::InvalidInput(
            "location must be finite".to_string(),
        ));
    }
    if !(scale.is_finite() && scale >= 0.0) {
        return Err(TailRiskError::InvalidInput(
            "scale must be finite and >= 0".to_string(),
        ));
    }
    Ok(())
}
