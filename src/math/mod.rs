//! Scalar special functions shared by the estimators and backtests.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

pub fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Inverse of the standard normal CDF.
///
/// Returns `-inf`/`+inf` at the closed bounds and `NaN` outside `[0, 1]`.
pub fn normal_inv_cdf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    Normal::standard().inverse_cdf(p)
}

/// Upper-tail probability of a chi-square distribution with one degree of freedom.
///
/// Non-positive statistics map to 1. Uses the survival function directly so small
/// p-values keep their precision.
pub fn chi_square_1_sf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(1.0) {
        Ok(chi) => chi.sf(x),
        Err(_) => f64::NAN,
    }
}

/// Bernoulli log-likelihood term `count * ln(p)` with the convention `0 * ln(0) = 0`.
///
/// A non-positive probability contributes zero rather than `-inf`.
#[inline]
pub fn count_log_term(count: usize, p: f64) -> f64 {
    if count == 0 || p <= 0.0 {
        0.0
    } else {
        count as f64 * p.ln()
    }
}
