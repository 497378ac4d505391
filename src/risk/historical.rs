//! Empirical (historical-simulation) VaR and ES.
//!
//! `VaR_alpha = -q_{1-alpha}(returns)` with linearly interpolated order statistics
//! (rank `p * (n - 1)`), and `ES_alpha = -E[r | r <= q_{1-alpha}]`. Both are reported in
//! loss units; they are not floored at zero, so a sample of pure gains yields a
//! negative VaR.

use crate::error::{Result, validate_confidence, validate_nonempty_finite};

/// Historical Value-at-Risk from a return sample.
///
/// # Examples
/// ```rust
/// use tailrisk::risk::historical_var;
///
/// let returns = [-0.05, -0.03, -0.07, -0.02, -0.10];
/// let var_80 = historical_var(&returns, 0.8).unwrap();
/// assert!((var_80 - 0.076).abs() < 1e-12);
/// ```
pub fn historical_var(returns: &[f64], alpha: f64) -> Result<f64> {
    validate_inputs(returns, alpha)?;
    let mut sample = returns.to_vec();
    Ok(-empirical_quantile(&mut sample, 1.0 - alpha))
}

/// Historical Expected Shortfall: mean loss over returns at or below the VaR quantile.
///
/// # Examples
/// ```rust
/// use tailrisk::risk::{historical_es, historical_var};
///
/// let returns = [-3.0, -2.0, -1.0, 0.5, 1.0];
/// let var_95 = historical_var(&returns, 0.95).unwrap();
/// let es_95 = historical_es(&returns, 0.95).unwrap();
/// assert!(es_95 >= var_95);
/// ```
pub fn historical_es(returns: &[f64], alpha: f64) -> Result<f64> {
    validate_inputs(returns, alpha)?;
    let mut sample = returns.to_vec();
    let q = empirical_quantile(&mut sample, 1.0 - alpha);

    // `sample` is sorted, so the tail is a prefix and never empty (min <= q).
    let tail_len = sample.partition_point(|&r| r <= q);
    let tail_mean = sample[..tail_len].iter().sum::<f64>() / tail_len as f64;
    Ok(-tail_mean)
}

fn validate_inputs(returns: &[f64], alpha: f64) -> Result<()> {
    validate_nonempty_finite(returns, "returns")?;
    validate_confidence(alpha)
}

/// Sorts `sample` in place and returns its linearly interpolated `p`-quantile.
pub(crate) fn empirical_quantile(sample: &mut [f64], p: f64) -> f64 {
    sample.sort_by(|a, b| a.total_cmp(b));
    if sample.len() == 1 {
        return sample[0];
    }

    let rank = p * (sample.len() as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sample[lo]
    } else {
        let w = rank - lo as f64;
        sample[lo] + w * (sample[hi] - sample[lo])
    }
}
