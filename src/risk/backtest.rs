//! VaR backtesting: Kupiec unconditional coverage and Christoffersen independence.
//!
//! Both tests work on the exceedance indicator `I_t = 1{-r_t > VaR_t}` over the
//! inner join of the return and VaR series, and both report chi-square(1) p-values.
//! When the counts make the likelihood ratio degenerate the result is
//! [`LikelihoodRatio::Undefined`] rather than an error.
//!
//! Only the independence component of Christoffersen (1998) is computed; the
//! conditional-coverage statistic `LR_uc + LR_ind` is not formed here.
//!
//! References:
//! - Kupiec (1995), techniques for verifying the accuracy of risk measurement models.
//! - Christoffersen (1998), evaluating interval forecasts.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, TailRiskError, validate_confidence};
use crate::math::{chi_square_1_sf, count_log_term};
use crate::series::{TimeSeries, align};

/// Likelihood-ratio outcome; `Undefined` when the counts leave the ratio degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LikelihoodRatio {
    Computed { statistic: f64, p_value: f64 },
    Undefined,
}

impl LikelihoodRatio {
    fn from_statistic(statistic: f64) -> Self {
        let statistic = statistic.max(0.0);
        Self::Computed {
            statistic,
            p_value: chi_square_1_sf(statistic),
        }
    }

    pub fn statistic(&self) -> Option<f64> {
        match self {
            Self::Computed { statistic, .. } => Some(*statistic),
            Self::Undefined => None,
        }
    }

    pub fn p_value(&self) -> Option<f64> {
        match self {
            Self::Computed { p_value, .. } => Some(*p_value),
            Self::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Whether the null is rejected at `significance`; an undefined test never rejects.
    pub fn rejects(&self, significance: f64) -> bool {
        self.p_value().is_some_and(|p| p < significance)
    }
}

/// Kupiec proportion-of-failures test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KupiecResult {
    pub likelihood_ratio: LikelihoodRatio,
    /// Number of exceedances `n1`.
    pub exceedances: usize,
    /// Number of aligned observations `n`.
    pub observations: usize,
    /// `n * (1 - alpha)`.
    pub expected_exceedances: f64,
}

impl KupiecResult {
    /// `n1 / n`, or `None` with no observations.
    pub fn exceedance_rate(&self) -> Option<f64> {
        (self.observations > 0).then(|| self.exceedances as f64 / self.observations as f64)
    }
}

/// First-order transition counts of an exceedance indicator sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransitionCounts {
    pub n00: usize,
    pub n01: usize,
    pub n10: usize,
    pub n11: usize,
}

impl TransitionCounts {
    pub fn from_indicators(indicators: &[bool]) -> Self {
        let mut counts = Self::default();
        for pair in indicators.windows(2) {
            match (pair[0], pair[1]) {
                (false, false) => counts.n00 += 1,
                (false, true) => counts.n01 += 1,
                (true, false) => counts.n10 += 1,
                (true, true) => counts.n11 += 1,
            }
        }
        counts
    }

    /// Transitions out of the non-exceedance state.
    pub fn from_calm(&self) -> usize {
        self.n00 + self.n01
    }

    /// Transitions out of the exceedance state.
    pub fn from_exceedance(&self) -> usize {
        self.n10 + self.n11
    }
}

/// Christoffersen independence test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChristoffersenResult {
    pub likelihood_ratio: LikelihoodRatio,
    pub transitions: TransitionCounts,
}

/// Both tests evaluated on the same aligned sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarBacktest {
    pub kupiec: KupiecResult,
    pub christoffersen: ChristoffersenResult,
}

/// `-r_t > VaR_t` for each aligned pair.
pub fn exceedance_indicators(returns: &[f64], var_series: &[f64]) -> Vec<bool> {
    returns
        .iter()
        .zip(var_series)
        .map(|(r, v)| -r > *v)
        .collect()
}

/// Kupiec test over the shared keys of a return series and a VaR series.
///
/// # Examples
/// ```rust
/// use tailrisk::risk::kupiec_test;
/// use tailrisk::series::TimeSeries;
///
/// let returns = TimeSeries::from_values(&[0.01; 100]);
/// let var = TimeSeries::from_values(&[0.02; 100]);
/// let result = kupiec_test(&returns, &var, 0.99).unwrap();
///
/// assert!(result.likelihood_ratio.is_undefined());
/// assert_eq!((result.exceedances, result.observations), (0, 100));
/// ```
pub fn kupiec_test<K: Ord + Clone>(
    returns: &TimeSeries<K>,
    var_series: &TimeSeries<K>,
    alpha: f64,
) -> Result<KupiecResult> {
    let aligned = align(returns, var_series);
    kupiec_test_aligned(&aligned.left, &aligned.right, alpha)
}

/// Kupiec test on pre-aligned slices.
pub fn kupiec_test_aligned(
    returns: &[f64],
    var_series: &[f64],
    alpha: f64,
) -> Result<KupiecResult> {
    validate_confidence(alpha)?;
    let indicators = validated_indicators(returns, var_series)?;
    Ok(kupiec_from_indicators(&indicators, alpha))
}

/// Christoffersen independence test over the shared keys of the two series.
///
/// `alpha` is validated for interface symmetry with [`kupiec_test`]; the independence
/// statistic does not depend on it.
pub fn christoffersen_test<K: Ord + Clone>(
    returns: &TimeSeries<K>,
    var_series: &TimeSeries<K>,
    alpha: f64,
) -> Result<ChristoffersenResult> {
    let aligned = align(returns, var_series);
    christoffersen_test_aligned(&aligned.left, &aligned.right, alpha)
}

/// Christoffersen independence test on pre-aligned slices.
pub fn christoffersen_test_aligned(
    returns: &[f64],
    var_series: &[f64],
    alpha: f64,
) -> Result<ChristoffersenResult> {
    validate_confidence(alpha)?;
    let indicators = validated_indicators(returns, var_series)?;
    Ok(christoffersen_from_indicators(&indicators))
}

/// Runs both tests on one alignment of the two series.
pub fn backtest_var<K: Ord + Clone>(
    returns: &TimeSeries<K>,
    var_series: &TimeSeries<K>,
    alpha: f64,
) -> Result<VarBacktest> {
    let aligned = align(returns, var_series);
    backtest_var_aligned(&aligned.left, &aligned.right, alpha)
}

/// Runs both tests on pre-aligned slices.
pub fn backtest_var_aligned(
    returns: &[f64],
    var_series: &[f64],
    alpha: f64,
) -> Result<VarBacktest> {
    validate_confidence(alpha)?;
    let indicators = validated_indicators(returns, var_series)?;
    Ok(VarBacktest {
        kupiec: kupiec_from_indicators(&indicators, alpha),
        christoffersen: christoffersen_from_indicators(&indicators),
    })
}

fn validated_indicators(returns: &[f64], var_series: &[f64]) -> Result<Vec<bool>> {
    if returns.len() != var_series.len() {
        return Err(TailRiskError::InvalidInput(format!(
            "returns and VaR series length mismatch: {} vs {}",
            returns.len(),
            var_series.len()
        )));
    }
    if returns.iter().chain(var_series).any(|x| !x.is_finite()) {
        return Err(TailRiskError::InvalidInput(
            "returns and VaR series must contain only finite values".to_string(),
        ));
    }
    Ok(exceedance_indicators(returns, var_series))
}

fn kupiec_from_indicators(indicators: &[bool], alpha: f64) -> KupiecResult {
    let n = indicators.len();
    let n1 = indicators.iter().filter(|&&hit| hit).count();
    let pi0 = 1.0 - alpha;
    trace!(exceedances = n1, observations = n, "kupiec counts");

    let likelihood_ratio = if n1 == 0 || n1 == n {
        LikelihoodRatio::Undefined
    } else {
        let pi_hat = n1 as f64 / n as f64;
        let null = count_log_term(n1, pi0) + count_log_term(n - n1, 1.0 - pi0);
        let alt = count_log_term(n1, pi_hat) + count_log_term(n - n1, 1.0 - pi_hat);
        LikelihoodRatio::from_statistic(-2.0 * (null - alt))
    };

    KupiecResult {
        likelihood_ratio,
        exceedances: n1,
        observations: n,
        expected_exceedances: n as f64 * pi0,
    }
}

fn christoffersen_from_indicators(indicators: &[bool]) -> ChristoffersenResult {
    let t = TransitionCounts::from_indicators(indicators);
    let (n0, n1) = (t.from_calm(), t.from_exceedance());
    trace!(n00 = t.n00, n01 = t.n01, n10 = t.n10, n11 = t.n11, "christoffersen transitions");

    let likelihood_ratio = if n0 == 0 || n1 == 0 {
        LikelihoodRatio::Undefined
    } else {
        let pi01 = t.n01 as f64 / n0 as f64;
        let pi11 = t.n11 as f64 / n1 as f64;
        let pi = (t.n01 + t.n11) as f64 / (n0 + n1) as f64;

        let null = count_log_term(t.n00, 1.0 - pi)
            + count_log_term(t.n01, pi)
            + count_log_term(t.n10, 1.0 - pi)
            + count_log_term(t.n11, pi);
        let alt = count_log_term(t.n00, 1.0 - pi01)
            + count_log_term(t.n01, pi01)
            + count_log_term(t.n10, 1.0 - pi11)
            + count_log_term(t.n11, pi11);
        LikelihoodRatio::from_statistic(-2.0 * (null - alt))
    };

    ChristoffersenResult {
        likelihood_ratio,
        transitions: t,
    }
}
