//! Error taxonomy for tail estimation and model fitting.
//!
//! Fitting and extrapolation failures are fatal and returned immediately. Degenerate
//! backtests are not errors: they are reported through
//! [`LikelihoodRatio::Undefined`](crate::risk::backtest::LikelihoodRatio::Undefined).

use thiserror::Error;

/// Errors surfaced by estimators, fitters and extrapolation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TailRiskError {
    /// No loss in the sample exceeds the peak-over-threshold level.
    #[error("no loss exceeds threshold {threshold}; choose a lower threshold")]
    EmptyExceedanceSet { threshold: f64 },

    /// The exceedance probability of a GPD parameter set is outside `(0, 1]`.
    #[error("exceedance probability must lie in (0, 1], got {0}")]
    InvalidExceedanceProbability(f64),

    /// Expected shortfall is infinite under the fitted tail (shape >= 1, or Student-t dof <= 1).
    #[error("tail mean is infinite for shape {shape}; expected shortfall is undefined")]
    NonFiniteTailMean { shape: f64 },

    /// The requested confidence level sits below the threshold of the tail model.
    #[error(
        "tail probability {tail_probability} exceeds 1; the confidence level lies below the threshold"
    )]
    ThresholdNotReached { tail_probability: f64 },

    /// Input validation error.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Maximum-likelihood optimizer did not reach a finite optimum.
    #[error("fit failure: {0}")]
    FitFailure(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TailRiskError>;

pub(crate) fn validate_confidence(alpha: f64) -> Result<()> {
    if alpha.is_finite() && alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(TailRiskError::InvalidInput(format!(
            "confidence must be in (0,1), got {alpha}"
        )))
    }
}

pub(crate) fn validate_nonempty_finite(values: &[f64], name: &str) -> Result<()> {
    if values.is_empty() {
        return Err(TailRiskError::InvalidInput(format!("{name} must not be empty")));
    }
    if values.iter().any(|x| !x.is_finite()) {
        return Err(TailRiskError::InvalidInput(format!(
            "{name} must contain only finite values"
        )));
    }
    Ok(())
}
