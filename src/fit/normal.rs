use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TailRiskError, validate_nonempty_finite};
use crate::fit::{FitResult, MaximumLikelihood};

const MIN_STD: f64 = 1.0e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalParams {
    pub mean: f64,
    pub std_dev: f64,
}

/// Closed-form normal MLE: sample mean and the `1/n` standard deviation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalMle;

impl MaximumLikelihood for NormalMle {
    type Params = NormalParams;

    fn family(&self) -> &'static str {
        "normal"
    }

    fn fit(&self, sample: &[f64]) -> Result<FitResult<NormalParams>> {
        validate_nonempty_finite(sample, "sample")?;
        let n = sample.len() as f64;
        let mean = sample.iter().sum::<f64>() / n;

        let mut var = 0.0;
        for &x in sample {
            let d = x - mean;
            var += d * d;
        }
        var /= n;
        if var < MIN_STD * MIN_STD {
            return Err(TailRiskError::InvalidInput(
                "sample has zero dispersion; normal scale is not identifiable".to_string(),
            ));
        }

        let std_dev = var.sqrt();
        let log_likelihood = -0.5 * n * ((2.0 * PI * var).ln() + 1.0);
        debug!(family = "normal", mean, std_dev, log_likelihood, "fitted");

        Ok(FitResult {
            params: NormalParams { mean, std_dev },
            log_likelihood,
            convergence: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn matches_population_moments() {
        let fit = NormalMle.fit(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_relative_eq!(fit.params.mean, 2.5, epsilon = 1e-15);
        assert_relative_eq!(fit.params.std_dev, 1.25_f64.sqrt(), epsilon = 1e-15);
        assert!(fit.convergence.is_none());
    }

    #[test]
    fn constant_sample_is_rejected() {
        assert!(NormalMle.fit(&[0.01; 10]).is_err());
        assert!(NormalMle.fit(&[]).is_err());
    }
}
