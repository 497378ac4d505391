//! Shared optimizer abstractions: box constraints and convergence metadata.
//!
//! References:
//! - Nocedal and Wright, *Numerical Optimization* (2nd ed.), Ch. 9 (derivative-free methods).

use serde::{Deserialize, Serialize};

use crate::error::{Result, TailRiskError};

/// Box constraints `lower <= x <= upper` used by the optimizers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxConstraints {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl BoxConstraints {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.is_empty() || lower.len() != upper.len() {
            return Err(TailRiskError::InvalidInput(
                "constraints require same non-zero lower/upper dimensions".to_string(),
            ));
        }
        for i in 0..lower.len() {
            if !lower[i].is_finite() || !upper[i].is_finite() || lower[i] > upper[i] {
                return Err(TailRiskError::InvalidInput(format!(
                    "invalid bound at index {i}: [{}, {}]",
                    lower[i], upper[i]
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    pub fn clamp(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .enumerate()
            .map(|(i, v)| v.clamp(self.lower[i], self.upper[i]))
            .collect()
    }

    pub fn hits_boundary(&self, x: &[f64], eps: f64) -> bool {
        x.iter().enumerate().any(|(i, &v)| {
            (v - self.lower[i]).abs() <= eps.max(1e-12)
                || (self.upper[i] - v).abs() <= eps.max(1e-12)
        })
    }
}

/// Optimizer termination reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    ObjectiveTolerance,
    MaxIterations,
    NumericalFailure,
}

/// Convergence metadata for optimization runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    pub iterations: usize,
    pub objective_evaluations: usize,
    /// Number of simplex re-initialisations performed after the first run.
    pub restarts: usize,
    pub converged: bool,
    pub reason: TerminationReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_bounds() {
        assert!(BoxConstraints::new(vec![1.0], vec![0.0]).is_err());
        assert!(BoxConstraints::new(vec![], vec![]).is_err());
        assert!(BoxConstraints::new(vec![0.0, f64::NAN], vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn clamp_and_boundary_detection() {
        let b = BoxConstraints::new(vec![-0.5, -3.0], vec![5.0, 3.0]).unwrap();
        assert_eq!(b.clamp(&[-1.0, 4.0]), vec![-0.5, 3.0]);
        assert!(b.hits_boundary(&[-0.5, 0.0], 1e-9));
        assert!(!b.hits_boundary(&[0.1, 0.0], 1e-9));
    }
}
