//! Run configuration for a peak-over-threshold tail evaluation.
//!
//! # Examples
//! ```rust
//! use tailrisk::core::{TailRiskConfig, from_json};
//!
//! let cfg: TailRiskConfig = from_json(r#"{ "confidence": 0.99, "threshold": 0.02 }"#).unwrap();
//! assert!(cfg.validate().is_ok());
//! assert_eq!(cfg.gpd.shape_bounds, (-1.0 + 1e-6, 5.0));
//! ```

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::serialization::TailRiskReport;
use crate::error::{Result, TailRiskError, validate_confidence};
use crate::fit::{GpdMle, GpdMleOptions};
use crate::risk::{ExtrapolationOptions, GpdFit, TailEstimator, fit_gpd_with};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailRiskConfig {
    /// Confidence level `alpha` in `(0, 1)`.
    pub confidence: f64,
    /// Peak-over-threshold level in loss units.
    pub threshold: f64,
    #[serde(default)]
    pub extrapolation: ExtrapolationOptions,
    #[serde(default)]
    pub gpd: GpdMleOptions,
}

impl TailRiskConfig {
    pub fn new(confidence: f64, threshold: f64) -> Self {
        Self {
            confidence,
            threshold,
            extrapolation: ExtrapolationOptions::default(),
            gpd: GpdMleOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_confidence(self.confidence)?;
        if !self.threshold.is_finite() {
            return Err(TailRiskError::InvalidInput(
                "threshold must be finite".to_string(),
            ));
        }
        let eps = self.extrapolation.shape_epsilon;
        if !(eps.is_finite() && eps >= 0.0) {
            return Err(TailRiskError::InvalidInput(format!(
                "shape_epsilon must be finite and >= 0, got {eps}"
            )));
        }
        let (lo, hi) = self.gpd.shape_bounds;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(TailRiskError::InvalidInput(format!(
                "invalid shape bounds ({lo}, {hi})"
            )));
        }
        Ok(())
    }

    /// Fits the configured tail model.
    pub fn fit(&self, returns: &[f64]) -> Result<GpdFit> {
        self.validate()?;
        fit_gpd_with(returns, self.threshold, &GpdMle::new(self.gpd))
    }

    /// Fits the tail model and computes the baseline estimators beside it.
    ///
    /// An infinite tail mean leaves `es` empty instead of failing the run.
    pub fn evaluate(&self, returns: &[f64]) -> Result<TailRiskReport> {
        let fit = self.fit(returns)?;
        let var = fit.params.var(self.confidence, &self.extrapolation)?;
        let es = match fit
            .params
            .expected_shortfall(self.confidence, &self.extrapolation)
        {
            Ok(es) => Some(es),
            Err(TailRiskError::NonFiniteTailMean { .. }) => None,
            Err(e) => return Err(e),
        };

        let mut baselines = BTreeMap::new();
        for est in [
            TailEstimator::Historical,
            TailEstimator::Normal,
            TailEstimator::StudentT,
        ] {
            baselines.insert(est.name().to_string(), est.estimate(returns, self.confidence)?);
        }
        debug!(
            confidence = self.confidence,
            threshold = self.threshold,
            var,
            es = es.unwrap_or(f64::INFINITY),
            "tail evaluation complete"
        );

        Ok(TailRiskReport {
            config: *self,
            fit,
            var,
            es,
            baselines,
            generated_at: Utc::now(),
        })
    }
}
