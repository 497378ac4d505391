//! Interchangeable tail estimators behind one strategy enum.
//!
//! Each variant maps a return sample to `(VaR, ES)` in loss units. Parametric
//! variants fit their family first, so callers only supply returns and a confidence.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TailRiskError, validate_confidence};
use crate::risk::evt::{fit_gpd, gpd_var, gpd_var_es};
use crate::risk::historical::{historical_es, historical_var};
use crate::risk::parametric::{
    fit_normal_params, fit_t_params, parametric_es_normal, parametric_es_t,
    parametric_var_normal, parametric_var_t,
};
use crate::series::TimeSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum TailEstimator {
    Historical,
    Normal,
    StudentT,
    /// Peak-over-threshold GPD above a caller-chosen loss threshold.
    Evt { threshold: f64 },
}

/// VaR and ES at one confidence level, both as positive loss magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailEstimate {
    pub var: f64,
    pub es: f64,
}

impl TailEstimator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Normal => "normal",
            Self::StudentT => "student_t",
            Self::Evt { .. } => "evt_gpd",
        }
    }

    pub fn estimate(&self, returns: &[f64], alpha: f64) -> Result<TailEstimate> {
        let (var, es) = match *self {
            Self::Historical => (
                historical_var(returns, alpha)?,
                historical_es(returns, alpha)?,
            ),
            Self::Normal => {
                let p = fit_normal_params(returns)?;
                (
                    parametric_var_normal(p.mean, p.std_dev, alpha)?,
                    parametric_es_normal(p.mean, p.std_dev, alpha)?,
                )
            }
            Self::StudentT => {
                let p = fit_t_params(returns)?;
                (
                    parametric_var_t(p.degrees_of_freedom, p.location, p.scale, alpha)?,
                    parametric_es_t(p.degrees_of_freedom, p.location, p.scale, alpha)?,
                )
            }
            Self::Evt { threshold } => gpd_var_es(&fit_gpd(returns, threshold)?, alpha)?,
        };
        Ok(TailEstimate { var, es })
    }

    /// VaR alone; succeeds for tails too heavy to have an Expected Shortfall.
    pub fn var(&self, returns: &[f64], alpha: f64) -> Result<f64> {
        match *self {
            Self::Historical => historical_var(returns, alpha),
            Self::Normal => {
                let p = fit_normal_params(returns)?;
                parametric_var_normal(p.mean, p.std_dev, alpha)
            }
            Self::StudentT => {
                let p = fit_t_params(returns)?;
                parametric_var_t(p.degrees_of_freedom, p.location, p.scale, alpha)
            }
            Self::Evt { threshold } => gpd_var(&fit_gpd(returns, threshold)?, alpha),
        }
    }

    /// Out-of-sample VaR forecasts from a trailing window.
    ///
    /// The forecast keyed at observation `t` uses the `window` observations strictly
    /// before `t`. Missing (`NaN`) returns are skipped before windowing.
    pub fn rolling_var<K: Ord + Clone>(
        &self,
        returns: &TimeSeries<K>,
        window: usize,
        alpha: f64,
    ) -> Result<TimeSeries<K>> {
        validate_confidence(alpha)?;
        let (keys, values): (Vec<K>, Vec<f64>) = returns
            .iter()
            .filter(|(_, v)| !v.is_nan())
            .map(|(k, v)| (k.clone(), v))
            .unzip();
        if window < 2 || window >= values.len() {
            return Err(TailRiskError::InvalidInput(format!(
                "window must be in [2, {}), got {window}",
                values.len()
            )));
        }

        let forecasts = (window..values.len())
            .map(|t| -> Result<(K, f64)> {
                Ok((keys[t].clone(), self.var(&values[t - window..t], alpha)?))
            })
            .collect::<Result<Vec<_>>>()?;
        TimeSeries::new(forecasts)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, StudentT};

    use super::*;
    use crate::risk::backtest::backtest_var;

    fn t_returns(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let dist = StudentT::new(4.0).unwrap();
        (0..n).map(|_| 0.01 * dist.sample(&mut rng)).collect()
    }

    #[test]
    fn every_estimator_orders_es_above_var() {
        let returns = t_returns(2000, 3);
        for est in [
            TailEstimator::Historical,
            TailEstimator::Normal,
            TailEstimator::StudentT,
            TailEstimator::Evt { threshold: 0.015 },
        ] {
            let e = est.estimate(&returns, 0.99).unwrap();
            assert!(e.var > 0.0, "{}: var {}", est.name(), e.var);
            assert!(e.es >= e.var, "{}: es {} < var {}", est.name(), e.es, e.var);
            assert_relative_eq!(est.var(&returns, 0.99).unwrap(), e.var, epsilon = 1e-12);
        }
    }

    #[test]
    fn heavy_tails_widen_parametric_gap() {
        let returns = t_returns(3000, 21);
        let normal = TailEstimator::Normal.estimate(&returns, 0.995).unwrap();
        let student = TailEstimator::StudentT.estimate(&returns, 0.995).unwrap();
        assert!(student.es > normal.es);
    }

    #[test]
    fn rolling_forecasts_start_after_the_window() {
        let values = t_returns(300, 9);
        let returns = TimeSeries::from_values(&values);
        let var = TailEstimator::Historical
            .rolling_var(&returns, 250, 0.99)
            .unwrap();
        assert_eq!(var.len(), 50);
        assert_eq!(var.keys().next(), Some(&250));
        assert_relative_eq!(
            var.get(&250).unwrap(),
            historical_var(&values[..250], 0.99).unwrap()
        );

        let bt = backtest_var(&returns, &var, 0.99).unwrap();
        assert_eq!(bt.kupiec.observations, 50);
    }

    #[test]
    fn rolling_window_must_fit_the_sample() {
        let returns = TimeSeries::from_values(&[0.01, -0.02, 0.0]);
        assert!(TailEstimator::Normal.rolling_var(&returns, 3, 0.99).is_err());
        assert!(TailEstimator::Normal.rolling_var(&returns, 1, 0.99).is_err());
    }

    #[test]
    fn estimator_config_is_tagged_by_method() {
        let json = serde_json::to_string(&TailEstimator::Evt { threshold: 0.02 }).unwrap();
        assert_eq!(json, r#"{"method":"evt","threshold":0.02}"#);
        let back: TailEstimator = serde_json::from_str(r#"{"method":"student_t"}"#).unwrap();
        assert_eq!(back, TailEstimator::StudentT);
    }
}
