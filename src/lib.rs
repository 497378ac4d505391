//! Tailrisk estimates Value-at-Risk and Expected Shortfall of a return series and
//! backtests VaR forecasts against realized returns.
//!
//! Four estimators share one return-to-loss convention (`L = -r`, results are positive
//! loss magnitudes): historical simulation, Normal and Student-t closed forms, and an
//! Extreme Value Theory peak-over-threshold model with a Generalized Pareto tail that
//! extrapolates beyond the observed sample. VaR series are validated with the Kupiec
//! unconditional-coverage test and the Christoffersen independence test.
//!
//! References used across modules include:
//! - McNeil, Frey, Embrechts, *Quantitative Risk Management* (2015), Ch. 2 and 5.
//! - Kupiec (1995) and Christoffersen (1998) for backtesting.
//! - Smith (1985) and Hosking and Wallis (1987) for GPD estimation.
//!
//! Numerical considerations:
//! - Likelihood fits use a bounded restarting Nelder-Mead; the GPD shape stays above
//!   `-1`, where the likelihood is bounded, and a fit ending on a bound is logged.
//! - Near-zero GPD shapes switch to the exponential limit.
//! - Degenerate backtests return [`risk::LikelihoodRatio::Undefined`], never `NaN`.
//!
//! # Feature Flags
//! - `parallel` (default): fits several thresholds on the Rayon pool.
//!
//! # Quick Start
//! Fit a tail above a 2% loss and extrapolate:
//! ```rust
//! use tailrisk::risk::{fit_gpd, gpd_var_es};
//!
//! let returns: Vec<f64> = (0..500).map(|i| -0.0001 * (i % 97) as f64 * (i % 7) as f64).collect();
//! let params = fit_gpd(&returns, 0.02).unwrap();
//! let (var_99, es_99) = gpd_var_es(&params, 0.99).unwrap();
//! assert!(var_99 > 0.02 && es_99 >= var_99);
//! ```
//!
//! Backtest a VaR series:
//! ```rust
//! use tailrisk::risk::backtest_var;
//! use tailrisk::series::TimeSeries;
//!
//! let returns = TimeSeries::from_values(&[0.01, -0.03, 0.0, -0.01, -0.04, 0.02]);
//! let var = TimeSeries::from_values(&[0.02; 6]);
//! let bt = backtest_var(&returns, &var, 0.95).unwrap();
//! assert_eq!(bt.kupiec.exceedances, 2);
//! assert!(bt.kupiec.likelihood_ratio.p_value().is_some());
//! ```
//!
//! Compare estimators:
//! ```rust
//! use tailrisk::risk::TailEstimator;
//!
//! let returns = [-0.05, -0.03, -0.07, -0.02, -0.10, 0.01, 0.02, 0.015];
//! let hist = TailEstimator::Historical.estimate(&returns, 0.9).unwrap();
//! let normal = TailEstimator::Normal.estimate(&returns, 0.9).unwrap();
//! assert!(hist.es >= hist.var && normal.es >= normal.var);
//! ```

pub mod calibration;
pub mod core;
pub mod error;
pub mod fit;
pub mod math;
pub mod risk;
pub mod series;

pub use error::{Result, TailRiskError};

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::error::{Result, TailRiskError};
    pub use crate::fit::MaximumLikelihood;
    pub use crate::risk::*;
    pub use crate::series::{DailySeries, TimeSeries, align};
}
