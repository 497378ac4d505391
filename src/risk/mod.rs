//! Top-level risk namespace for tail estimation and VaR backtesting.
//!
//! This module wires and re-exports:
//! - `historical`: empirical quantile VaR and tail-mean ES,
//! - `parametric`: closed-form Normal and Student-t VaR/ES plus their sample fits,
//! - `evt`: peak-over-threshold GPD fitting and tail extrapolation,
//! - `backtest`: Kupiec coverage and Christoffersen independence tests,
//! - `estimator`: the four estimators behind one strategy enum, with rolling forecasts.
//!
//! Domain logic lives in submodules; this file defines the public import surface
//! (`tailrisk::risk::*`).

pub mod backtest;
pub mod estimator;
pub mod evt;
pub mod historical;
pub mod parametric;

pub use backtest::{
    ChristoffersenResult, KupiecResult, LikelihoodRatio, TransitionCounts, VarBacktest,
    backtest_var, backtest_var_aligned, christoffersen_test, christoffersen_test_aligned,
    exceedance_indicators, kupiec_test, kupiec_test_aligned,
};
pub use estimator::{TailEstimate, TailEstimator};
pub use evt::{
    ExtrapolationOptions, GpdFit, GpdParameters, fit_gpd, fit_gpd_thresholds, fit_gpd_with,
    gpd_es, gpd_survival, gpd_var, gpd_var_es, threshold_excesses,
};
pub use historical::{historical_es, historical_var};
pub use parametric::{
    fit_normal_params, fit_t_params, parametric_es_normal, parametric_es_t,
    parametric_var_normal, parametric_var_t,
};
