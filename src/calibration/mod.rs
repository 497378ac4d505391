//! Optimizer toolkit used by the maximum-likelihood fitters.
//!
//! This module provides:
//! - box constraints and convergence metadata (`core`),
//! - a bounded, restarting Nelder-Mead simplex (`optimizers`).
//!
//! Likelihood objectives plug in as closures, so a fitter can swap its optimizer without
//! changing the estimators that consume the fitted parameters.

pub mod core;
pub mod optimizers;

pub use self::core::{BoxConstraints, ConvergenceInfo, TerminationReason};
pub use optimizers::{NelderMeadOptions, OptimisationResult, nelder_mead};
