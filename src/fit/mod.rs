//! Maximum-likelihood fitting of parametric families.
//!
//! Each family implements [`MaximumLikelihood`], so the estimators in [`crate::risk`]
//! depend on the capability ("fit this sample to family F") rather than on a specific
//! optimizer. Families provided:
//! - [`NormalMle`]: closed form,
//! - [`StudentTMle`]: location/scale/degrees-of-freedom by bounded Nelder-Mead,
//! - [`GpdMle`]: two-parameter Generalized Pareto (location fixed at zero) by bounded
//!   Nelder-Mead.

pub mod gpd;
pub mod normal;
pub mod student_t;

use serde::{Deserialize, Serialize};

use crate::calibration::ConvergenceInfo;
use crate::error::Result;

pub use gpd::{GpdMle, GpdMleOptions, GpdShapeScale, gpd_log_likelihood};
pub use normal::{NormalMle, NormalParams};
pub use student_t::{StudentTMle, StudentTMleOptions, StudentTParams, student_t_log_likelihood};

/// Output of a maximum-likelihood fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult<P> {
    pub params: P,
    /// Maximised log-likelihood.
    pub log_likelihood: f64,
    /// Optimizer metadata; `None` for closed-form estimators.
    pub convergence: Option<ConvergenceInfo>,
}

/// Family-specific maximum-likelihood fitter.
pub trait MaximumLikelihood {
    type Params;

    fn family(&self) -> &'static str;

    fn fit(&self, sample: &[f64]) -> Result<FitResult<Self::Params>>;
}
