//! JSON payloads for configurations and evaluation reports.
//!
//! # Examples
//! ```rust
//! use tailrisk::core::{from_json, to_json_pretty};
//! use tailrisk::risk::GpdParameters;
//!
//! let params = GpdParameters::new(0.2, 0.01, 0.02, 0.05);
//! let json = to_json_pretty(&params).expect("json serialization");
//! let decoded: GpdParameters = from_json(&json).expect("json deserialization");
//! assert_eq!(decoded, params);
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::config::TailRiskConfig;
use crate::risk::{GpdFit, TailEstimate};

/// Tail evaluation with its inputs, fitted model and baseline estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailRiskReport {
    pub config: TailRiskConfig,
    pub fit: GpdFit,
    /// Tail VaR at `config.confidence`.
    pub var: f64,
    /// Tail ES; `None` when the fitted shape has no finite tail mean.
    pub es: Option<f64>,
    /// Baseline estimates keyed by estimator name.
    pub baselines: BTreeMap<String, TailEstimate>,
    pub generated_at: DateTime<Utc>,
}

/// Serialize a value to pretty JSON.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Deserialize a value from JSON.
pub fn from_json<T: DeserializeOwned>(payload: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(payload)
}
