//! Run configuration and serialization of evaluation payloads.

pub mod config;
pub mod serialization;

pub use config::TailRiskConfig;
pub use serialization::{TailRiskReport, from_json, to_json_pretty};
