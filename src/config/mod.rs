//! Edge Configuration Module
//!
//! Per-deployment configuration loaded from TOML, replacing hardcoded
//! cadence, thresholds and transport endpoints with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `EMISSIONS_CONFIG` environment variable (path to TOML file)
//! 2. `edge_config.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! The loaded [`EdgeConfig`] is owned by `main` and handed to the components
//! that need it; there is no process-global config.

mod edge_config;
pub mod defaults;
pub mod validation;

pub use edge_config::*;
