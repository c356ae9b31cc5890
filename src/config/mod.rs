//! Combine Configuration Module
//!
//! Selects which groups are combined and how each group's depth columns are
//! found, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `BOREHOLE_COMBINE_CONFIG` environment variable (path to TOML file)
//! 2. `combine_config.toml` in the current working directory
//! 3. Built-in defaults (standard AGS group mapping)
//!
//! ## Usage
//!
//! ```ignore
//! let config = CombineConfig::load();
//! let combiner = Combiner::new(config);
//! ```
//!
//! The config is passed explicitly to the orchestrator; there is no global.

mod combine_config;
pub mod defaults;
pub mod validation;

pub use combine_config::*;
