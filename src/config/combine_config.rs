//! Combine Configuration - group selection and depth-column mapping as TOML
//!
//! Every field has a serde default, so an empty file (or no file at all)
//! yields the built-in standard AGS mapping.

use super::defaults;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Configuration accepted by the combine orchestrator.
///
/// Load with `CombineConfig::load()` which searches:
/// 1. `$BOREHOLE_COMBINE_CONFIG` env var
/// 2. `./combine_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    /// Heading that identifies the owning borehole in every group
    pub borehole_id_column: String,

    /// Groups to combine. `None` combines every group in the input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_groups: Option<Vec<String>>,

    /// Groups recognized as standard. Others are combined but flagged.
    pub standard_groups: Vec<String>,

    /// Breakpoints closer than this are merged. 0 merges exact duplicates only.
    pub depth_tolerance: f64,

    /// Guess depth columns from headings for groups missing from `depth_columns`
    pub infer_depth_columns: bool,

    /// Assemble boreholes on the rayon thread pool
    pub parallel: bool,

    /// Ordered depth-column candidates per group (top first, then base)
    pub depth_columns: BTreeMap<String, Vec<String>>,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            borehole_id_column: defaults::BOREHOLE_ID_COLUMN.to_string(),
            included_groups: None,
            standard_groups: defaults::standard_groups(),
            depth_tolerance: 0.0,
            infer_depth_columns: true,
            parallel: false,
            depth_columns: defaults::standard_depth_columns(),
        }
    }
}

impl CombineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$BOREHOLE_COMBINE_CONFIG` environment variable
    /// 2. `./combine_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded combine config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from env var, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded combine config from ./{}", defaults::CONFIG_FILE_NAME);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::CONFIG_FILE_NAME);
                }
            }
        }

        info!("No combine config found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Toml(err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings; they never fail the load.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        let config: Self = toml::from_str(contents).map_err(ConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize current config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Combine config saved");
        Ok(())
    }

    /// Reject impossible values; log suspicious ones.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_values(self);
        for w in &warnings {
            warn!("{}", w);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Builder-style group selection.
    #[must_use]
    pub fn with_included_groups<S: Into<String>>(mut self, groups: impl IntoIterator<Item = S>) -> Self {
        self.included_groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Builder-style depth-column override for one group.
    #[must_use]
    pub fn with_depth_columns<S: Into<String>>(
        mut self,
        group: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.depth_columns
            .insert(group.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.depth_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn is_standard(&self, group: &str) -> bool {
        self.standard_groups.iter().any(|g| g == group)
    }

    pub fn is_included(&self, group: &str) -> bool {
        self.included_groups
            .as_ref()
            .map_or(true, |groups| groups.iter().any(|g| g == group))
    }

    /// Depth-column candidates for `group`: the configured list, else an
    /// inferred one (when enabled), else empty.
    pub fn depth_columns_for(&self, group: &str, headings: &[String]) -> Vec<String> {
        if let Some(columns) = self.depth_columns.get(group) {
            return columns.clone();
        }
        if self.infer_depth_columns {
            return defaults::infer_depth_columns(headings);
        }
        Vec::new()
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {1}", path = .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({path}): {1}", path = .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config parse error: {0}")]
    Toml(#[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("Config validation failed:\n  - {details}", details = .0.join("\n  - "))]
    Validation(Vec<String>),
}
