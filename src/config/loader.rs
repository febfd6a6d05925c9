//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{ReportingError, ReportingResult};
use crate::models::FinalizeStrategy;

use super::types::ReportingConfig;

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// └── reporting.yaml   # Finalize strategy
/// ```
///
/// # Example
///
/// ```no_run
/// use reporting_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// let strategy = loader.finalize_strategy();
/// # Ok::<(), reporting_engine::error::ReportingError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: ReportingConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if `reporting.yaml` is missing and
    /// `ConfigParseError` if it is not valid YAML for [`ReportingConfig`].
    pub fn load<P: AsRef<Path>>(path: P) -> ReportingResult<Self> {
        let config = Self::load_yaml::<ReportingConfig>(&path.as_ref().join("reporting.yaml"))?;
        Ok(Self { config })
    }

    /// Wraps an already built configuration.
    pub fn from_config(config: ReportingConfig) -> Self {
        Self { config }
    }

    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> ReportingResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| ReportingError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| ReportingError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the full configuration.
    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    /// Returns the strategy used to compute finalize-after dates.
    pub fn finalize_strategy(&self) -> FinalizeStrategy {
        self.config.finalize
    }
}
