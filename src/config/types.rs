//! Configuration types for the reporting engine.
//!
//! These structures are deserialized from `reporting.yaml`.

use serde::Deserialize;

use crate::models::FinalizeStrategy;

/// Top-level configuration file structure.
///
/// # Example
///
/// ```
/// use reporting_engine::config::ReportingConfig;
/// use reporting_engine::models::FinalizeStrategy;
///
/// let config: ReportingConfig = serde_yaml::from_str(
///     "finalize:\n  strategy: from_period_start\n",
/// ).unwrap();
/// assert_eq!(config.finalize, FinalizeStrategy::FromPeriodStart);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportingConfig {
    /// How new periods compute their finalize-after date.
    #[serde(default)]
    pub finalize: FinalizeStrategy,
}
