//! Configuration loading for the Activity Reporting Engine.
//!
//! The engine reads a single `reporting.yaml` from a configuration
//! directory. It currently carries the finalize strategy injected into
//! every new reporting period.
//!
//! # Example
//!
//! ```no_run
//! use reporting_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/default").unwrap();
//! println!("Finalize strategy: {:?}", loader.finalize_strategy());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::ReportingConfig;
