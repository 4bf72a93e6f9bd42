//! Typed configuration for Daedalus.
//!
//! Configuration is layered: built-in defaults, then an optional TOML or
//! JSON file, then `PREFIX__SECTION__KEY` environment variables. Unknown
//! fields are rejected at every layer.
//!
//! # Overview
//!
//! [`DaedalusConfig`] holds one section per engine:
//!
//! - [`SimulationConfig`] - repeat counts and branch depth limit
//! - [`ValidationConfig`] - how warnings affect the exit status
//! - [`CodegenConfig`] - layout of generated C#
//! - [`LogConfig`](daedalus_telemetry::LogConfig) - log output
//!
//! # Example
//!
//! ```no_run
//! use daedalus_config::{ConfigLoader, DaedalusConfig};
//!
//! # fn main() -> Result<(), daedalus_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("daedalus.toml")?
//!     .with_env_prefix("DAEDALUS")
//!     .load()?;
//!
//! println!("Up to {} repeated requests", config.simulation.max_repeat_count);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [simulation]
//! default_repeat_count = 1
//! max_repeat_count = 1000
//! max_branch_depth = 64
//!
//! [validation]
//! warnings_as_errors = false
//!
//! [codegen]
//! indent_width = 4
//! app_variable = "app"
//! builder_variable = "builder"
//!
//! [logging]
//! enabled = true
//! level = "warn"
//! format = "pretty"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `DAEDALUS__SIMULATION__MAX_REPEAT_COUNT=50`
//! - `DAEDALUS__VALIDATION__WARNINGS_AS_ERRORS=true`
//! - `DAEDALUS__LOGGING__FORMAT=json`

#![doc(html_root_url = "https://docs.rs/daedalus-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
