//! # Daedalus Telemetry
//!
//! Logging setup for the Daedalus engines and CLI.
//!
//! The engines only emit `tracing` events and spans; this crate installs
//! the subscriber that renders them.
//!
//! | Format   | Use                                   |
//! |----------|---------------------------------------|
//! | `pretty` | interactive use, the CLI default      |
//! | `json`   | one object per event, for log shipping |
//!
//! # Example
//!
//! ```rust,ignore
//! use daedalus_telemetry::{init_logging, LogConfig, LogFormat};
//!
//! let config = LogConfig {
//!     level: "daedalus_middleware=debug".to_string(),
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! init_logging(&config)?;
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

// Re-export main types at crate root
pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
