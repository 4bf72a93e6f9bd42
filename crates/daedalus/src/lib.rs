//! # Daedalus
//!
//! **Simulate, validate and generate ASP.NET Core middleware pipelines.**
//!
//! A pipeline is a JSON document of middleware nodes, each with a kind, an
//! order and a configuration bag, optionally forking on a request
//! condition. Daedalus can:
//!
//! - **Simulate** requests through it and explain, step by step, which
//!   middleware continued, terminated or was skipped
//! - **Validate** it for ordering mistakes, cycles and bad configuration
//! - **Generate** the equivalent `Program.cs`
//!
//! ## Quick Start
//!
//! ```
//! use daedalus::prelude::*;
//!
//! let engine = Daedalus::default();
//!
//! let mut pipeline = Pipeline::new("p1", "API");
//! pipeline
//!     .add_node(engine.create_node(MiddlewareKind::Authentication, "authn", 0).unwrap())
//!     .unwrap();
//!
//! let result = engine
//!     .simulate(&pipeline, &SimulationRequest::get("/api/users"))
//!     .unwrap();
//! assert_eq!(result.response.status_code, 401);
//! assert_eq!(result.steps[0].decision, StepDecision::Terminate);
//! ```
//!
//! ## Crates
//!
//! | Module          | Crate                 | Contents                               |
//! |-----------------|-----------------------|----------------------------------------|
//! | [`core`]        | `daedalus-core`       | document model, conditions, JSON I/O   |
//! | [`middleware`]  | `daedalus-middleware` | handlers and the three engines         |
//! | [`config`]      | `daedalus-config`     | layered configuration                  |
//! | [`telemetry`]   | `daedalus-telemetry`  | logging setup                          |
//!
//! The `daedalus` binary wraps all of this; see [`cli`].

#![doc(html_root_url = "https://docs.rs/daedalus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
mod engine;

// Re-export core types
pub use daedalus_core as core;

// Re-export engines and handlers
pub use daedalus_middleware as middleware;

// Re-export configuration
pub use daedalus_config as config;

// Re-export logging setup
pub use daedalus_telemetry as telemetry;

pub use engine::{codegen_settings, simulation_settings, Daedalus};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use daedalus::prelude::*;
///
/// let request = SimulationRequest::get("/health");
/// assert_eq!(request.method, "GET");
/// ```
pub mod prelude {
    pub use crate::Daedalus;

    pub use daedalus_core::{
        document, BranchCondition, BranchConfig, ConditionOperator, ConditionType,
        DaedalusError, DaedalusResult, MiddlewareConfig, MiddlewareKind, MiddlewareNode,
        Pipeline, SimulationRequest,
    };

    pub use daedalus_middleware::{
        HandlerRegistry, MiddlewareHandler, SimulationResult, SimulationStep, StepDecision,
        ValidationIssue, ValidationResult,
    };

    pub use daedalus_config::{ConfigLoader, DaedalusConfig};
}
