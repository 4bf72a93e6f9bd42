//! # Daedalus Middleware
//!
//! Middleware handlers and the three engines that run over a pipeline
//! document: simulation, validation and C# code generation.
//!
//! ## Request Flow
//!
//! ```text
//! SimulationRequest → SimulationContext → node → node → ... → SimulatedResponse
//!                                           │
//!                                           └─ branch? evaluate condition → arm
//! ```
//!
//! Every node dispatches through the [`HandlerRegistry`] to the
//! [`MiddlewareHandler`] for its kind. A handler records at least one
//! [`SimulationStep`] and either continues or terminates the request.
//!
//! ## Engines
//!
//! | Engine            | Entry point              | Result                    |
//! |-------------------|--------------------------|---------------------------|
//! | [`Simulator`]     | [`simulate_pipeline`]    | [`SimulationResult`]      |
//! | [`Validator`]     | [`validate_pipeline`]    | [`ValidationResult`]      |
//! | [`CodeGenerator`] | [`generate_csharp_code`] | `Program.cs` source text  |
//!
//! ## Example
//!
//! ```
//! use daedalus_core::{MiddlewareConfig, MiddlewareKind, MiddlewareNode, Pipeline, SimulationRequest};
//! use daedalus_middleware::{simulate_pipeline, validate_pipeline, StepDecision};
//!
//! let mut pipeline = Pipeline::new("p1", "API");
//! pipeline
//!     .add_node(
//!         MiddlewareNode::new("routing", MiddlewareKind::Routing, 0)
//!             .with_config(MiddlewareConfig::new().with("routes", vec!["/api/users"])),
//!     )
//!     .unwrap();
//!
//! assert!(validate_pipeline(&pipeline).valid);
//!
//! let result = simulate_pipeline(&pipeline, &SimulationRequest::get("/api/invalid"), 1).unwrap();
//! assert_eq!(result.response.status_code, 404);
//! assert_eq!(result.steps[0].decision, StepDecision::Terminate);
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod codegen;
pub mod context;
pub mod handler;
pub mod handlers;
pub mod registry;
pub mod simulation;
pub mod trace;
pub mod validation;

// Re-export main types at crate root
pub use codegen::{generate_csharp_code, CodeGenerator, CodegenSettings};
pub use context::{RateLimitCounter, SimulatedResponse, SimulationContext};
pub use handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
pub use registry::HandlerRegistry;
pub use simulation::{
    simulate_pipeline, IterationSummary, SimulationResult, SimulationSettings, Simulator,
};
pub use trace::{SimulationStep, SimulationTrace, StepDecision};
pub use validation::{validate_pipeline, IssueType, ValidationIssue, ValidationResult, Validator};
