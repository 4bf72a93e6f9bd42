//! # Daedalus Core
//!
//! Core types for the Daedalus middleware-pipeline simulator.
//!
//! This crate provides the document model that every other Daedalus crate
//! works against:
//!
//! - [`Pipeline`] - The top-level, JSON-serializable pipeline document
//! - [`MiddlewareNode`] - One stage of the pipeline, optionally branching
//! - [`MiddlewareKind`] - The closed set of middleware kinds
//! - [`MiddlewareConfig`] - Loosely-typed per-node configuration bag
//! - [`BranchCondition`] / [`BranchConfig`] - Conditional forks
//! - [`SimulationRequest`] - The request a pipeline is simulated against
//! - [`DaedalusError`] - Structural errors (bad documents, unknown kinds)
//!
//! It also hosts the pure [`condition`] evaluator and the [`document`]
//! import/export functions.
//!
//! ## Example
//!
//! ```
//! use daedalus_core::{document, MiddlewareKind, MiddlewareNode, Pipeline};
//!
//! let mut pipeline = Pipeline::new("p1", "Demo");
//! pipeline
//!     .add_node(MiddlewareNode::new("auth", MiddlewareKind::Authentication, 0))
//!     .unwrap();
//!
//! let json = document::export_to_json(&pipeline).unwrap();
//! let restored = document::import_from_json(&json).unwrap();
//! assert_eq!(restored, pipeline);
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod branch;
pub mod condition;
mod config;
pub mod document;
mod error;
mod kind;
mod node;
mod pipeline;
mod request;

pub use branch::{BranchCondition, BranchConfig, ConditionOperator, ConditionType};
pub use condition::ConditionSubject;
pub use config::MiddlewareConfig;
pub use error::{DaedalusError, DaedalusResult};
pub use kind::{KindCategory, MiddlewareKind};
pub use node::{sorted_by_order, MiddlewareNode};
pub use pipeline::Pipeline;
pub use request::{header_lookup, SimulationRequest};
