//! # Daedalus Test
//!
//! Test utilities for Daedalus pipelines: fluent fixtures for documents and
//! requests, plus chainable assertions over simulation and validation
//! results.
//!
//! ## Key Features
//!
//! - **Pipeline Fixtures**: Build documents node by node; orders default to
//!   list position
//! - **Request Fixtures**: Fluent API for simulated requests
//! - **Trace Assertions**: Status, termination, step and header checks
//! - **Validation Assertions**: Warning and error lookups by node and text
//!
//! ## Example
//!
//! ```
//! use daedalus_test::{NodeFixture, PipelineFixture, RequestFixture};
//! use daedalus_middleware::StepDecision;
//!
//! let fixture = PipelineFixture::new("api")
//!     .node(NodeFixture::authentication("authn").config("authScheme", "JwtBearer"))
//!     .node(NodeFixture::routing("routing"));
//!
//! fixture
//!     .simulate(RequestFixture::get("/api/users").bearer_token("header.payload.signature"))
//!     .unwrap()
//!     .assert_step_count(2)
//!     .assert_decisions(&[StepDecision::Continue, StepDecision::Continue]);
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assertions;
mod error;
mod pipeline;
mod request;

pub use assertions::{TraceAssertions, ValidationAssertions};
pub use error::TestError;
pub use pipeline::{NodeFixture, PipelineFixture};
pub use request::RequestFixture;
