//! Pipeline fixtures.

use crate::assertions::{TraceAssertions, ValidationAssertions};
use crate::error::TestError;
use daedalus_core::{
    document, BranchCondition, BranchConfig, MiddlewareConfig, MiddlewareKind, MiddlewareNode,
    Pipeline, SimulationRequest,
};
use daedalus_middleware::{
    generate_csharp_code, simulate_pipeline, validate_pipeline, HandlerRegistry,
};
use serde_json::Value;

/// Fluent builder for a single node.
///
/// Nodes without an explicit order take their position in the enclosing
/// list.
#[must_use]
#[derive(Debug, Clone)]
pub struct NodeFixture {
    id: String,
    kind: MiddlewareKind,
    order: Option<i64>,
    config: MiddlewareConfig,
    branch: Option<BranchFixture>,
}

#[derive(Debug, Clone)]
struct BranchFixture {
    condition: BranchCondition,
    on_true: Vec<NodeFixture>,
    on_false: Option<Vec<NodeFixture>>,
}

impl NodeFixture {
    /// Creates a node with an empty configuration.
    pub fn new(kind: MiddlewareKind, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            order: None,
            config: MiddlewareConfig::new(),
            branch: None,
        }
    }

    /// Creates an `Authentication` node.
    pub fn authentication(id: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::Authentication, id)
    }

    /// Creates an `Authorization` node.
    pub fn authorization(id: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::Authorization, id)
    }

    /// Creates a `Routing` node.
    pub fn routing(id: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::Routing, id)
    }

    /// Creates a `CORS` node.
    pub fn cors(id: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::Cors, id)
    }

    /// Creates a `StaticFiles` node.
    pub fn static_files(id: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::StaticFiles, id)
    }

    /// Creates an `ExceptionHandling` node.
    pub fn exception_handling(id: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::ExceptionHandling, id)
    }

    /// Creates a `Compression` node.
    pub fn compression(id: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::Compression, id)
    }

    /// Creates a `RateLimiting` node.
    pub fn rate_limiting(id: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::RateLimiting, id)
    }

    /// Creates an `HTTPS` node.
    pub fn https(id: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::Https, id)
    }

    /// Creates a `Custom` node for `class_name`.
    pub fn custom(id: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::Custom, id).config("className", class_name.into())
    }

    /// Creates a `MinimalAPIEndpoint` node for `method path`.
    pub fn endpoint(id: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(MiddlewareKind::MinimalApiEndpoint, id)
            .config("httpMethod", method.into())
            .config("path", path.into())
    }

    /// Sets an explicit order.
    pub fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets a configuration value.
    pub fn config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.set(key, value);
        self
    }

    /// Fills unset keys from the handler's default configuration.
    pub fn with_defaults(mut self) -> Self {
        if let Ok(handler) = HandlerRegistry::new().get(self.kind) {
            self.config.merge_defaults(&handler.default_config());
        }
        self
    }

    /// Makes the node branch on `condition`.
    pub fn when(mut self, condition: BranchCondition) -> Self {
        self.branch = Some(BranchFixture {
            condition,
            on_true: Vec::new(),
            on_false: None,
        });
        self
    }

    /// Sets the arm taken when the condition holds. Implies an
    /// authenticated-caller condition if [`when`](Self::when) was not called.
    pub fn on_true(mut self, nodes: impl IntoIterator<Item = NodeFixture>) -> Self {
        self.branch_mut().on_true = nodes.into_iter().collect();
        self
    }

    /// Sets the arm taken when the condition does not hold.
    pub fn on_false(mut self, nodes: impl IntoIterator<Item = NodeFixture>) -> Self {
        self.branch_mut().on_false = Some(nodes.into_iter().collect());
        self
    }

    fn branch_mut(&mut self) -> &mut BranchFixture {
        self.branch.get_or_insert_with(|| BranchFixture {
            condition: BranchCondition::authenticated(),
            on_true: Vec::new(),
            on_false: None,
        })
    }

    /// Builds the node; `position` is used when no order was set.
    pub fn build(self, position: i64) -> MiddlewareNode {
        let node = MiddlewareNode::new(self.id, self.kind, self.order.unwrap_or(position))
            .with_config(self.config);
        match self.branch {
            Some(branch) => {
                let mut config = BranchConfig::new(branch.condition).on_true(build_list(branch.on_true));
                if let Some(on_false) = branch.on_false {
                    config = config.on_false(build_list(on_false));
                }
                node.with_branch(config)
            }
            None => node,
        }
    }
}

fn build_list(nodes: Vec<NodeFixture>) -> Vec<MiddlewareNode> {
    nodes
        .into_iter()
        .zip(0_i64..)
        .map(|(node, position)| node.build(position))
        .collect()
}

/// Fluent builder for pipeline documents, with shortcuts into the engines.
///
/// The built document is not checked for duplicate ids, so fixtures can
/// describe invalid pipelines on purpose.
///
/// # Example
///
/// ```
/// use daedalus_test::{NodeFixture, PipelineFixture, RequestFixture};
/// use daedalus_core::MiddlewareKind;
///
/// let fixture = PipelineFixture::new("auth")
///     .node(NodeFixture::authentication("authn").config("authScheme", "JwtBearer"));
///
/// fixture
///     .simulate(RequestFixture::get("/api/users"))
///     .unwrap()
///     .assert_status_code(401)
///     .assert_terminated_by(MiddlewareKind::Authentication);
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct PipelineFixture {
    id: String,
    name: String,
    description: Option<String>,
    nodes: Vec<NodeFixture>,
}

impl PipelineFixture {
    /// Creates an empty fixture named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("fixture-{name}"),
            name,
            description: None,
            nodes: Vec::new(),
        }
    }

    /// Overrides the pipeline id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a top-level node.
    pub fn node(mut self, node: NodeFixture) -> Self {
        self.nodes.push(node);
        self
    }

    /// Appends several top-level nodes.
    pub fn nodes(mut self, nodes: impl IntoIterator<Item = NodeFixture>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Builds the pipeline document.
    pub fn build(&self) -> Pipeline {
        let mut pipeline = Pipeline::new(self.id.clone(), self.name.clone());
        pipeline.description = self.description.clone();
        pipeline.middlewares = build_list(self.nodes.clone());
        pipeline
    }

    /// Builds the pipeline through [`Pipeline::add_node`], rejecting
    /// duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Engine`] for duplicate ids.
    pub fn build_checked(&self) -> Result<Pipeline, TestError> {
        let mut pipeline = Pipeline::new(self.id.clone(), self.name.clone());
        pipeline.description = self.description.clone();
        for node in build_list(self.nodes.clone()) {
            pipeline.add_node(node)?;
        }
        Ok(pipeline)
    }

    /// Simulates one request.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Engine`] if the simulation fails.
    pub fn simulate(&self, request: impl Into<SimulationRequest>) -> Result<TraceAssertions, TestError> {
        self.simulate_repeated(request, 1)
    }

    /// Simulates `repeat_count` identical requests.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Engine`] if the simulation fails.
    pub fn simulate_repeated(
        &self,
        request: impl Into<SimulationRequest>,
        repeat_count: usize,
    ) -> Result<TraceAssertions, TestError> {
        let result = simulate_pipeline(&self.build(), &request.into(), repeat_count)?;
        Ok(TraceAssertions::new(result))
    }

    /// Validates the pipeline.
    pub fn validate(&self) -> ValidationAssertions {
        ValidationAssertions::new(validate_pipeline(&self.build()))
    }

    /// Generates C# for the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Engine`] if code generation fails.
    pub fn generate_code(&self) -> Result<String, TestError> {
        Ok(generate_csharp_code(&self.build())?)
    }

    /// Exports the pipeline document as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Engine`] if serialization fails.
    pub fn to_json(&self) -> Result<String, TestError> {
        Ok(document::export_to_json(&self.build())?)
    }
}

impl From<PipelineFixture> for Pipeline {
    fn from(fixture: PipelineFixture) -> Self {
        fixture.build()
    }
}
