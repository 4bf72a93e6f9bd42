//! Configured access to the three engines.

use daedalus_config::{CodegenConfig, DaedalusConfig, SimulationConfig};
use daedalus_core::{DaedalusResult, MiddlewareKind, MiddlewareNode, Pipeline, SimulationRequest};
use daedalus_middleware::{
    CodeGenerator, CodegenSettings, HandlerRegistry, SimulationResult, SimulationSettings,
    Simulator, ValidationResult, Validator,
};

/// Simulator, validator and code generator sharing one handler registry
/// and one configuration.
///
/// # Example
///
/// ```
/// use daedalus::Daedalus;
/// use daedalus::config::DaedalusConfig;
/// use daedalus::core::{MiddlewareKind, Pipeline, SimulationRequest};
///
/// let engine = Daedalus::from_config(&DaedalusConfig::default());
///
/// let mut pipeline = Pipeline::new("p1", "API");
/// let node = engine.create_node(MiddlewareKind::Routing, "routing", 0).unwrap();
/// pipeline.add_node(node).unwrap();
///
/// let result = engine.simulate(&pipeline, &SimulationRequest::get("/api/users")).unwrap();
/// assert_eq!(result.response.status_code, 200);
/// assert!(engine.accepts(&engine.validate(&pipeline)));
/// ```
#[derive(Debug, Clone)]
pub struct Daedalus {
    registry: HandlerRegistry,
    simulator: Simulator,
    validator: Validator,
    generator: CodeGenerator,
    warnings_as_errors: bool,
}

impl Default for Daedalus {
    fn default() -> Self {
        Self::from_config(&DaedalusConfig::default())
    }
}

impl Daedalus {
    /// Builds the engines from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &DaedalusConfig) -> Self {
        Self::with_registry(HandlerRegistry::new(), config)
    }

    /// Builds the engines around a custom handler registry.
    #[must_use]
    pub fn with_registry(registry: HandlerRegistry, config: &DaedalusConfig) -> Self {
        Self {
            simulator: Simulator::new(registry.clone())
                .with_settings(simulation_settings(&config.simulation)),
            validator: Validator::new(registry.clone()),
            generator: CodeGenerator::new(registry.clone())
                .with_settings(codegen_settings(&config.codegen)),
            registry,
            warnings_as_errors: config.validation.warnings_as_errors,
        }
    }

    /// Returns the handler registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Creates a node of `kind` with the handler's default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no handler is registered for `kind`.
    pub fn create_node(
        &self,
        kind: MiddlewareKind,
        id: impl Into<String>,
        order: i64,
    ) -> DaedalusResult<MiddlewareNode> {
        self.registry.create_node(kind, id, order)
    }

    /// Simulates the configured default number of requests.
    ///
    /// # Errors
    ///
    /// Returns an error if a node's kind has no handler.
    pub fn simulate(
        &self,
        pipeline: &Pipeline,
        request: &SimulationRequest,
    ) -> DaedalusResult<SimulationResult> {
        self.simulator.simulate(pipeline, request)
    }

    /// Simulates `repeat_count` requests, clamped to the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns an error if a node's kind has no handler.
    pub fn simulate_repeated(
        &self,
        pipeline: &Pipeline,
        request: &SimulationRequest,
        repeat_count: usize,
    ) -> DaedalusResult<SimulationResult> {
        self.simulator.simulate_repeated(pipeline, request, repeat_count)
    }

    /// Validates a pipeline.
    #[must_use]
    pub fn validate(&self, pipeline: &Pipeline) -> ValidationResult {
        self.validator.validate(pipeline)
    }

    /// Generates `Program.cs` for a pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if a node's kind has no handler.
    pub fn generate_code(&self, pipeline: &Pipeline) -> DaedalusResult<String> {
        self.generator.generate(pipeline)
    }

    /// Whether a validation result passes under the configured policy.
    ///
    /// Errors always fail; warnings fail only with `warnings_as_errors`.
    #[must_use]
    pub fn accepts(&self, result: &ValidationResult) -> bool {
        result.valid && !(self.warnings_as_errors && !result.warnings.is_empty())
    }
}

/// Maps the `[simulation]` section onto simulator settings.
#[must_use]
pub fn simulation_settings(config: &SimulationConfig) -> SimulationSettings {
    SimulationSettings {
        default_repeat_count: config.default_repeat_count,
        max_repeat_count: config.max_repeat_count,
        max_branch_depth: config.max_branch_depth,
    }
}

/// Maps the `[codegen]` section onto generator settings.
#[must_use]
pub fn codegen_settings(config: &CodegenConfig) -> CodegenSettings {
    CodegenSettings {
        indent_width: config.indent_width,
        app_variable: config.app_variable.clone(),
        builder_variable: config.builder_variable.clone(),
    }
}
