//! C# code generation.
//!
//! Projects a pipeline onto an ASP.NET Core `Program.cs`. The output is
//! display-only text:
//!
//! ```text
//! var builder = WebApplication.CreateBuilder(args);
//! <service registrations, deduplicated>
//! var app = builder.Build();
//! <one statement per node, in code order>
//! app.Run();
//! ```
//!
//! Branches become `UseWhen` blocks. The false arm, when present, is a
//! second `UseWhen` over the negated condition.

use crate::handler::CodeTarget;
use crate::registry::HandlerRegistry;
use daedalus_core::condition::to_csharp_for;
use daedalus_core::{sorted_by_order, DaedalusResult, MiddlewareNode, Pipeline};
use indexmap::IndexSet;

/// Formatting options for generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenSettings {
    /// Spaces per indentation level.
    pub indent_width: usize,

    /// Name of the `WebApplication` variable.
    pub app_variable: String,

    /// Name of the `WebApplicationBuilder` variable.
    pub builder_variable: String,
}

impl Default for CodegenSettings {
    fn default() -> Self {
        Self {
            indent_width: 4,
            app_variable: "app".to_string(),
            builder_variable: "builder".to_string(),
        }
    }
}

/// Generates C# from pipelines.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    registry: HandlerRegistry,
    settings: CodegenSettings,
}

impl CodeGenerator {
    /// Creates a generator with default settings.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            settings: CodegenSettings::default(),
        }
    }

    /// Replaces the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: CodegenSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &CodegenSettings {
        &self.settings
    }

    /// Generates `Program.cs` for a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`daedalus_core::DaedalusError::UnknownMiddlewareKind`] if a
    /// node's kind has no registered handler.
    #[tracing::instrument(skip_all, fields(pipeline_id = %pipeline.id))]
    pub fn generate(&self, pipeline: &Pipeline) -> DaedalusResult<String> {
        let builder = &self.settings.builder_variable;
        let app = &self.settings.app_variable;

        let mut registrations = IndexSet::new();
        self.collect_registrations(&pipeline.middlewares, &mut registrations)?;

        let mut lines = Vec::new();
        self.emit_list(
            &pipeline.middlewares,
            &CodeTarget::top_level(app.as_str()),
            0,
            &mut lines,
        )?;

        let mut out = vec![format!("// {}", pipeline.name)];
        if let Some(description) = pipeline.description.as_deref().filter(|d| !d.is_empty()) {
            out.push(format!("// {description}"));
        }
        out.push(format!("var {builder} = WebApplication.CreateBuilder(args);"));
        out.push(String::new());
        if !registrations.is_empty() {
            out.extend(registrations.iter().cloned());
            out.push(String::new());
        }
        out.push(format!("var {app} = {builder}.Build();"));
        out.push(String::new());
        if !lines.is_empty() {
            out.extend(lines);
            out.push(String::new());
        }
        out.push(format!("{app}.Run();"));

        tracing::info!(
            registrations = registrations.len(),
            lines = out.len(),
            "Generated C# code"
        );

        let mut code = out.join("\n");
        code.push('\n');
        Ok(code)
    }

    fn collect_registrations(
        &self,
        nodes: &[MiddlewareNode],
        out: &mut IndexSet<String>,
    ) -> DaedalusResult<()> {
        for node in sorted_by_order(nodes) {
            let handler = self.registry.get(node.kind)?;
            let registration =
                handler.generate_service_registration(&node.config, &self.settings.builder_variable);
            if !registration.is_empty() && !out.insert(registration) {
                tracing::debug!(node = %node.id, kind = %node.kind, "Skipped duplicate registration");
            }
            if let Some(branch) = &node.branch {
                self.collect_registrations(&branch.on_true, out)?;
                self.collect_registrations(branch.false_arm(), out)?;
            }
        }
        Ok(())
    }

    fn emit_list(
        &self,
        nodes: &[MiddlewareNode],
        target: &CodeTarget,
        level: usize,
        out: &mut Vec<String>,
    ) -> DaedalusResult<()> {
        for node in sorted_by_order(nodes) {
            let handler = self.registry.get(node.kind)?;
            let code = handler.generate_code(&node.config, target);
            if !code.is_empty() {
                out.push(code);
            }

            let Some(branch) = &node.branch else {
                continue;
            };

            let (context, app) = lambda_names(level);
            let condition = to_csharp_for(&branch.condition, &context);
            let inner = CodeTarget {
                app,
                indent: format!("{}{}", target.indent, " ".repeat(self.settings.indent_width)),
                nested: true,
            };

            if !branch.on_true.is_empty() {
                self.emit_use_when(&condition, &context, target, &inner, &branch.on_true, level, out)?;
            }
            if !branch.false_arm().is_empty() {
                let negated = format!("!({condition})");
                self.emit_use_when(&negated, &context, target, &inner, branch.false_arm(), level, out)?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_use_when(
        &self,
        condition: &str,
        context: &str,
        target: &CodeTarget,
        inner: &CodeTarget,
        arm: &[MiddlewareNode],
        level: usize,
        out: &mut Vec<String>,
    ) -> DaedalusResult<()> {
        out.push(target.line(format!(
            "{}.UseWhen({context} => {condition}, {} =>",
            target.app, inner.app
        )));
        out.push(target.line("{"));
        self.emit_list(arm, inner, level + 1, out)?;
        out.push(target.line("});"));
        Ok(())
    }
}

/// Lambda parameter names for a branch block; numbered below the top level
/// so nested lambdas never shadow their parents.
fn lambda_names(level: usize) -> (String, String) {
    if level == 0 {
        ("context".to_string(), "branch".to_string())
    } else {
        (format!("context{}", level + 1), format!("branch{}", level + 1))
    }
}

/// Generates C# with the default registry and settings.
///
/// # Errors
///
/// Returns [`daedalus_core::DaedalusError::UnknownMiddlewareKind`] if a
/// node's kind has no registered handler.
///
/// # Example
///
/// ```
/// use daedalus_core::{MiddlewareKind, MiddlewareNode, Pipeline};
/// use daedalus_middleware::generate_csharp_code;
///
/// let mut pipeline = Pipeline::new("p1", "API");
/// pipeline.add_node(MiddlewareNode::new("routing", MiddlewareKind::Routing, 0)).unwrap();
///
/// let code = generate_csharp_code(&pipeline).unwrap();
/// assert!(code.contains("app.UseRouting();"));
/// assert!(code.trim_end().ends_with("app.Run();"));
/// ```
pub fn generate_csharp_code(pipeline: &Pipeline) -> DaedalusResult<String> {
    CodeGenerator::default().generate(pipeline)
}
