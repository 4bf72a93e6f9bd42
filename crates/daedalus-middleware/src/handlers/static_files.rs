//! Static files handler.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::condition::csharp_string;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};
use serde_json::json;

/// Extensions served as static assets.
pub const STATIC_EXTENSIONS: [&str; 11] = [
    "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "woff", "woff2", "ttf",
];

const DEFAULT_DIRECTORY: &str = "wwwroot";

/// Static files handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFilesHandler;

/// Returns the static extension of `path`, lowercased, if it has one.
#[must_use]
pub fn static_extension(path: &str) -> Option<String> {
    let file = path.rsplit('/').next()?;
    let (_, extension) = file.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    STATIC_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

fn content_type(extension: &str) -> &'static str {
    match extension {
        "css" => "text/css",
        "js" => "text/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}

impl MiddlewareHandler for StaticFilesHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::StaticFiles
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("directory", DEFAULT_DIRECTORY)
            .with("requestPath", "")
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let path = ctx.path().to_string();
        let directory = config.str_or("directory", DEFAULT_DIRECTORY);

        match static_extension(&path) {
            Some(extension) => {
                trace.record_with(
                    format!("Served {path} from {directory}"),
                    StepDecision::Terminate,
                    json!({ "path": path, "directory": directory, "statusCode": 200 }),
                );
                HandlerOutcome::terminate(200, "OK")
                    .with_header("Content-Type", content_type(&extension))
                    .with_body(json!({
                        "file": format!("{}{}", directory.trim_end_matches('/'), path),
                    }))
            }
            None => {
                trace.record(format!("{path} is not a static file"), StepDecision::Continue);
                HandlerOutcome::proceed()
            }
        }
    }

    fn validate(
        &self,
        _config: &MiddlewareConfig,
        scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        let after_routing = scope
            .preceding(node_id)
            .iter()
            .any(|node| node.kind == MiddlewareKind::Routing);
        if after_routing {
            vec![ValidationIssue::warning(
                node_id,
                "StaticFiles runs after Routing; static assets pay for route matching",
            )]
        } else {
            Vec::new()
        }
    }

    fn generate_code(&self, config: &MiddlewareConfig, target: &CodeTarget) -> String {
        match config.str("requestPath").filter(|p| !p.is_empty()) {
            Some(request_path) => {
                let directory = config.str_or("directory", DEFAULT_DIRECTORY);
                [
                    target.line(format!("{}.UseStaticFiles(new StaticFileOptions", target.app)),
                    target.line("{"),
                    target.line(format!(
                        "    FileProvider = new PhysicalFileProvider(Path.Combine(Directory.GetCurrentDirectory(), {})),",
                        csharp_string(directory)
                    )),
                    target.line(format!("    RequestPath = {}", csharp_string(request_path))),
                    target.line("});"),
                ]
                .join("\n")
            }
            None => target.call("UseStaticFiles()"),
        }
    }
}
