//! Response compression handler.
//!
//! Always continues. When the request's `Accept-Encoding` names one of the
//! configured algorithms with a non-zero quality, the best one by client
//! preference is mirrored into `Content-Encoding`.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};
use serde_json::json;

/// Compression handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressionHandler;

impl CompressionHandler {
    /// Parses an `Accept-Encoding` value into `(encoding, quality)` pairs,
    /// sorted by quality descending.
    fn parse_accept_encoding(header_value: &str) -> Vec<(String, f32)> {
        let mut encodings = Vec::new();

        for part in header_value.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let mut quality = 1.0f32;
            let mut encoding = part;

            if let Some((name, params)) = part.split_once(';') {
                encoding = name;
                for param in params.split(';') {
                    if let Some(q) = param.trim().strip_prefix("q=") {
                        if let Ok(q) = q.trim().parse::<f32>() {
                            quality = q.clamp(0.0, 1.0);
                        }
                    }
                }
            }

            encodings.push((encoding.trim().to_ascii_lowercase(), quality));
        }

        encodings.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        encodings
    }

    /// Picks the client's most preferred encoding that is configured.
    fn select(algorithms: &[String], accept_encoding: &str) -> Option<String> {
        Self::parse_accept_encoding(accept_encoding)
            .into_iter()
            .filter(|(_, quality)| *quality > 0.0)
            .find_map(|(encoding, _)| {
                algorithms
                    .iter()
                    .find(|algorithm| algorithm.eq_ignore_ascii_case(&encoding))
                    .cloned()
            })
    }
}

fn provider(algorithm: &str) -> Option<&'static str> {
    match algorithm.to_ascii_lowercase().as_str() {
        "br" => Some("BrotliCompressionProvider"),
        "gzip" => Some("GzipCompressionProvider"),
        _ => None,
    }
}

impl MiddlewareHandler for CompressionHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::Compression
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("algorithms", vec!["br", "gzip"])
            .with("enableForHttps", true)
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let algorithms = config.string_list("algorithms");
        let accept = ctx.header("Accept-Encoding").unwrap_or("").to_string();

        match Self::select(&algorithms, &accept) {
            Some(encoding) => {
                trace.record_with(
                    format!("Response will be compressed with {encoding}"),
                    StepDecision::Continue,
                    json!({ "acceptEncoding": accept, "encoding": encoding }),
                );
                HandlerOutcome::proceed()
                    .with_header("Content-Encoding", encoding)
                    .with_header("Vary", "Accept-Encoding")
            }
            None => {
                trace.record_with(
                    "No acceptable encoding; response left uncompressed",
                    StepDecision::Continue,
                    json!({ "acceptEncoding": accept, "algorithms": algorithms }),
                );
                HandlerOutcome::proceed()
            }
        }
    }

    fn validate(
        &self,
        config: &MiddlewareConfig,
        _scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        if config.string_list("algorithms").is_empty() {
            vec![ValidationIssue::warning(
                node_id,
                "No compression algorithms configured; responses are never compressed",
            )]
        } else {
            Vec::new()
        }
    }

    fn generate_code(&self, _config: &MiddlewareConfig, target: &CodeTarget) -> String {
        target.call("UseResponseCompression()")
    }

    fn generate_service_registration(&self, config: &MiddlewareConfig, builder: &str) -> String {
        let mut lines = vec![
            format!("{builder}.Services.AddResponseCompression(options =>"),
            "{".to_string(),
            format!(
                "    options.EnableForHttps = {};",
                config.bool_or("enableForHttps", true)
            ),
        ];
        for algorithm in config.string_list("algorithms") {
            if let Some(provider) = provider(&algorithm) {
                lines.push(format!("    options.Providers.Add<{provider}>();"));
            }
        }
        lines.push("});".to_string());
        lines.join("\n")
    }
}
