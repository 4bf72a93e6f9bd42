//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections. The
//! `[logging]` section reuses [`LogConfig`](daedalus_telemetry::LogConfig).

use serde::{Deserialize, Serialize};

/// Simulation engine section.
///
/// # Example
///
/// ```
/// use daedalus_config::SimulationConfig;
///
/// let config = SimulationConfig {
///     default_repeat_count: 1,
///     max_repeat_count: 100,
///     max_branch_depth: 16,
/// };
/// assert!(config.default_repeat_count <= config.max_repeat_count);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Requests simulated when the caller does not give a count.
    #[serde(default = "default_repeat_count")]
    pub default_repeat_count: usize,

    /// Upper bound for repeated requests; larger counts are clamped.
    #[serde(default = "default_max_repeat_count")]
    pub max_repeat_count: usize,

    /// Deepest branch arm that is still executed.
    #[serde(default = "default_max_branch_depth")]
    pub max_branch_depth: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            default_repeat_count: default_repeat_count(),
            max_repeat_count: default_max_repeat_count(),
            max_branch_depth: default_max_branch_depth(),
        }
    }
}

fn default_repeat_count() -> usize {
    1
}

fn default_max_repeat_count() -> usize {
    1000
}

fn default_max_branch_depth() -> usize {
    64
}

/// Validation engine section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Treat warnings as failures when reporting an exit status.
    #[serde(default)]
    pub warnings_as_errors: bool,
}

/// Code generator section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CodegenConfig {
    /// Spaces per indentation level.
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,

    /// Name of the `WebApplication` variable.
    #[serde(default = "default_app_variable")]
    pub app_variable: String,

    /// Name of the `WebApplicationBuilder` variable.
    #[serde(default = "default_builder_variable")]
    pub builder_variable: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            indent_width: default_indent_width(),
            app_variable: default_app_variable(),
            builder_variable: default_builder_variable(),
        }
    }
}

fn default_indent_width() -> usize {
    4
}

fn default_app_variable() -> String {
    "app".to_string()
}

fn default_builder_variable() -> String {
    "builder".to_string()
}

/// Whether `name` is usable as a C# local variable name.
pub(crate) fn is_csharp_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_config_default() {
        let config = SimulationConfig::default();
        assert_eq!(config.default_repeat_count, 1);
        assert_eq!(config.max_repeat_count, 1000);
        assert_eq!(config.max_branch_depth, 64);
    }

    #[test]
    fn test_simulation_config_partial() {
        let config: SimulationConfig = toml::from_str("max_repeat_count = 10").unwrap();
        assert_eq!(config.max_repeat_count, 10);
        assert_eq!(config.default_repeat_count, 1);
    }

    #[test]
    fn test_simulation_config_unknown_field_rejected() {
        let result: Result<SimulationConfig, _> = toml::from_str("repeat = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_codegen_config_default() {
        let config = CodegenConfig::default();
        assert_eq!(config.indent_width, 4);
        assert_eq!(config.app_variable, "app");
        assert_eq!(config.builder_variable, "builder");
    }

    #[test]
    fn test_validation_config_deserialize() {
        let config: ValidationConfig = serde_json::from_str(r#"{"warnings_as_errors": true}"#).unwrap();
        assert!(config.warnings_as_errors);
    }

    #[test]
    fn test_csharp_identifier() {
        assert!(is_csharp_identifier("app"));
        assert!(is_csharp_identifier("_web2"));
        assert!(!is_csharp_identifier(""));
        assert!(!is_csharp_identifier("2app"));
        assert!(!is_csharp_identifier("my-app"));
    }
}
