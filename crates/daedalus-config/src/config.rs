//! Main configuration types.
//!
//! This module provides the top-level [`DaedalusConfig`] struct and its builder.

use daedalus_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::schema::is_csharp_identifier;
use crate::{CodegenConfig, ConfigError, SimulationConfig, ValidationConfig};

/// Complete Daedalus configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use daedalus_config::DaedalusConfig;
///
/// let config = DaedalusConfig::default();
/// assert_eq!(config.simulation.max_repeat_count, 1000);
/// assert_eq!(config.codegen.app_variable, "app");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DaedalusConfig {
    /// Simulation engine settings.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Validation engine settings.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Code generator settings.
    #[serde(default)]
    pub codegen: CodegenConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LogConfig,
}

impl DaedalusConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> DaedalusConfigBuilder {
        DaedalusConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - A repeat count or the branch depth is zero
    /// - The default repeat count exceeds the maximum
    /// - The indent width is outside 1..=16
    /// - A codegen variable is not a C# identifier, or both are the same
    /// - The log level does not parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        let simulation = &self.simulation;
        if simulation.default_repeat_count == 0 {
            return Err(ConfigError::invalid_value(
                "simulation.default_repeat_count",
                "must be at least 1",
            ));
        }
        if simulation.max_repeat_count == 0 {
            return Err(ConfigError::invalid_value(
                "simulation.max_repeat_count",
                "must be at least 1",
            ));
        }
        if simulation.default_repeat_count > simulation.max_repeat_count {
            return Err(ConfigError::invalid_value(
                "simulation.default_repeat_count",
                format!(
                    "{} exceeds simulation.max_repeat_count ({})",
                    simulation.default_repeat_count, simulation.max_repeat_count
                ),
            ));
        }
        if simulation.max_branch_depth == 0 {
            return Err(ConfigError::invalid_value(
                "simulation.max_branch_depth",
                "must be at least 1",
            ));
        }

        if !(1..=16).contains(&self.codegen.indent_width) {
            return Err(ConfigError::invalid_value(
                "codegen.indent_width",
                "must be between 1 and 16",
            ));
        }
        for (field, name) in [
            ("codegen.app_variable", &self.codegen.app_variable),
            ("codegen.builder_variable", &self.codegen.builder_variable),
        ] {
            if !is_csharp_identifier(name) {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("'{name}' is not a valid C# identifier"),
                ));
            }
        }
        if self.codegen.app_variable == self.codegen.builder_variable {
            return Err(ConfigError::invalid_value(
                "codegen.builder_variable",
                "must differ from codegen.app_variable",
            ));
        }

        self.logging
            .validate()
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Debug-level pretty logs with source locations.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::DaedalusConfig;
    ///
    /// let config = DaedalusConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// Create a CI configuration preset.
    ///
    /// JSON logs, and validation warnings fail the run.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::DaedalusConfig;
    ///
    /// let config = DaedalusConfig::production();
    /// assert_eq!(config.logging.format, daedalus_telemetry::LogFormat::Json);
    /// assert!(config.validation.warnings_as_errors);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        Self {
            validation: ValidationConfig {
                warnings_as_errors: true,
            },
            logging: LogConfig::production(),
            ..Self::default()
        }
    }
}

/// Builder for [`DaedalusConfig`].
#[derive(Debug, Default)]
pub struct DaedalusConfigBuilder {
    simulation: Option<SimulationConfig>,
    validation: Option<ValidationConfig>,
    codegen: Option<CodegenConfig>,
    logging: Option<LogConfig>,
}

impl DaedalusConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the simulation section.
    #[must_use]
    pub fn simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = Some(simulation);
        self
    }

    /// Set the validation section.
    #[must_use]
    pub fn validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Set the codegen section.
    #[must_use]
    pub fn codegen(mut self, codegen: CodegenConfig) -> Self {
        self.codegen = Some(codegen);
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> DaedalusConfig {
        DaedalusConfig {
            simulation: self.simulation.unwrap_or_default(),
            validation: self.validation.unwrap_or_default(),
            codegen: self.codegen.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<DaedalusConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_telemetry::LogFormat;

    #[test]
    fn test_default_config_is_valid() {
        let config = DaedalusConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.default_repeat_count, 1);
        assert!(!config.validation.warnings_as_errors);
        assert_eq!(config.codegen.indent_width, 4);
        assert!(config.logging.enabled);
    }

    #[test]
    fn test_builder_keeps_defaults_for_unset_sections() {
        let config = DaedalusConfig::builder()
            .codegen(CodegenConfig {
                app_variable: "web".to_string(),
                ..Default::default()
            })
            .build();

        assert_eq!(config.codegen.app_variable, "web");
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn test_validate_zero_repeat_count() {
        let result = DaedalusConfig::builder()
            .simulation(SimulationConfig {
                default_repeat_count: 0,
                ..Default::default()
            })
            .build_validated();

        assert!(result.unwrap_err().to_string().contains("default_repeat_count"));
    }

    #[test]
    fn test_validate_default_above_max() {
        let result = DaedalusConfig::builder()
            .simulation(SimulationConfig {
                default_repeat_count: 20,
                max_repeat_count: 10,
                ..Default::default()
            })
            .build_validated();

        let message = result.unwrap_err().to_string();
        assert!(message.contains("exceeds simulation.max_repeat_count (10)"));
    }

    #[test]
    fn test_validate_branch_depth() {
        let config = DaedalusConfig::builder()
            .simulation(SimulationConfig {
                max_branch_depth: 0,
                ..Default::default()
            })
            .build();

        assert!(config.validate().unwrap_err().to_string().contains("max_branch_depth"));
    }

    #[test]
    fn test_validate_indent_width() {
        for width in [0, 17] {
            let config = DaedalusConfig::builder()
                .codegen(CodegenConfig {
                    indent_width: width,
                    ..Default::default()
                })
                .build();
            assert!(config.validate().unwrap_err().to_string().contains("indent_width"));
        }
    }

    #[test]
    fn test_validate_identifiers() {
        let config = DaedalusConfig::builder()
            .codegen(CodegenConfig {
                app_variable: String::new(),
                ..Default::default()
            })
            .build();
        assert!(config.validate().unwrap_err().to_string().contains("app_variable"));

        let config = DaedalusConfig::builder()
            .codegen(CodegenConfig {
                app_variable: "app".to_string(),
                builder_variable: "app".to_string(),
                ..Default::default()
            })
            .build();
        assert!(config.validate().unwrap_err().to_string().contains("must differ"));
    }

    #[test]
    fn test_validate_log_level() {
        let config = DaedalusConfig::builder()
            .logging(LogConfig {
                level: "daedalus_core=loud".to_string(),
                ..Default::default()
            })
            .build();

        assert!(config.validate().unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn test_presets() {
        let dev = DaedalusConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert!(dev.validate().is_ok());

        let prod = DaedalusConfig::production();
        assert_eq!(prod.logging.level, "info");
        assert!(prod.validation.warnings_as_errors);
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_toml_serialization() {
        let config = DaedalusConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[simulation]"));
        assert!(toml_str.contains("[codegen]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            [simulation]
            max_repeat_count = 50

            [logging]
            format = "json"
        "#;

        let config: DaedalusConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.simulation.max_repeat_count, 50);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.codegen, CodegenConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml_str = r#"
            [codegen]
            indent = 2
        "#;

        let result: Result<DaedalusConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }
}
