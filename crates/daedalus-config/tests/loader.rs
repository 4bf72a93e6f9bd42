//! File-based loader tests.

use daedalus_config::{ConfigError, ConfigLoader, DaedalusConfig};
use daedalus_telemetry::LogFormat;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_toml_file() {
    let file = config_file(
        ".toml",
        r#"
            [simulation]
            default_repeat_count = 5
            max_repeat_count = 10

            [codegen]
            indent_width = 2
            builder_variable = "webBuilder"

            [logging]
            format = "json"
            level = "info"
        "#,
    );

    let config = ConfigLoader::new()
        .with_defaults()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.simulation.default_repeat_count, 5);
    assert_eq!(config.simulation.max_repeat_count, 10);
    assert_eq!(config.simulation.max_branch_depth, 64);
    assert_eq!(config.codegen.indent_width, 2);
    assert_eq!(config.codegen.app_variable, "app");
    assert_eq!(config.codegen.builder_variable, "webBuilder");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn loads_json_file() {
    let file = config_file(".json", r#"{"validation": {"warnings_as_errors": true}}"#);

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert!(config.validation.warnings_as_errors);
    assert_eq!(config.simulation, DaedalusConfig::default().simulation);
}

#[test]
fn optional_file_is_loaded_when_present() {
    let file = config_file(".toml", "[simulation]\nmax_branch_depth = 4\n");

    let config = ConfigLoader::new()
        .with_optional_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.simulation.max_branch_depth, 4);
}

#[test]
fn rejects_unknown_extension() {
    let file = config_file(".yaml", "simulation: {}");

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn rejects_unknown_fields() {
    let file = config_file(".toml", "[simulation]\nmax_depth = 4\n");

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn rejects_malformed_json() {
    let file = config_file(".json", "{\"codegen\": ");

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::JsonError(_))));
}

#[test]
fn file_values_are_validated_on_load() {
    let file = config_file(".toml", "[codegen]\napp_variable = \"my-app\"\n");

    let result = ConfigLoader::new().with_file(file.path()).unwrap().load();
    let err = result.unwrap_err();
    assert!(err.to_string().contains("codegen.app_variable"));
}

#[test]
fn file_replaces_preset() {
    let file = config_file(".toml", "[simulation]\nmax_repeat_count = 3\n");

    let config = ConfigLoader::new()
        .with_development()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.simulation.max_repeat_count, 3);
    assert_eq!(config.logging, DaedalusConfig::default().logging);
}
