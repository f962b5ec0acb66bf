mod env_overrides;
pub mod http_server;
pub mod log;
pub mod scope;
pub mod telemetry;

use config::{Config, File, FileFormat, FileSourceFile};
use envconfig::Envconfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{
    env_overrides::{EnvVarOverrides, EnvVarOverridesError},
    http_server::HttpServerConfig,
    log::LoggingConfig,
    scope::ScopeConfig,
    telemetry::TelemetryConfig,
};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScopedAttributesConfig {
    /// The service logger configuration.
    #[serde(default)]
    pub log: LoggingConfig,

    /// Configuration for the HTTP server/listener.
    #[serde(default)]
    pub http: HttpServerConfig,

    /// Configuration of the scope opened for every inbound request and of what is recorded
    /// into it.
    #[serde(default)]
    pub scope: ScopeConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    ConfigLoadError(#[from] config::ConfigError),
    #[error("Failed to apply configuration overrides: {0}")]
    EnvVarOverridesError(#[from] EnvVarOverridesError),
    #[error("Failed to load the environment variables: {0}")]
    EnvVarLoadError(#[from] envconfig::Error),
    #[error("Failed to get the current directory: {0}")]
    CurrentDirError(std::io::Error),
}

static DEFAULT_FILE_NAMES: &[&str] = &[
    "scope.config.yaml",
    "scope.config.yml",
    "scope.config.json",
    "scope.config.json5",
];

/// Loads the configuration from `override_config_path`, or from the first default file found
/// in the current directory, and applies the environment variable overrides on top.
pub fn load_config(
    override_config_path: Option<String>,
) -> Result<ScopedAttributesConfig, ConfigError> {
    let env_overrides = EnvVarOverrides::init_from_env()?;
    load_config_with_overrides(override_config_path, env_overrides)
}

fn load_config_with_overrides(
    override_config_path: Option<String>,
    env_overrides: EnvVarOverrides,
) -> Result<ScopedAttributesConfig, ConfigError> {
    let mut config = Config::builder();

    if let Some(path_str) = override_config_path {
        let mut path_buf = PathBuf::from(path_str);
        if path_buf.is_relative() {
            path_buf = std::env::current_dir()
                .map_err(ConfigError::CurrentDirError)?
                .join(path_buf);
        }
        let as_file: File<FileSourceFile, _> = path_buf.into();
        config = config.add_source(as_file.required(true));
    } else {
        for name in DEFAULT_FILE_NAMES {
            config = config.add_source(File::with_name(name).required(false));
        }
    }

    config = env_overrides.apply_overrides(config)?;

    Ok(config.build()?.try_deserialize::<ScopedAttributesConfig>()?)
}

pub fn parse_yaml_config(config_raw: &str) -> Result<ScopedAttributesConfig, ConfigError> {
    Config::builder()
        .add_source(File::from_str(config_raw, FileFormat::Yaml))
        .build()?
        .try_deserialize::<ScopedAttributesConfig>()
        .map_err(ConfigError::ConfigLoadError)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use super::*;
    use crate::log::{LogFormat, LogLevel};

    #[test]
    fn default_scope_and_telemetry_sections() {
        let config = ScopedAttributesConfig::default();

        insta::assert_snapshot!(serde_json::to_string_pretty(&config.scope).unwrap(), @r#"
        {
          "entry_scope": "service-handler",
          "session_header": "x-session-id",
          "max_body_size": 65536,
          "record": {
            "headers": true,
            "cookies": true,
            "query": true,
            "request_body": true,
            "response_body": true,
            "host": true
          }
        }
        "#);

        insta::assert_snapshot!(serde_json::to_string_pretty(&config.telemetry).unwrap(), @r#"
        {
          "service": {
            "name": "scoped-attributes",
            "version": null
          },
          "tracing": {
            "enabled": false,
            "endpoint": "http://localhost:4318/v1/traces",
            "headers": {},
            "sampling": 1.0,
            "batch_processor": {
              "max_export_batch_size": 512,
              "max_queue_size": 2048,
              "scheduled_delay": "5s"
            }
          }
        }
        "#);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_yaml_config("{}").unwrap();

        assert_eq!(config.http.address(), "0.0.0.0:4000");
        assert_eq!(config.scope.entry_scope, "service-handler");
        assert_eq!(config.scope.session_header, "x-session-id");
        assert!(!config.log.sink.enabled);
        assert_eq!(config.log.sink.topic, "");
        assert_eq!(config.log.sink.source, None);
        assert!(!config.telemetry.is_tracing_enabled());
    }

    #[test]
    fn parses_yaml_sections() {
        let config = parse_yaml_config(
            r#"
log:
  level: warn
  format: json
  sink:
    enabled: true
    topic: orders
http:
  host: 127.0.0.1
  port: 8080
scope:
  entry_scope: request
  max_body_size: 1024
  record:
    cookies: false
telemetry:
  service:
    name: orders
    version: 1.2.3
  tracing:
    enabled: true
    endpoint: http://collector:4318/v1/traces
    sampling: 0.25
    headers:
      x-project: shop
    batch_processor:
      scheduled_delay: 500ms
"#,
        )
        .unwrap();

        assert_eq!(config.log.level, LogLevel::Warn);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.env_filter_str(), "warn");
        assert!(config.log.sink.enabled);
        assert_eq!(config.log.sink.topic, "orders");
        assert_eq!(config.http.address(), "127.0.0.1:8080");
        assert_eq!(config.scope.entry_scope, "request");
        assert_eq!(config.scope.session_header, "x-session-id");
        assert_eq!(config.scope.max_body_size, 1024);
        assert!(!config.scope.record.cookies);
        assert!(config.scope.record.headers);
        assert_eq!(config.telemetry.service.name, "orders");
        assert_eq!(config.telemetry.service.version.as_deref(), Some("1.2.3"));
        assert!(config.telemetry.is_tracing_enabled());
        assert_eq!(config.telemetry.tracing.sampling, 0.25);
        assert_eq!(
            config.telemetry.tracing.headers.get("x-project").map(String::as_str),
            Some("shop")
        );
        assert_eq!(
            config.telemetry.tracing.batch_processor.scheduled_delay,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = parse_yaml_config("scope:\n  unknown: true\n").unwrap_err();
        assert!(matches!(err, ConfigError::ConfigLoadError(_)));
    }

    #[test]
    fn env_overrides_win_over_defaults() {
        let env = HashMap::from([
            ("LOG_LEVEL".to_string(), "error".to_string()),
            ("LOG_FILTER".to_string(), "scoped_attributes=trace".to_string()),
            ("LOG_SINK_TOPIC".to_string(), "audit".to_string()),
            ("PORT".to_string(), "9000".to_string()),
            ("HOST".to_string(), "127.0.0.1".to_string()),
            ("SERVICE_NAME".to_string(), "checkout".to_string()),
            ("SERVICE_VERSION".to_string(), "2.0.0".to_string()),
            ("OTLP_ENDPOINT".to_string(), "http://otel:4318/v1/traces".to_string()),
        ]);
        let overrides = EnvVarOverrides::init_from_hashmap(&env).unwrap();

        let config = load_config_with_overrides(None, overrides).unwrap();

        assert_eq!(config.log.level, LogLevel::Error);
        assert_eq!(config.log.env_filter_str(), "scoped_attributes=trace");
        assert_eq!(config.log.sink.topic, "audit");
        assert_eq!(config.http.address(), "127.0.0.1:9000");
        assert_eq!(config.telemetry.service.name, "checkout");
        assert_eq!(config.telemetry.service.version.as_deref(), Some("2.0.0"));
        assert_eq!(config.telemetry.tracing.endpoint, "http://otel:4318/v1/traces");
    }

    #[test]
    fn invalid_env_values_are_reported() {
        let env = HashMap::from([("LOG_LEVEL".to_string(), "loud".to_string())]);
        assert!(EnvVarOverrides::init_from_hashmap(&env).is_err());
    }

    #[test]
    fn missing_explicit_config_file_fails() {
        let overrides = EnvVarOverrides::init_from_hashmap(&HashMap::new()).unwrap();
        let err = load_config_with_overrides(
            Some("/definitely/not/here/scope.config.yaml".to_string()),
            overrides,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ConfigLoadError(_)));
    }
}
