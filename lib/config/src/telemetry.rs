use std::{collections::HashMap, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

impl TelemetryConfig {
    pub fn is_tracing_enabled(&self) -> bool {
        self.tracing.enabled
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Reported as the `service.name` resource attribute.
    ///
    /// Can also be set via the `SERVICE_NAME` environment variable.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Reported as the `service.version` resource attribute.
    ///
    /// Can also be set via the `SERVICE_VERSION` environment variable.
    #[serde(default)]
    pub version: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: None,
        }
    }
}

fn default_service_name() -> String {
    "scoped-attributes".to_string()
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct TracingConfig {
    #[serde(default)]
    pub enabled: bool,

    /// OTLP/HTTP traces endpoint.
    ///
    /// Can also be set via the `OTLP_ENDPOINT` environment variable.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Extra headers sent with every export request, e.g. project and credentials of a hosted
    /// backend.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Ratio of traces to sample, between `0.0` and `1.0`.
    #[serde(default = "default_sampling")]
    pub sampling: f64,

    #[serde(default)]
    pub batch_processor: BatchProcessorConfig,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            headers: HashMap::new(),
            sampling: default_sampling(),
            batch_processor: BatchProcessorConfig::default(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:4318/v1/traces".to_string()
}

fn default_sampling() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct BatchProcessorConfig {
    #[serde(default = "default_batch_max_export_batch_size")]
    pub max_export_batch_size: usize,
    #[serde(default = "default_batch_max_queue_size")]
    pub max_queue_size: usize,
    #[serde(
        default = "default_batch_scheduled_delay",
        deserialize_with = "humantime_serde::deserialize",
        serialize_with = "humantime_serde::serialize"
    )]
    #[schemars(with = "String")]
    pub scheduled_delay: Duration,
}

impl Default for BatchProcessorConfig {
    fn default() -> Self {
        Self {
            max_export_batch_size: default_batch_max_export_batch_size(),
            max_queue_size: default_batch_max_queue_size(),
            scheduled_delay: default_batch_scheduled_delay(),
        }
    }
}

fn default_batch_max_export_batch_size() -> usize {
    512
}

fn default_batch_max_queue_size() -> usize {
    2048
}

fn default_batch_scheduled_delay() -> Duration {
    Duration::from_secs(5)
}
