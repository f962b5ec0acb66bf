use config::{builder::BuilderState, ConfigBuilder, ConfigError};
use envconfig::Envconfig;
use tracing::debug;

use crate::log::{LogFormat, LogLevel};

#[derive(Envconfig)]
pub struct EnvVarOverrides {
    // Logger overrides
    #[envconfig(from = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,
    #[envconfig(from = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
    #[envconfig(from = "LOG_FILTER")]
    pub log_filter: Option<String>,
    #[envconfig(from = "LOG_SINK_TOPIC")]
    pub log_sink_topic: Option<String>,

    // HTTP overrides
    #[envconfig(from = "PORT")]
    pub http_port: Option<u64>,
    #[envconfig(from = "HOST")]
    pub http_host: Option<String>,

    // Telemetry overrides
    #[envconfig(from = "SERVICE_NAME")]
    pub service_name: Option<String>,
    #[envconfig(from = "SERVICE_VERSION")]
    pub service_version: Option<String>,
    #[envconfig(from = "OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvVarOverridesError {
    #[error("Failed to override configuration: {0}")]
    FailedToOverrideConfig(#[from] ConfigError),
}

impl EnvVarOverrides {
    pub fn apply_overrides<T: BuilderState>(
        mut self,
        mut config: ConfigBuilder<T>,
    ) -> Result<ConfigBuilder<T>, EnvVarOverridesError> {
        if let Some(log_level) = self.log_level.take() {
            debug!("[config-override] 'log.level' = {:?}", log_level);
            config = config.set_override("log.level", log_level.as_str())?;
        }
        if let Some(log_format) = self.log_format.take() {
            debug!("[config-override] 'log.format' = {:?}", log_format);
            config = config.set_override("log.format", log_format.as_str())?;
        }
        if let Some(log_filter) = self.log_filter.take() {
            debug!("[config-override] 'log.filter' = {:?}", log_filter);
            config = config.set_override("log.filter", log_filter)?;
        }
        if let Some(topic) = self.log_sink_topic.take() {
            debug!("[config-override] 'log.sink.topic' = {}", topic);
            config = config.set_override("log.sink.topic", topic)?;
        }

        if let Some(http_port) = self.http_port.take() {
            debug!("[config-override] 'http.port' = {}", http_port);
            config = config.set_override("http.port", http_port)?;
        }
        if let Some(http_host) = self.http_host.take() {
            debug!("[config-override] 'http.host' = {}", http_host);
            config = config.set_override("http.host", http_host)?;
        }

        if let Some(name) = self.service_name.take() {
            debug!("[config-override] 'telemetry.service.name' = {}", name);
            config = config.set_override("telemetry.service.name", name)?;
        }
        if let Some(version) = self.service_version.take() {
            debug!("[config-override] 'telemetry.service.version' = {}", version);
            config = config.set_override("telemetry.service.version", version)?;
        }
        if let Some(endpoint) = self.otlp_endpoint.take() {
            debug!("[config-override] 'telemetry.tracing.endpoint' = {}", endpoint);
            config = config.set_override("telemetry.tracing.endpoint", endpoint)?;
        }

        Ok(config)
    }
}
