//! OpenTelemetry tracer setup. Spans opened through `tracing` are exported over OTLP/HTTP
//! once the layer returned by [`build_otel_layer_from_config`] is part of the subscriber.
use opentelemetry::trace::TracerProvider;
use opentelemetry::{global, InstrumentationScope, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::Resource;
use scoped_attributes_config::telemetry::TelemetryConfig;
use tracing::Subscriber;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

pub mod error;
pub mod traces;

use crate::telemetry::error::TelemetryError;
use crate::telemetry::traces::build_trace_provider;

use opentelemetry_sdk::trace::SdkTracerProvider;

/// Keeps the tracer provider alive. Call [`TelemetryGuard::shutdown`] before exiting so
/// buffered spans are flushed.
#[derive(Clone, Debug)]
pub struct TelemetryGuard {
    provider: SdkTracerProvider,
}

impl TelemetryGuard {
    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        self.provider
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown(e.to_string()))
    }
}

/// W3C trace context is read from inbound requests through the global propagator.
pub fn install_propagator() {
    global::set_text_map_propagator(TraceContextPropagator::new());
}

pub fn build_otel_layer_from_config<S>(
    config: &TelemetryConfig,
) -> Result<Option<(impl Layer<S> + Send + Sync + 'static, TelemetryGuard)>, TelemetryError>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync + 'static,
{
    if !config.is_tracing_enabled() {
        return Ok(None);
    }

    let mut resource = Resource::builder().with_service_name(config.service.name.clone());
    if let Some(version) = &config.service.version {
        resource = resource.with_attribute(KeyValue::new("service.version", version.clone()));
    }

    let provider = build_trace_provider(config, resource.build())?;

    let scope = InstrumentationScope::builder("scoped-attributes")
        .with_version(env!("CARGO_PKG_VERSION"))
        .build();
    let tracer = provider.tracer_with_scope(scope);

    let traces_layer = tracing_opentelemetry::layer()
        .with_tracer(tracer)
        .with_tracked_inactivity(false)
        .with_location(false)
        .with_threads(false)
        // Drop events from tracing macros (info!, error!, etc.),
        // keep spans only.
        .with_filter(filter_fn(|metadata| metadata.is_span()));

    global::set_tracer_provider(provider.clone());

    Ok(Some((traces_layer, TelemetryGuard { provider })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::Registry;

    #[test]
    fn disabled_tracing_yields_no_layer() {
        let config = TelemetryConfig::default();
        let out = build_otel_layer_from_config::<Registry>(&config).unwrap();
        assert!(out.is_none());
    }
}
