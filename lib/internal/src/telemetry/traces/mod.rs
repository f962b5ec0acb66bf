use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::{
    trace::{
        self, BatchConfigBuilder, BatchSpanProcessor, Sampler, SdkTracerProvider,
        TracerProviderBuilder,
    },
    Resource,
};
use scoped_attributes_config::telemetry::{BatchProcessorConfig, TelemetryConfig};

use crate::telemetry::error::TelemetryError;

pub mod spans;

pub(super) fn build_trace_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkTracerProvider, TelemetryError> {
    let tracing = &config.tracing;

    let span_exporter = SpanExporter::builder()
        .with_http()
        .with_endpoint(tracing.endpoint.clone())
        .with_headers(tracing.headers.clone())
        .with_protocol(Protocol::HttpBinary)
        .build()
        .map_err(|e| TelemetryError::SpanExporterSetup(e.to_string()))?;

    Ok(TracerProviderBuilder::default()
        .with_sampler(Sampler::ParentBased(Box::new(
            Sampler::TraceIdRatioBased(tracing.sampling),
        )))
        .with_resource(resource)
        .with_span_processor(build_batched_span_processor(
            &tracing.batch_processor,
            span_exporter,
        ))
        .build())
}

fn build_batched_span_processor(
    config: &BatchProcessorConfig,
    exporter: impl trace::SpanExporter + 'static,
) -> BatchSpanProcessor {
    BatchSpanProcessor::builder(exporter)
        .with_batch_config(
            BatchConfigBuilder::default()
                .with_max_export_batch_size(config.max_export_batch_size)
                .with_max_queue_size(config.max_queue_size)
                .with_scheduled_delay(config.scheduled_delay)
                .build(),
        )
        .build()
}
