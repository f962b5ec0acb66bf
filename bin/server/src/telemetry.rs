use std::sync::Arc;

use scoped_attributes_config::ScopedAttributesConfig;
use scoped_attributes_internal::{
    logging::{logging_layers_from_config, sink::StdoutSink, utils::DynLayer},
    telemetry::{
        build_otel_layer_from_config, error::TelemetryError, install_propagator, TelemetryGuard,
    },
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::Layered, layer::SubscriberExt, util::SubscriberInitExt, Registry};

type LoggingRegistry = Layered<Vec<DynLayer<Registry>>, Registry>;

pub struct TelemetryProviders {
    pub tracer: Option<TelemetryGuard>,
    _log_guard: WorkerGuard,
}

impl TelemetryProviders {
    pub async fn graceful_shutdown(&self) {
        let tracer = self.tracer.clone();
        let shutdown_tracer = tokio::task::spawn_blocking(move || {
            if let Some(tracer) = tracer {
                if let Err(err) = tracer.shutdown() {
                    eprintln!("{err}");
                }
            }
        });

        let _ = shutdown_tracer.await;
    }
}

pub fn init(config: &ScopedAttributesConfig) -> Result<TelemetryProviders, TelemetryError> {
    install_propagator();

    let (log_layers, log_guard) =
        logging_layers_from_config::<Registry>(&config.log, Arc::new(StdoutSink));
    let (tracer_layer, tracer) =
        match build_otel_layer_from_config::<LoggingRegistry>(&config.telemetry)? {
            Some((layer, guard)) => (Some(layer), Some(guard)),
            None => (None, None),
        };

    tracing_subscriber::registry()
        .with(log_layers)
        .with(tracer_layer)
        .try_init()
        .map_err(|e| TelemetryError::Internal(e.to_string()))?;

    Ok(TelemetryProviders {
        tracer,
        _log_guard: log_guard,
    })
}
