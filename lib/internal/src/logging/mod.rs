pub mod sink;
pub mod stdout;
pub mod utils;

use std::sync::Arc;

use scoped_attributes_config::log::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::Layer;

use crate::{
    host,
    logging::{
        sink::{LogSink, ScopedLogLayer},
        stdout::build_stdout_layer,
        utils::{create_env_filter, create_targets_filter, DynLayer},
    },
};

/// Builds the stdout layer and, when the sink is enabled, the layer forwarding every event to
/// `sink`.
pub fn logging_layers_from_config<S>(
    config: &LoggingConfig,
    sink: Arc<dyn LogSink>,
) -> (Vec<DynLayer<S>>, WorkerGuard)
where
    S: tracing::Subscriber
        + for<'span> tracing_subscriber::registry::LookupSpan<'span>
        + Send
        + Sync,
{
    let (stdout_layer, guard) = build_stdout_layer(config);
    let mut layers = vec![stdout_layer];

    if config.sink.enabled {
        let source = config
            .sink
            .source
            .clone()
            .unwrap_or_else(|| host::ip().to_string());

        layers.push(
            ScopedLogLayer::new(config.sink.topic.clone(), source, sink)
                .with_filter(create_env_filter(config))
                .with_filter(create_targets_filter(config.log_internals))
                .boxed(),
        );
    }

    (layers, guard)
}
