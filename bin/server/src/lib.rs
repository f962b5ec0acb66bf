pub mod http_utils;
pub mod telemetry;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use scoped_attributes_config::ScopedAttributesConfig;
use scoped_attributes_internal::http::{service_handler, ServiceHandlerState};

use crate::http_utils::{echo::echo_handler, panic::panic_handler, probes::health_check_handler};

pub fn router(config: &ScopedAttributesConfig) -> Router {
    Router::new()
        .route("/health", get(health_check_handler))
        .route("/echo", post(echo_handler))
        .route("/panic", get(panic_handler))
        .layer(middleware::from_fn_with_state(
            ServiceHandlerState::new(config.scope.clone()),
            service_handler,
        ))
}
