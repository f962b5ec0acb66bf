use axum::{body::Bytes, Extension};
use opentelemetry::context::FutureExt;
use scoped_attributes::{Context, ScopeContextExt};
use tracing::info;

pub const ECHO_SCOPE: &str = "echo";

/// Answers with the request body, inside a child scope of the request scope.
pub async fn echo_handler(Extension(cx): Extension<Context>, body: Bytes) -> Bytes {
    let (cx, scope) = cx.enter_attribute_scope(ECHO_SCOPE);
    scope.set("body_length", body.len());

    async move {
        info!("echoing request body");
        body
    }
    .with_context(cx)
    .await
}
