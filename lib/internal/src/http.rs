//! Entry middleware opening the request scope.
//!
//! Every request gets a fresh scope (by default `service-handler`) bound to the context the
//! handler runs in. The scope is filled with what is known about the request before the handler
//! runs and with the outcome afterwards, and its flattened view ends up on the request span.
use std::{
    any::Any,
    backtrace::Backtrace,
    cell::RefCell,
    net::SocketAddr,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Once},
    time::SystemTime,
};

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use cookie::Cookie;
use futures::{stream, FutureExt, StreamExt};
use opentelemetry::{context::FutureExt as _, trace::TraceContextExt};
use scoped_attributes::{keys, AttributeScope, Context, ScopeContextExt};
use scoped_attributes_config::scope::ScopeConfig;
use tracing::{error, info, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::{host, telemetry::traces::spans::service_handler::ServiceHandlerSpan};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

#[derive(Clone, Debug)]
pub struct ServiceHandlerState {
    config: Arc<ScopeConfig>,
}

impl ServiceHandlerState {
    pub fn new(config: ScopeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for ServiceHandlerState {
    fn default() -> Self {
        Self::new(ScopeConfig::default())
    }
}

/// Use with `axum::middleware::from_fn_with_state`.
pub async fn service_handler(
    State(state): State<ServiceHandlerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let config = &state.config;
    let start = SystemTime::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let (cx, scope) = Context::current().enter_attribute_scope(config.entry_scope.as_str());

    let span = ServiceHandlerSpan::new(&method, &uri);
    span.set_parent_from_headers(request.headers(), &cx);
    if let Some(trace_id) = span.trace_id() {
        scope.set(keys::TRACE_ID, trace_id);
    }

    // The span context already binds the scope through its parent.
    let span_cx = span.context();
    let cx = if span_cx.has_active_span() { span_cx } else { cx };

    record_request(&scope, config, &request, start);

    if config.record.request_body {
        let (parts, body) = request.into_parts();
        let body = match buffer_body(body, config.max_body_size).await {
            Ok(BufferedBody::Complete(bytes)) => {
                scope.set(keys::REQUEST, String::from_utf8_lossy(&bytes));
                Body::from(bytes)
            }
            Ok(BufferedBody::Passthrough(body)) => {
                scope.set(keys::REQUEST, "");
                body
            }
            Err(err) => {
                scope.set(keys::ERROR, &err);
                scope.set(keys::STATUS_CODE, StatusCode::BAD_REQUEST.as_u16());
                span.record_status(StatusCode::BAD_REQUEST);
                return finish(
                    &cx,
                    &span,
                    &scope,
                    &format!("{method}:{uri}"),
                    (StatusCode::BAD_REQUEST, "failed to read request body").into_response(),
                );
            }
        };
        request = Request::from_parts(parts, body);
    }

    request.extensions_mut().insert(cx.clone());

    let outcome = AssertUnwindSafe(next.run(request))
        .catch_unwind()
        .with_context(cx.clone())
        .instrument(span.span.clone())
        .await;

    let mut response = match outcome {
        Ok(response) => {
            span.record_status(response.status());
            response
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            let stack = take_panic_backtrace();

            scope.set(keys::ERROR, &message);
            scope.set(keys::ERROR_STACK, &stack);
            span.record_panic(&message);

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": message, "stack": stack })),
            )
                .into_response()
        }
    };

    scope.set(keys::STATUS_CODE, response.status().as_u16());

    if config.record.response_body {
        let (parts, body) = response.into_parts();
        let body = match buffer_body(body, config.max_body_size).await {
            Ok(BufferedBody::Complete(bytes)) => {
                scope.set(keys::RESPONSE, String::from_utf8_lossy(&bytes));
                Body::from(bytes)
            }
            Ok(BufferedBody::Passthrough(body)) => {
                scope.set(keys::RESPONSE, "");
                body
            }
            Err(err) => {
                scope.set(keys::RESPONSE, "");
                scope.set(keys::ERROR, &err);
                Body::empty()
            }
        };
        response = Response::from_parts(parts, body);
    }

    finish(&cx, &span, &scope, &format!("{method}:{uri}"), response)
}

fn finish(
    cx: &Context,
    span: &ServiceHandlerSpan,
    scope: &AttributeScope,
    target: &str,
    response: Response,
) -> Response {
    span.record_scope_attributes(scope.get_all());

    // Entering the span may activate its own context, so the scope is attached after it.
    let _entered = span.enter();
    let _guard = cx.clone().attach();
    info!("Service Handler {}", target);

    response
}

fn record_request(
    scope: &AttributeScope,
    config: &ScopeConfig,
    request: &Request,
    start: SystemTime,
) {
    let headers = request.headers();
    let uri = request.uri();

    scope.set(keys::PATH, uri.path());
    scope.set(keys::METHOD, request.method());

    if config.record.headers {
        scope.extend(headers.iter().map(|(name, value)| {
            (
                keys::header(name.as_str()),
                String::from_utf8_lossy(value.as_bytes()),
            )
        }));
    }

    if config.record.cookies {
        for value in headers.get_all(header::COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for cookie in Cookie::split_parse(value).flatten() {
                scope.set(keys::cookie(cookie.name()), cookie.value());
            }
        }
    }

    if config.record.query {
        if let Some(query) = uri.query() {
            scope.extend(
                url::form_urlencoded::parse(query.as_bytes())
                    .map(|(name, value)| (keys::query(&name), value)),
            );
        }
    }

    scope.set(keys::TIME, humantime::format_rfc3339_millis(start));

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    scope.set(keys::CLIENT_IP, client_ip(headers, peer));

    scope.set(
        keys::SESSION_ID,
        headers
            .get(config.session_header.as_str())
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default(),
    );

    if config.record.host {
        scope.set(keys::HOST, host::hostname());
        scope.set(keys::IP, host::ip());
    }
}

/// First hop of `x-forwarded-for`, then `x-real-ip`, then the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header_value(X_FORWARDED_FOR)
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| header_value(X_REAL_IP))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

enum BufferedBody {
    Complete(Bytes),
    /// The body exceeded the limit. It still yields every byte, starting with the ones read
    /// while looking for its end.
    Passthrough(Body),
}

/// Reads `body` until it ends or grows past `limit`, so nothing is ever cut off.
async fn buffer_body(body: Body, limit: usize) -> Result<BufferedBody, axum::Error> {
    if body.size_hint().lower() > limit as u64 {
        return Ok(BufferedBody::Passthrough(body));
    }

    let mut data = body.into_data_stream();
    let mut chunks = Vec::new();
    let mut len = 0;

    while let Some(chunk) = data.next().await {
        let chunk = chunk?;
        len += chunk.len();
        chunks.push(chunk);

        if len > limit {
            let prefix = stream::iter(chunks.into_iter().map(Ok::<_, axum::Error>));
            return Ok(BufferedBody::Passthrough(Body::from_stream(
                prefix.chain(data),
            )));
        }
    }

    Ok(BufferedBody::Complete(Bytes::from(chunks.concat())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "no error details".to_string()
    }
}

thread_local! {
    static LAST_PANIC_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Keeps the backtrace of the panicking frame for the middleware, which only sees the stack
/// after unwinding. The previously installed hook still runs.
pub fn install_panic_hook() {
    static INSTALL: Once = Once::new();

    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture().to_string();
            LAST_PANIC_BACKTRACE.with(|last| *last.borrow_mut() = Some(backtrace));
            previous(info);
        }));
    });
}

fn take_panic_backtrace() -> String {
    LAST_PANIC_BACKTRACE
        .with(|last| last.borrow_mut().take())
        .unwrap_or_else(|| {
            error!("panic hook not installed, reporting the stack of the middleware");
            Backtrace::force_capture().to_string()
        })
}
