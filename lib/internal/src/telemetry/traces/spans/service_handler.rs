use std::borrow::Borrow;

use http::{HeaderMap, Method, StatusCode, Uri};
use opentelemetry::{global, trace::TraceContextExt, Context};
use opentelemetry_http::HeaderExtractor;
use scoped_attributes::AttributeMap;
use tracing::{field::Empty, info_span, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::telemetry::traces::spans::{attributes, TARGET_NAME};

/// Span covering one request from the entry middleware to the response.
pub struct ServiceHandlerSpan {
    pub span: Span,
}

impl std::ops::Deref for ServiceHandlerSpan {
    type Target = Span;
    fn deref(&self) -> &Self::Target {
        &self.span
    }
}

impl Borrow<Span> for ServiceHandlerSpan {
    fn borrow(&self) -> &Span {
        &self.span
    }
}

impl ServiceHandlerSpan {
    pub fn new(method: &Method, uri: &Uri) -> Self {
        let span = info_span!(
            target: TARGET_NAME,
            "service.handler",
            "otel.kind" = "Internal",
            "otel.status_code" = Empty,
            "otel.status_description" = Empty,
            "error.type" = Empty,
            "http.request.method" = method.as_str(),
            "url.path" = uri.path(),
            "http.response.status_code" = Empty,
        );

        ServiceHandlerSpan { span }
    }

    /// Parents the span on `cx`, continuing the caller's trace when the headers carry one the
    /// globally installed propagator understands. Everything bound in `cx` stays visible in the
    /// contexts of this span and of spans nested in it.
    pub fn set_parent_from_headers(&self, headers: &HeaderMap, cx: &Context) {
        let parent = global::get_text_map_propagator(|propagator| {
            propagator.extract_with_context(cx, &HeaderExtractor(headers))
        });

        let _ = self.span.set_parent(parent);
    }

    /// Hex trace id, or `None` while no OpenTelemetry layer is installed.
    pub fn trace_id(&self) -> Option<String> {
        let cx = self.span.context();
        let span_ref = cx.span();
        let span_context = span_ref.span_context();

        span_context
            .is_valid()
            .then(|| span_context.trace_id().to_string())
    }

    pub fn record_status(&self, status: StatusCode) {
        self.record(attributes::HTTP_RESPONSE_STATUS_CODE, status.as_u16());

        if status.is_server_error() {
            self.record(attributes::OTEL_STATUS_CODE, "Error");
            self.record(attributes::ERROR_TYPE, status.as_str());
        } else {
            self.record(attributes::OTEL_STATUS_CODE, "Ok");
        }
    }

    pub fn record_panic(&self, message: &str) {
        self.record(attributes::OTEL_STATUS_CODE, "Error");
        self.record(attributes::OTEL_STATUS_DESCRIPTION, message);
        self.record(attributes::ERROR_TYPE, "panic");
        self.record(attributes::HTTP_RESPONSE_STATUS_CODE, 500u16);
    }

    /// Copies every entry of a flattened scope view onto the span as a string attribute.
    pub fn record_scope_attributes(&self, view: AttributeMap) {
        for (key, value) in view {
            self.span.set_attribute(key, value);
        }
    }
}
