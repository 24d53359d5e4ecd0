//! W3C Trace Context propagation for outgoing collaborator calls.
//!
//! Outgoing requests to the database and the generative API carry the
//! current span's `traceparent`/`tracestate` so they can be stitched into the
//! same trace when the collaborator supports it. They also carry the
//! `x-request-id` of the inbound request being served, which
//! [`request_id_middleware`](crate::middleware::request_id_middleware) scopes
//! onto the handling task.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::HeaderMap;
use std::future::Future;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Header name for W3C traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Header name for W3C tracestate
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Header name for request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static CURRENT_REQUEST_ID: String;
}

/// Run `future` with `request_id` as the id outbound calls are tagged with.
pub async fn with_request_id<F>(request_id: String, future: F) -> F::Output
where
    F: Future,
{
    CURRENT_REQUEST_ID.scope(request_id, future).await
}

/// The request id of the inbound request the current task is serving.
pub fn current_request_id() -> Option<String> {
    CURRENT_REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// Inject the current span's trace context, and optionally a request ID,
/// into outgoing headers. Without an active OpenTelemetry span nothing is
/// added for the trace context.
pub fn inject_trace_headers(headers: &mut HeaderMap, request_id: Option<&str>) {
    let span = Span::current();
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if span_context.is_valid() {
        // version-trace_id-span_id-trace_flags
        let traceparent = format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        );

        if let Ok(value) = traceparent.parse() {
            headers.insert(TRACEPARENT_HEADER, value);
        }

        let tracestate = span_context.trace_state().header();
        if !tracestate.is_empty()
            && let Ok(value) = tracestate.parse()
        {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }

    if let Some(id) = request_id
        && let Ok(value) = id.parse()
    {
        headers.insert(REQUEST_ID_HEADER, value);
    }
}

/// Extract a non-empty request ID from incoming request headers.
pub fn extract_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Wraps reqwest's RequestBuilder to inject trace headers and the current
/// request id on send.
pub struct TracedRequest {
    request: reqwest::RequestBuilder,
}

impl TracedRequest {
    pub fn new(request: reqwest::RequestBuilder) -> Self {
        Self { request }
    }

    pub fn header(self, key: &str, value: &str) -> Self {
        Self {
            request: self.request.header(key, value),
        }
    }

    pub fn json<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        Self {
            request: self.request.json(json),
        }
    }

    pub fn form<T: serde::Serialize + ?Sized>(self, form: &T) -> Self {
        Self {
            request: self.request.form(form),
        }
    }

    pub fn bearer_auth<T: std::fmt::Display>(self, token: T) -> Self {
        Self {
            request: self.request.bearer_auth(token),
        }
    }

    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, current_request_id().as_deref());

        self.request.headers(headers).send().await
    }
}

/// Extension trait for reqwest::Client to create traced requests.
pub trait TracedClientExt {
    fn traced_get(&self, url: &str) -> TracedRequest;
    fn traced_post(&self, url: &str) -> TracedRequest;
}

impl TracedClientExt for reqwest::Client {
    fn traced_get(&self, url: &str) -> TracedRequest {
        TracedRequest::new(self.get(url))
    }

    fn traced_post(&self, url: &str) -> TracedRequest {
        TracedRequest::new(self.post(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_trace_headers_without_active_span() {
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, None);
        assert!(headers.is_empty());
    }

    #[test]
    fn request_id_is_injected() {
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, Some("req-42"));

        assert_eq!(extract_request_id(&headers), Some("req-42".to_string()));
        assert!(headers.get(TRACEPARENT_HEADER).is_none());
    }

    #[test]
    fn empty_request_id_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, "".parse().unwrap());
        assert_eq!(extract_request_id(&headers), None);
    }

    #[tokio::test]
    async fn request_id_is_visible_inside_scope_only() {
        assert_eq!(current_request_id(), None);

        let seen = with_request_id("req-7".to_string(), async { current_request_id() }).await;

        assert_eq!(seen.as_deref(), Some("req-7"));
        assert_eq!(current_request_id(), None);
    }
}
