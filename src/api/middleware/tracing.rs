//! HTTP request/response tracing middleware.

use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Creates the request tracing layer.
///
/// One `INFO` span per request (method, URI, version) and an `INFO` event on
/// response with the status and latency in milliseconds:
///
/// ```text
/// INFO request{method=GET uri=/track/Xk3_a9ZpQ2w version=HTTP/1.1}: finished processing request latency=3 ms status=307
/// ```
///
/// Query strings are part of the URI, so bearer tokens must never be passed
/// that way.
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
