use crate::app_env;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::Tracer;
use opentelemetry_sdk::{Resource, runtime};
use std::env;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing::{Span, debug, debug_span, field};
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer, OpenTelemetrySpanExt};
use tracing_subscriber::{EnvFilter, prelude::*, registry};

/// The name of the service as it should appear in OpenTelemetry collectors
const SERVICE_NAME: &str = "listly";

/// Struct containing OpenTelemetry primitives which export data to a tracing server
pub struct OtelExporters {
    pub tracer: Tracer,
    pub meter: SdkMeterProvider,
}

/// Attaches a tracing middleware layer to the given router. Every request gets a span
/// carrying the method and path, and the response status plus handling time are recorded
/// once the response is produced. Incoming W3C trace context headers are honored so spans
/// join traces started by upstream callers.
pub fn attach_tracing_http<T>(router: Router<T>) -> Router<T>
where
    T: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let req_span = debug_span!(
                        "request",
                        method = &request.method().as_str(),
                        path = request.uri().path(),
                        response_status = field::Empty,
                        latency_ms = field::Empty,
                    );

                    req_span.set_parent(global::get_text_map_propagator(|propagator| {
                        propagator.extract(&HeaderExtractor(request.headers()))
                    }));

                    req_span
                })
                .on_response(
                    |response: &Response<Body>, latency: Duration, span: &Span| {
                        span.record("response_status", field::display(response.status()));
                        span.record("latency_ms", latency.as_millis() as u64);
                        debug!("request processing complete");
                    },
                ),
        ),
    )
}

/// Builds OpenTelemetry exporters when both [app_env::OTEL_SPAN_EXPORT_URL] and
/// [app_env::OTEL_METRIC_EXPORT_URL] are set. Returns [None] if either is missing so the
/// service can run without a collector sidecar (local development, CI).
pub fn exporters_from_env() -> Option<OtelExporters> {
    let traces_endpoint = env::var(app_env::OTEL_SPAN_EXPORT_URL).ok()?;
    let metrics_endpoint = env::var(app_env::OTEL_METRIC_EXPORT_URL).ok()?;

    Some(init_exporters(&traces_endpoint, &metrics_endpoint))
}

/// OpenTelemetry resource identifying this service in collectors
fn otel_resource() -> Resource {
    Resource::new([KeyValue::new("service.name", SERVICE_NAME)])
}

/// Instantiates OpenTelemetry exporters which run in the background and send tracing/logging/metrics
/// data to an opentelemetry-compatible gRPC endpoint (typically http://localhost:4317 with a standard
/// sidecar setup)
pub fn init_exporters(otlp_traces_endpoint: &str, otlp_metrics_endpoint: &str) -> OtelExporters {
    let span_exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(otlp_traces_endpoint)
        .build()
        .expect("failed to build span exporter");
    let metric_exporter = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(otlp_metrics_endpoint)
        .build()
        .expect("failed to build meter exporter");

    let tracer = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(span_exporter, runtime::Tokio)
        .with_resource(otel_resource())
        .build()
        .tracer(SERVICE_NAME);
    let meter = SdkMeterProvider::builder()
        .with_reader(PeriodicReader::builder(metric_exporter, runtime::Tokio).build())
        .with_resource(otel_resource())
        .build();

    OtelExporters { tracer, meter }
}

/// Constructs a filter which uses [app_env::LOG_LEVEL] to configure per-module logging. Filters
/// to the "info" level by default.
pub fn init_env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(app_env::LOG_LEVEL)
        .from_env()
        .expect("building the logging filter failed")
}

/// Sets up the global logging and tracing sinks. All logs and metrics at the "debug" level and above
/// will automatically be sent to OpenTelemetry sinks if [otel_exporters] is provided. [env_filter] is
/// applied specifically to the JSON logger printing to stdout.
pub fn setup_logging_and_tracing(env_filter: EnvFilter, otel_exporters: Option<OtelExporters>) {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Option<Layer> is itself a layer, which keeps the no-collector setup from
    // duplicating the whole subscriber stack
    let (otel_trace_layer, otel_metrics_layer) = match otel_exporters {
        Some(exporters) => (
            Some(OpenTelemetryLayer::new(exporters.tracer)),
            Some(MetricsLayer::new(exporters.meter)),
        ),
        None => (None, None),
    };

    registry()
        .with(LevelFilter::DEBUG)
        .with(otel_trace_layer)
        .with(otel_metrics_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_filter(env_filter),
        )
        .init();
}
