/// URL for accessing the PostgreSQL database (should contain a schema name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Secret used to sign and verify session tokens. Must be the same across replicas.
pub const JWT_SECRET: &str = "JWT_SECRET";
/// TCP port the API listens on. Defaults to 3000 when unset.
pub const PORT: &str = "PORT";
/// Log level configuration for the application. For formatting info, see [EnvFilter's documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";
