//! Telemetry initialization for OpenTelemetry tracing and metrics
//!
//! Provides unified telemetry setup with:
//! - W3C TraceContext propagation for distributed tracing
//! - OTLP export for traces and metrics when `OTEL_EXPORTER_OTLP_ENDPOINT` is set
//! - Structured logging, JSON or human readable

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize OpenTelemetry tracer
    #[error("failed to initialize tracer: {0}")]
    TracerInit(String),

    /// Failed to initialize OTLP metrics exporter
    #[error("failed to initialize metrics exporter: {0}")]
    MetricsInit(String),

    /// Failed to initialize tracing subscriber
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Log line format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per line with trace context
    Json,
}

/// Configuration for telemetry initialization
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for traces and metrics (e.g., "hdi")
    pub service_name: String,

    /// OTLP endpoint for trace and metric export (e.g., "http://otel-collector:4317")
    /// If None, traces and metrics are only logged locally
    pub otlp_endpoint: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "hdi".to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            log_format: LogFormat::default(),
            default_filter: "info,hdi=debug,reqwest=warn,hyper=warn".to_string(),
        }
    }
}

/// Keeps exporters alive; flushes and shuts them down on drop
#[must_use = "dropping the guard shuts telemetry export down"]
#[derive(Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<TracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shut down tracer provider: {e}");
            }
        }
        if let Some(provider) = self.meter_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shut down meter provider: {e}");
            }
        }
    }
}

/// Initialize telemetry with the given configuration
///
/// Sets up:
/// - W3C TraceContext propagator for distributed tracing
/// - OTLP exporter for traces and metrics if `otlp_endpoint` is configured
/// - Structured logging with trace context
///
/// # Example
///
/// ```ignore
/// use hdi_common::telemetry::{init_telemetry, TelemetryConfig};
///
/// let _guard = init_telemetry(TelemetryConfig::default())?;
/// ```
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = build_resource(&config.service_name);
    let mut guard = TelemetryGuard::default();

    // Option<Layer> implements Layer, so we can compose it directly
    let otel_layer = if let Some(endpoint) = &config.otlp_endpoint {
        guard.meter_provider = Some(init_otlp_metrics(endpoint, resource.clone())?);
        let provider = init_otlp_tracer(endpoint, resource)?;
        let tracer = provider.tracer(config.service_name.clone());
        guard.tracer_provider = Some(provider);
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::SubscriberInit(e.to_string())
        })?;

    Ok(guard)
}

/// Build OpenTelemetry resource with service info
fn build_resource(service_name: &str) -> Resource {
    let mut attributes = vec![KeyValue::new(
        opentelemetry_semantic_conventions::resource::SERVICE_NAME,
        service_name.to_string(),
    )];

    if let Some(version) = option_env!("CARGO_PKG_VERSION") {
        attributes.push(KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
            version.to_string(),
        ));
    }

    if let Ok(host) = std::env::var("HOSTNAME") {
        attributes.push(KeyValue::new("host.name", host));
    }

    Resource::new(attributes)
}

fn init_otlp_tracer(endpoint: &str, resource: Resource) -> Result<TracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(resource)
        .build();

    global::set_tracer_provider(provider.clone());

    Ok(provider)
}

fn init_otlp_metrics(endpoint: &str, resource: Resource) -> Result<SdkMeterProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let reader =
        opentelemetry_sdk::metrics::PeriodicReader::builder(exporter, runtime::Tokio).build();

    let meter_provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build();

    global::set_meter_provider(meter_provider.clone());

    Ok(meter_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_names_the_service() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "hdi");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.default_filter.starts_with("info"));
    }

    #[test]
    fn test_build_resource() {
        let resource = build_resource("test-service");
        assert!(!resource.is_empty());
    }

    #[test]
    fn empty_guard_drops_cleanly() {
        let guard = TelemetryGuard::default();
        drop(guard);
    }
}
