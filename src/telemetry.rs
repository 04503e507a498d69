use crate::config::{Exporter, OtelConfig};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{ExportConfig, WithExportConfig};
use opentelemetry_sdk::logs::LoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{RandomIdGenerator, TracerProvider};
use opentelemetry_sdk::{runtime, trace, Resource};
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to init {signal} exporter: {message}")]
    Exporter {
        signal: &'static str,
        message: String,
    },

    #[error("failed to install subscriber: {0}")]
    Subscriber(String),
}

impl TelemetryError {
    fn exporter(signal: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Exporter {
            signal,
            message: err.to_string(),
        }
    }
}

fn resource(service_name: &'static str) -> Resource {
    Resource::new(vec![KeyValue::new(
        opentelemetry_semantic_conventions::resource::SERVICE_NAME,
        service_name,
    )])
}

fn init_stdout_tracer(resource: Resource) -> TracerProvider {
    TracerProvider::builder()
        .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
        .with_config(trace::Config::default().with_resource(resource))
        .build()
}

fn init_tracer(otel_config: &OtelConfig, resource: Resource) -> Result<TracerProvider, TelemetryError> {
    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(
            trace::Config::default()
                .with_resource(resource)
                .with_id_generator(RandomIdGenerator::default()),
        )
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(otel_config.endpoint.clone())
                .with_timeout(Duration::from_secs(5)),
        )
        .install_batch(runtime::Tokio)
        .map_err(|err| TelemetryError::exporter("trace", err))
}

fn build_metrics_provider(
    otel_config: &OtelConfig,
    resource: Resource,
) -> Result<SdkMeterProvider, TelemetryError> {
    let export_config = ExportConfig {
        endpoint: otel_config.endpoint.clone(),
        ..ExportConfig::default()
    };
    opentelemetry_otlp::new_pipeline()
        .metrics(runtime::Tokio)
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_timeout(Duration::from_secs(2))
                .with_export_config(export_config),
        )
        .with_resource(resource)
        .build()
        .map_err(|err| TelemetryError::exporter("metrics", err))
}

fn init_logs(otel_config: &OtelConfig, resource: Resource) -> Result<LoggerProvider, TelemetryError> {
    opentelemetry_otlp::new_pipeline()
        .logging()
        .with_resource(resource)
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(otel_config.endpoint.clone())
                .with_timeout(Duration::from_secs(2)),
        )
        .install_batch(runtime::Tokio)
        .map_err(|err| TelemetryError::exporter("logs", err))
}

/// Routes `log` records into `tracing`. Fails if another logger is already set.
fn install_log_bridge() -> Result<(), tracing_log::log::SetLoggerError> {
    tracing_log::LogTracer::init()
}

/// Providers kept alive for the life of the process.
pub struct Telemetry {
    tracer_provider: TracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: Option<LoggerProvider>,
}

impl Telemetry {
    /// Flushes pending spans, metrics and logs. Blocks, so call it off the
    /// async workers.
    pub fn shutdown(self) {
        if let Err(err) = self.meter_provider.shutdown() {
            eprintln!("failed to shut down meter provider: {err}");
        }
        if let Some(logger_provider) = self.logger_provider {
            if let Err(err) = logger_provider.shutdown() {
                eprintln!("failed to shut down logger provider: {err}");
            }
        }
        for result in self.tracer_provider.force_flush() {
            if let Err(err) = result {
                eprintln!("failed to flush spans: {err}");
            }
        }
        global::shutdown_tracer_provider();
    }
}

/// Installs the W3C propagator, the global tracer and meter providers, and the
/// `tracing` subscriber. Must run inside a Tokio runtime.
pub fn init_telemetry(
    service_name: &'static str,
    otel_config: &OtelConfig,
) -> Result<Telemetry, TelemetryError> {
    global::set_text_map_propagator(TraceContextPropagator::new());
    let resource = resource(service_name);

    let (tracer_provider, meter_provider, logger_provider) = match otel_config.exporter {
        Exporter::Otlp => (
            init_tracer(otel_config, resource.clone())?,
            build_metrics_provider(otel_config, resource.clone())?,
            Some(init_logs(otel_config, resource)?),
        ),
        Exporter::Stdout => (
            init_stdout_tracer(resource.clone()),
            SdkMeterProvider::builder().with_resource(resource).build(),
            None,
        ),
    };
    global::set_tracer_provider(tracer_provider.clone());
    global::set_meter_provider(meter_provider.clone());

    let trace_layer =
        tracing_opentelemetry::layer().with_tracer(tracer_provider.tracer(service_name));
    let logger_layer = logger_provider
        .as_ref()
        .map(OpenTelemetryTracingBridge::new);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::Layer::new()
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .compact(),
        )
        .with(trace_layer)
        .with(logger_layer)
        .try_init()
        .map_err(|err| TelemetryError::Subscriber(err.to_string()))?;
    if let Err(err) = install_log_bridge() {
        eprintln!("failed to install log bridge: {err}");
    }
    std::panic::set_hook(Box::new(tracing_panic::panic_hook));

    tracing::info!(service = service_name, exporter = ?otel_config.exporter, "telemetry initialized");

    Ok(Telemetry {
        tracer_provider,
        meter_provider,
        logger_provider,
    })
}
