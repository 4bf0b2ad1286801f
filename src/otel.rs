use std::time::Duration;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{ExporterBuildError, Protocol, WithExportConfig};
use opentelemetry_sdk::{
    logs::SdkLoggerProvider, metrics::SdkMeterProvider, trace::SdkTracerProvider,
};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    EnvFilter, Layer as _, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use crate::cli::{CliArgs, CliArgsOtelExporter, CliArgsOtelExporterOtlpProtocol};

pub struct Provider {
    logger: SdkLoggerProvider,
    meter: SdkMeterProvider,
    service_name: String,
    tracer: SdkTracerProvider,
}

impl Provider {
    /// # Errors
    ///
    /// Will return `Err` if an OTLP exporter could not be built.
    pub fn new(cli: &CliArgs) -> Result<Self, ExporterBuildError> {
        Ok(Self {
            logger: logger_provider(cli)?,
            meter: meter_provider(cli)?,
            service_name: cli.otel_service_name.clone(),
            tracer: tracer_provider(cli)?,
        })
    }

    #[must_use]
    pub fn meter(&self) -> &SdkMeterProvider {
        &self.meter
    }

    pub fn init_tracing_subscriber(&self) {
        let logger_layer =
            OpenTelemetryTracingBridge::new(&self.logger).with_filter(external_component_filter());

        let tracer_layer = OpenTelemetryLayer::new(self.tracer.tracer(self.service_name.clone()))
            .with_filter(external_component_filter());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_thread_names(true)
            .with_filter(EnvFilter::from_default_env());

        tracing_subscriber::registry()
            .with(logger_layer)
            .with(tracer_layer)
            .with(fmt_layer)
            .init();
    }

    /// # Errors
    ///
    /// Will return `Err` if open telemetry providers could not shutdown.
    pub fn shutdown(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        let mut shutdown_errors = Vec::new();
        if let Err(e) = self.tracer.shutdown() {
            shutdown_errors.push(format!("tracer provider: {e}"));
        }
        if let Err(e) = self.meter.shutdown() {
            shutdown_errors.push(format!("meter provider: {e}"));
        }
        if let Err(e) = self.logger.shutdown() {
            shutdown_errors.push(format!("logger provider: {e}"));
        }
        if !shutdown_errors.is_empty() {
            return Err(format!(
                "Failed to shutdown providers:{}",
                shutdown_errors.join("\n")
            )
            .into());
        }

        Ok(())
    }
}

/// Logs emitted by the OTLP exporter's own transport (hyper, tonic, h2,
/// reqwest) would be exported again, so they are dropped from the exporting
/// layers.
///
/// See <https://github.com/open-telemetry/opentelemetry-rust/issues/2877>.
#[allow(clippy::missing_panics_doc)]
fn external_component_filter() -> EnvFilter {
    EnvFilter::from_default_env()
        .add_directive("hyper=off".parse().unwrap())
        .add_directive("tonic=off".parse().unwrap())
        .add_directive("h2=off".parse().unwrap())
        .add_directive("reqwest=off".parse().unwrap())
}

fn resource(cli: &CliArgs) -> opentelemetry_sdk::Resource {
    opentelemetry_sdk::Resource::builder()
        .with_service_name(cli.otel_service_name.clone())
        .build()
}

/*
 * ============================================================================
 * Signals
 * ============================================================================
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Logs,
    Metrics,
    Traces,
}

impl Signal {
    fn exporters(self, cli: &CliArgs) -> &[CliArgsOtelExporter] {
        match self {
            Signal::Logs => cli.otel_logs_exporter.as_deref(),
            Signal::Metrics => cli.otel_metrics_exporter.as_deref(),
            Signal::Traces => cli.otel_traces_exporter.as_deref(),
        }
        .unwrap_or_default()
    }

    fn has_exporter(self, cli: &CliArgs, exporter: CliArgsOtelExporter) -> bool {
        self.exporters(cli).contains(&exporter)
    }

    /// The signal's own endpoint, or the shared endpoint with the signal's
    /// path appended for HTTP protocols.
    fn endpoint(self, cli: &CliArgs, protocol: Protocol) -> String {
        let own = match self {
            Signal::Logs => &cli.otel_exporter_otlp_logs_endpoint,
            Signal::Metrics => &cli.otel_exporter_otlp_metrics_endpoint,
            Signal::Traces => &cli.otel_exporter_otlp_traces_endpoint,
        };

        if let Some(endpoint) = own {
            return endpoint.clone();
        }

        let shared = cli
            .otel_exporter_otlp_endpoint
            .clone()
            .unwrap_or_else(|| match protocol {
                Protocol::Grpc => "http://localhost:4317".into(),
                Protocol::HttpBinary | Protocol::HttpJson => "http://localhost:4318".into(),
            });

        match protocol {
            Protocol::Grpc => shared,
            Protocol::HttpBinary | Protocol::HttpJson => {
                format!("{}/v1/{}", shared.trim_end_matches('/'), self.path())
            }
        }
    }

    fn path(self) -> &'static str {
        match self {
            Signal::Logs => "logs",
            Signal::Metrics => "metrics",
            Signal::Traces => "traces",
        }
    }

    fn protocol(self, cli: &CliArgs) -> Protocol {
        match self {
            Signal::Logs => cli.otel_exporter_otlp_logs_protocol,
            Signal::Metrics => cli.otel_exporter_otlp_metrics_protocol,
            Signal::Traces => cli.otel_exporter_otlp_traces_protocol,
        }
        .or(cli.otel_exporter_otlp_protocol)
        .unwrap_or(CliArgsOtelExporterOtlpProtocol::Grpc)
        .into()
    }

    fn timeout(self, cli: &CliArgs) -> Duration {
        Duration::from_millis(
            match self {
                Signal::Logs => cli.otel_exporter_otlp_logs_timeout,
                Signal::Metrics => cli.otel_exporter_otlp_metrics_timeout,
                Signal::Traces => cli.otel_exporter_otlp_traces_timeout,
            }
            .unwrap_or(cli.otel_exporter_otlp_timeout),
        )
    }
}

/*
 * ============================================================================
 * Providers
 * ============================================================================
 */
fn logger_provider(cli: &CliArgs) -> Result<SdkLoggerProvider, ExporterBuildError> {
    let signal = Signal::Logs;
    let mut provider_builder = SdkLoggerProvider::builder().with_resource(resource(cli));

    if signal.has_exporter(cli, CliArgsOtelExporter::Console) {
        provider_builder =
            provider_builder.with_simple_exporter(opentelemetry_stdout::LogExporter::default());
    }

    if signal.has_exporter(cli, CliArgsOtelExporter::Otlp) {
        let protocol = signal.protocol(cli);
        let exporter = match protocol {
            Protocol::Grpc => opentelemetry_otlp::LogExporter::builder()
                .with_tonic()
                .with_endpoint(signal.endpoint(cli, protocol))
                .with_protocol(protocol)
                .with_timeout(signal.timeout(cli))
                .build()?,
            Protocol::HttpBinary | Protocol::HttpJson => {
                opentelemetry_otlp::LogExporter::builder()
                    .with_http()
                    .with_endpoint(signal.endpoint(cli, protocol))
                    .with_protocol(protocol)
                    .with_timeout(signal.timeout(cli))
                    .build()?
            }
        };
        provider_builder = provider_builder.with_batch_exporter(exporter);
    }

    Ok(provider_builder.build())
}

fn meter_provider(cli: &CliArgs) -> Result<SdkMeterProvider, ExporterBuildError> {
    let signal = Signal::Metrics;
    let mut provider_builder = SdkMeterProvider::builder().with_resource(resource(cli));

    if signal.has_exporter(cli, CliArgsOtelExporter::Console) {
        provider_builder = provider_builder
            .with_periodic_exporter(opentelemetry_stdout::MetricExporterBuilder::default().build());
    }

    if signal.has_exporter(cli, CliArgsOtelExporter::Otlp) {
        let protocol = signal.protocol(cli);
        let exporter = match protocol {
            Protocol::Grpc => opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(signal.endpoint(cli, protocol))
                .with_protocol(protocol)
                .with_timeout(signal.timeout(cli))
                .build()?,
            Protocol::HttpBinary | Protocol::HttpJson => {
                opentelemetry_otlp::MetricExporter::builder()
                    .with_http()
                    .with_endpoint(signal.endpoint(cli, protocol))
                    .with_protocol(protocol)
                    .with_timeout(signal.timeout(cli))
                    .build()?
            }
        };
        provider_builder = provider_builder.with_periodic_exporter(exporter);
    }

    Ok(provider_builder.build())
}

fn tracer_provider(cli: &CliArgs) -> Result<SdkTracerProvider, ExporterBuildError> {
    let signal = Signal::Traces;
    let mut provider_builder = SdkTracerProvider::builder().with_resource(resource(cli));

    if signal.has_exporter(cli, CliArgsOtelExporter::Console) {
        provider_builder =
            provider_builder.with_simple_exporter(opentelemetry_stdout::SpanExporter::default());
    }

    if signal.has_exporter(cli, CliArgsOtelExporter::Otlp) {
        let protocol = signal.protocol(cli);
        let exporter = match protocol {
            Protocol::Grpc => opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(signal.endpoint(cli, protocol))
                .with_protocol(protocol)
                .with_timeout(signal.timeout(cli))
                .build()?,
            Protocol::HttpBinary | Protocol::HttpJson => {
                opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .with_endpoint(signal.endpoint(cli, protocol))
                    .with_protocol(protocol)
                    .with_timeout(signal.timeout(cli))
                    .build()?
            }
        };
        provider_builder = provider_builder.with_batch_exporter(exporter);
    }

    Ok(provider_builder.build())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use opentelemetry_otlp::Protocol;

    use crate::cli::CliArgs;

    use super::Signal;

    fn cli(args: &[&str]) -> CliArgs {
        let mut argv = vec!["elasticsearch-operator"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["markdown", "generate"]);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn endpoint_appends_signal_path_for_http() {
        // arrange
        let cli = cli(&["--otel-exporter-otlp-endpoint", "http://collector:4318/"]);

        // act
        let endpoint = Signal::Metrics.endpoint(&cli, Protocol::HttpBinary);

        // assert
        assert_eq!("http://collector:4318/v1/metrics", endpoint);
    }

    #[test]
    fn endpoint_prefers_signal_endpoint() {
        // arrange
        let cli = cli(&[
            "--otel-exporter-otlp-endpoint",
            "http://collector:4317",
            "--otel-exporter-otlp-traces-endpoint",
            "http://traces:4317",
        ]);

        // act & assert
        assert_eq!(
            "http://traces:4317",
            Signal::Traces.endpoint(&cli, Protocol::Grpc)
        );
        assert_eq!(
            "http://collector:4317",
            Signal::Logs.endpoint(&cli, Protocol::Grpc)
        );
    }

    #[test]
    fn timeout_falls_back_to_shared_timeout() {
        // arrange
        let cli = cli(&[
            "--otel-exporter-otlp-timeout",
            "2000",
            "--otel-exporter-otlp-logs-timeout",
            "500",
        ]);

        // act & assert
        assert_eq!(Duration::from_millis(500), Signal::Logs.timeout(&cli));
        assert_eq!(Duration::from_millis(2000), Signal::Metrics.timeout(&cli));
    }
}
