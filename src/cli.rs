use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::prometheus_rule::{DEFAULT_ALERTS_FILE_PATH, DEFAULT_RULES_FILE_PATH};

/*
 * ============================================================================
 * Cli
 * ============================================================================
 */
#[allow(clippy::module_name_repetitions)]
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommands,

    /// OTLP endpoint used by every signal without its own endpoint.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", global = true)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    #[arg(long, env = "OTEL_EXPORTER_OTLP_LOGS_ENDPOINT", global = true)]
    pub otel_exporter_otlp_logs_endpoint: Option<String>,

    #[arg(long, env = "OTEL_EXPORTER_OTLP_METRICS_ENDPOINT", global = true)]
    pub otel_exporter_otlp_metrics_endpoint: Option<String>,

    #[arg(long, env = "OTEL_EXPORTER_OTLP_TRACES_ENDPOINT", global = true)]
    pub otel_exporter_otlp_traces_endpoint: Option<String>,

    /// OTLP protocol used by every signal without its own protocol.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_PROTOCOL", value_enum, global = true)]
    pub otel_exporter_otlp_protocol: Option<CliArgsOtelExporterOtlpProtocol>,

    #[arg(long, env = "OTEL_EXPORTER_OTLP_LOGS_PROTOCOL", value_enum, global = true)]
    pub otel_exporter_otlp_logs_protocol: Option<CliArgsOtelExporterOtlpProtocol>,

    #[arg(long, env = "OTEL_EXPORTER_OTLP_METRICS_PROTOCOL", value_enum, global = true)]
    pub otel_exporter_otlp_metrics_protocol: Option<CliArgsOtelExporterOtlpProtocol>,

    #[arg(long, env = "OTEL_EXPORTER_OTLP_TRACES_PROTOCOL", value_enum, global = true)]
    pub otel_exporter_otlp_traces_protocol: Option<CliArgsOtelExporterOtlpProtocol>,

    /// OTLP export timeout in milliseconds.
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_TIMEOUT",
        default_value_t = 10000,
        global = true
    )]
    pub otel_exporter_otlp_timeout: u64,

    #[arg(long, env = "OTEL_EXPORTER_OTLP_LOGS_TIMEOUT", global = true)]
    pub otel_exporter_otlp_logs_timeout: Option<u64>,

    #[arg(long, env = "OTEL_EXPORTER_OTLP_METRICS_TIMEOUT", global = true)]
    pub otel_exporter_otlp_metrics_timeout: Option<u64>,

    #[arg(long, env = "OTEL_EXPORTER_OTLP_TRACES_TIMEOUT", global = true)]
    pub otel_exporter_otlp_traces_timeout: Option<u64>,

    #[arg(
        long,
        env = "OTEL_LOGS_EXPORTER",
        value_enum,
        value_delimiter = ',',
        global = true
    )]
    pub otel_logs_exporter: Option<Vec<CliArgsOtelExporter>>,

    #[arg(
        long,
        env = "OTEL_METRICS_EXPORTER",
        value_enum,
        value_delimiter = ',',
        global = true
    )]
    pub otel_metrics_exporter: Option<Vec<CliArgsOtelExporter>>,

    #[arg(
        long,
        env = "OTEL_TRACES_EXPORTER",
        value_enum,
        value_delimiter = ',',
        global = true
    )]
    pub otel_traces_exporter: Option<Vec<CliArgsOtelExporter>>,

    #[arg(
        long,
        env = "OTEL_SERVICE_NAME",
        default_value = "elasticsearch-operator",
        global = true
    )]
    pub otel_service_name: String,
}

#[must_use]
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[allow(clippy::module_name_repetitions)]
#[derive(Subcommand, Debug)]
pub enum CliCommands {
    /// Controller
    Controller(ControllerArgs),

    /// Custom Resource Definition
    Crd(CrdArgs),

    /// Markdown
    Markdown(MarkdownArgs),

    /// Prometheus Rule
    PrometheusRule(PrometheusRuleArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliArgsOtelExporter {
    Console,
    Otlp,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliArgsOtelExporterOtlpProtocol {
    #[value(name = "grpc")]
    Grpc,

    #[value(name = "http/protobuf")]
    HttpProtobuf,

    #[value(name = "http/json")]
    HttpJson,
}

impl From<CliArgsOtelExporterOtlpProtocol> for opentelemetry_otlp::Protocol {
    fn from(value: CliArgsOtelExporterOtlpProtocol) -> Self {
        match value {
            CliArgsOtelExporterOtlpProtocol::Grpc => opentelemetry_otlp::Protocol::Grpc,
            CliArgsOtelExporterOtlpProtocol::HttpProtobuf => {
                opentelemetry_otlp::Protocol::HttpBinary
            }
            CliArgsOtelExporterOtlpProtocol::HttpJson => opentelemetry_otlp::Protocol::HttpJson,
        }
    }
}

/*
 * ============================================================================
 * Controller
 * ============================================================================
 */
#[derive(Args, Debug)]
pub struct ControllerArgs {
    #[command(subcommand)]
    pub command: ControllerCommands,
}

#[derive(Subcommand, Debug)]
pub enum ControllerCommands {
    /// Run
    Run(ControllerRunArgs),
}

#[derive(Args, Debug)]
pub struct ControllerRunArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    #[command(flatten)]
    pub rule_files: RuleFilesArgs,
}

/*
 * ============================================================================
 * Custom Resource Document
 * ============================================================================
 */
#[derive(Args, Debug)]
pub struct CrdArgs {
    #[command(subcommand)]
    pub command: CrdCommands,
}

#[derive(Subcommand, Debug)]
pub enum CrdCommands {
    /// Generate
    Generate(CrdGenerateArgs),
}

#[derive(Args, Debug)]
pub struct CrdGenerateArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}

/*
 * ============================================================================
 * Markdown
 * ============================================================================
 */
#[derive(Args, Debug)]
pub struct MarkdownArgs {
    #[command(subcommand)]
    pub command: MarkdownCommands,
}

#[derive(Subcommand, Debug)]
pub enum MarkdownCommands {
    /// Generate
    Generate(MarkdownGenerateArgs),
}

#[derive(Args, Debug)]
pub struct MarkdownGenerateArgs {
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/*
 * ============================================================================
 * Prometheus Rule
 * ============================================================================
 */
#[derive(Args, Debug)]
pub struct PrometheusRuleArgs {
    #[command(subcommand)]
    pub command: PrometheusRuleCommands,
}

#[derive(Subcommand, Debug)]
pub enum PrometheusRuleCommands {
    /// Generate the rule spec from the alerts and rules files
    Generate(PrometheusRuleGenerateArgs),
}

#[derive(Args, Debug)]
pub struct PrometheusRuleGenerateArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub rule_files: RuleFilesArgs,
}

/*
 * ============================================================================
 * Shared
 * ============================================================================
 */
#[derive(Args, Debug)]
pub struct RuleFilesArgs {
    /// File with the alerting rule groups.
    #[arg(
        long,
        env = "ALERTS_FILE_PATH",
        default_value = DEFAULT_ALERTS_FILE_PATH,
        value_hint = clap::ValueHint::FilePath
    )]
    pub alerts_file_path: PathBuf,

    /// File with the recording rule groups.
    #[arg(
        long,
        env = "RULES_FILE_PATH",
        default_value = DEFAULT_RULES_FILE_PATH,
        value_hint = clap::ValueHint::FilePath
    )]
    pub rules_file_path: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Yaml,
}
