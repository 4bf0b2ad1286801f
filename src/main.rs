use std::{fs::File, io::Write, net::SocketAddr, path::Path};

use elasticsearch_operator::{
    cli::{
        CliArgs, CliCommands, ControllerCommands, ControllerRunArgs, CrdCommands,
        CrdGenerateArgs, MarkdownCommands, MarkdownGenerateArgs, OutputFormat,
        PrometheusRuleCommands, PrometheusRuleGenerateArgs, RuleFilesArgs, parse,
    },
    elasticsearch, http_server,
    kubernetes::RetryPolicy,
    metrics::Metrics,
    otel, prometheus_rule,
};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = parse();

    let provider = otel::Provider::new(&cli)?;
    provider.init_tracing_subscriber();

    let result = match &cli.command {
        CliCommands::Controller(controller) => match &controller.command {
            ControllerCommands::Run(run) => controller_run(&provider, run).await,
        },
        CliCommands::Crd(crd) => match &crd.command {
            CrdCommands::Generate(generate) => crd_generate(generate),
        },
        CliCommands::Markdown(markdown) => match &markdown.command {
            MarkdownCommands::Generate(generate) => markdown_generate(generate),
        },
        CliCommands::PrometheusRule(prometheus_rule) => match &prometheus_rule.command {
            PrometheusRuleCommands::Generate(generate) => prometheus_rule_generate(generate).await,
        },
    };

    provider.shutdown()?;

    result
}

async fn controller_run(provider: &otel::Provider, run: &ControllerRunArgs) -> Result<(), BoxError> {
    let addr: SocketAddr = format!("{}:{}", run.host, run.port).parse()?;

    let client = kube::Client::try_default().await?;
    let metrics = Metrics::new(provider.meter());

    let config = elasticsearch::Config {
        prometheus_rule: prometheus_rule_config(&run.rule_files),
    };

    let http_server = http_server::run(addr);
    let controller = elasticsearch::run_controller(client, config, metrics);

    tokio::select! {
        result = http_server => result?,
        () = controller => {},
    }

    Ok(())
}

fn crd_generate(generate: &CrdGenerateArgs) -> Result<(), BoxError> {
    let crd = elasticsearch::generate_custom_resource_definition();

    let content = serialize(generate.format, &crd)?;

    if let Some(output) = &generate.output {
        let path = match generate.format {
            OutputFormat::Json => output.join("elasticsearch.json"),
            OutputFormat::Yaml => output.join("elasticsearch.yaml"),
        };

        write(&path, &content)?;
    } else {
        print!("{content}");
    }

    Ok(())
}

fn markdown_generate(generate: &MarkdownGenerateArgs) -> Result<(), BoxError> {
    let content = clap_markdown::help_markdown::<CliArgs>();

    if let Some(output) = &generate.output {
        write(output, &content)?;
    } else {
        print!("{content}");
    }

    Ok(())
}

async fn prometheus_rule_generate(generate: &PrometheusRuleGenerateArgs) -> Result<(), BoxError> {
    let spec = prometheus_rule::build_rule_spec(&prometheus_rule_config(&generate.rule_files)).await?;

    print!("{}", serialize(generate.format, &spec)?);

    Ok(())
}

fn prometheus_rule_config(rule_files: &RuleFilesArgs) -> prometheus_rule::Config {
    prometheus_rule::Config {
        alerts_file_path: rule_files.alerts_file_path.clone(),
        rules_file_path: rule_files.rules_file_path.clone(),
        retry: RetryPolicy::default(),
    }
}

fn serialize<T: serde::Serialize>(format: OutputFormat, value: &T) -> Result<String, BoxError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    })
}

fn write(path: &Path, content: &str) -> std::io::Result<()> {
    File::create(path)?.write_all(content.as_bytes())
}
