use opentelemetry::sdk::{trace::Tracer, Resource};
use opentelemetry_otlp::WithExportConfig;
use tracing::{subscriber::set_global_default, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, registry::LookupSpan, EnvFilter, Registry,
};

const HONEYCOMB_ENDPOINT: &str = "api.honeycomb.io:443";

pub struct HoneycombConfig {
    pub team: String,
    pub dataset: String,
}

/// Span export to Honeycomb over OTLP. The dataset doubles as the service name.
fn honeycomb_layer<S>(config: HoneycombConfig) -> Result<OpenTelemetryLayer<S, Tracer>, anyhow::Error>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let mut metadata = tonic::metadata::MetadataMap::new();
    metadata.insert("x-honeycomb-team", config.team.parse()?);

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(HONEYCOMB_ENDPOINT)
        .with_metadata(metadata);

    let resource = Resource::new(vec![opentelemetry::KeyValue::new(
        "service.name",
        config.dataset,
    )]);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(opentelemetry::sdk::trace::config().with_resource(resource))
        .with_exporter(exporter)
        .install_batch(opentelemetry::runtime::TokioCurrentThread)?;

    Ok(tracing_opentelemetry::layer().with_tracer(tracer))
}

/// Install the global subscriber. Events are written as bunyan JSON to `console_sink`, filtered
/// by the `LOG` environment variable, and spans go to Honeycomb when it is configured. `log`
/// records from dependencies are forwarded into the same pipeline.
pub fn configure<W>(
    name: impl Into<String>,
    console_sink: W,
    honeycomb_config: Option<HoneycombConfig>,
) -> Result<(), anyhow::Error>
where
    W: for<'a> MakeWriter<'a> + 'static + Send + Sync,
{
    LogTracer::builder()
        .with_max_level(log::LevelFilter::Debug)
        .init()?;

    let env_filter = EnvFilter::try_from_env("LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let telemetry = honeycomb_config.map(honeycomb_layer).transpose()?;

    let subscriber = Registry::default()
        .with(telemetry)
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(name.into(), console_sink));

    set_global_default(subscriber)?;
    Ok(())
}

/// Flush any spans still waiting to be exported.
pub fn teardown() {
    opentelemetry::global::shutdown_tracer_provider();
}
