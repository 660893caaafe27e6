//! Logging and tracing setup.
//!
//! Events go to stderr through the fmt layer. Spans are additionally exported
//! over OTLP/gRPC when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use std::env;
use tracing::Level;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "informix_exporter";

static PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

/// `RUST_LOG` wins over the `-v` derived level.
fn filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

fn otlp_endpoint() -> Option<String> {
    env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .filter(|endpoint| !endpoint.trim().is_empty())
}

/// Install the global subscriber. Must run inside the tokio runtime.
///
/// # Errors
///
/// Returns an error if the OTLP exporter cannot be built or a subscriber is
/// already installed.
pub fn init(level: Level) -> Result<()> {
    let otel = match otlp_endpoint() {
        Some(endpoint) => {
            let exporter = SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .context("failed to build OTLP span exporter")?;

            let provider = SdkTracerProvider::builder()
                .with_batch_exporter(exporter)
                .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
                .build();

            let tracer = provider.tracer(SERVICE_NAME);
            global::set_tracer_provider(provider.clone());
            let _ = PROVIDER.set(provider);

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    let exporting = otel.is_some();

    tracing_subscriber::registry()
        .with(filter(level))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(otel)
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::debug!(otlp = exporting, "telemetry initialized");

    Ok(())
}

/// Flush pending spans.
pub fn shutdown() {
    if let Some(provider) = PROVIDER.get()
        && let Err(e) = provider.shutdown()
    {
        eprintln!("failed to shut down tracer provider: {e}");
    }
}
