//! # Intake Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize tracing (optionally exported over OTLP)
//! - Connect the store, ledger, queue and cache adapters
//! - Start the HTTP server

mod config;
mod pools;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use intake_hex::{IntakeConfig, IntakeService, inbound::HttpServer};
use intake_repo::{LedgerOptions, PostgresLedger, PostgresQueue, PostgresStore, RedisCache};
use intake_types::CurrencyPolicy;

use config::{Config, LogFormat};
use pools::Pools;

fn init_tracer(endpoint: &str) -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("transaction-intake"), provider))
}

fn init_tracing(config: &Config) -> anyhow::Result<Option<sdktrace::SdkTracerProvider>> {
    let (telemetry, provider) = match &config.otel_endpoint {
        Some(endpoint) => {
            let (tracer, provider) = init_tracer(endpoint)?;
            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(provider),
            )
        }
        None => (None, None),
    };

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,intake_app=debug,intake_hex=debug".into()),
        )
        .with(telemetry)
        .init();

    Ok(provider)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let otel_provider = init_tracing(&config)?;

    tracing::info!("Starting intake server on port {}", config.port);

    let pools = Pools::connect(&config).await?;

    let store = Arc::new(PostgresStore::new(pools.store));
    let ledger = Arc::new(PostgresLedger::new(
        pools.ledger,
        LedgerOptions {
            reservation_ttl: config.reservation_ttl,
            max_latency: config.ledger_max_latency,
        },
    ));
    let queue = Arc::new(PostgresQueue::new(
        pools.queue,
        config.queue_visibility_timeout,
    ));
    let cache = Arc::new(RedisCache::new(&config.redis_url)?);

    let service = IntakeService::new(
        store,
        ledger,
        cache,
        queue,
        IntakeConfig {
            request_timeout: config.request_timeout,
            idempotency_ttl: config.idempotency_ttl,
            currency: CurrencyPolicy::USD,
        },
    );

    let server = HttpServer::new(service);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    if let Some(provider) = otel_provider {
        let _ = provider.shutdown();
    }
    Ok(())
}
