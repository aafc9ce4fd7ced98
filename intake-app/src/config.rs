//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unknown log format '{}'", other),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Mock ledger database; defaults to `database_url`
    pub ledger_database_url: String,
    /// Queue database; defaults to `database_url`
    pub queue_database_url: String,
    pub redis_url: String,
    pub request_timeout: Duration,
    pub idempotency_ttl: Duration,
    pub reservation_ttl: Duration,
    pub ledger_max_latency: Duration,
    pub queue_visibility_timeout: Duration,
    pub log_format: LogFormat,
    /// OTLP collector; tracing export is off when unset
    pub otel_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |name: &str, default: &str| -> anyhow::Result<u64> {
            let raw = lookup(name).unwrap_or_else(|| default.to_string());
            raw.parse()
                .with_context(|| format!("{} must be a non-negative integer, got '{}'", name, raw))
        };

        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .context("PORT must be a valid port number")?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let log_format = lookup("LOG_FORMAT")
            .map(|raw| raw.parse::<LogFormat>())
            .transpose()?
            .unwrap_or(LogFormat::Pretty);

        Ok(Self {
            port,
            ledger_database_url: lookup("LEDGER_DATABASE_URL")
                .unwrap_or_else(|| database_url.clone()),
            queue_database_url: lookup("QUEUE_DATABASE_URL")
                .unwrap_or_else(|| database_url.clone()),
            database_url,
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            request_timeout: Duration::from_millis(parsed("REQUEST_TIMEOUT_MS", "10000")?),
            idempotency_ttl: Duration::from_secs(parsed("IDEMPOTENCY_TTL_SECS", "86400")?),
            reservation_ttl: Duration::from_secs(parsed("RESERVATION_TTL_SECS", "3600")?),
            ledger_max_latency: Duration::from_millis(parsed("LEDGER_MAX_LATENCY_MS", "50")?),
            queue_visibility_timeout: Duration::from_secs(parsed(
                "QUEUE_VISIBILITY_TIMEOUT_SECS",
                "30",
            )?),
            log_format,
            otel_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }
}
