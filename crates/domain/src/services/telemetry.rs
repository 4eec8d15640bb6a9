//! Process-wide logging and metrics for the CLI and embedders.
//!
//! Logs always go to stderr: stdout carries command output and must stay
//! parseable.

use std::{
    env,
    io::{self, IsTerminal},
    net::SocketAddr,
    sync::Arc,
};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::hydrate_env_file;

const DEFAULT_LOG_FILTER: &str = "info";

static SUBSCRIBER: OnceCell<()> = OnceCell::new();
static RECORDER: OnceCell<Arc<PrometheusHandle>> = OnceCell::new();

/// Logging and metrics knobs read from `<PREFIX>_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    log_filter: String,
    log_ansi: bool,
    metrics_address: Option<String>,
}

impl TelemetryConfig {
    /// Reads `<PREFIX>_LOG_FILTER` (default `info`), `<PREFIX>_LOG_ANSI`
    /// (default: colour only when stderr is a terminal) and
    /// `<PREFIX>_METRICS_ADDRESS` (no listener when unset). Never fails;
    /// bad values surface from [`init_telemetry`].
    pub fn from_env(prefix: &str) -> Self {
        let _ = hydrate_env_file();
        let prefix = prefix.trim().to_ascii_uppercase();
        let read = |name: &str| {
            env::var(format!("{prefix}_{name}"))
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            log_filter: read("LOG_FILTER").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_ansi: read("LOG_ANSI")
                .and_then(|value| parse_flag(&value))
                .unwrap_or_else(|| io::stderr().is_terminal()),
            metrics_address: read("METRICS_ADDRESS"),
        }
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    pub fn log_ansi(&self) -> bool {
        self.log_ansi
    }

    pub fn metrics_address(&self) -> Option<&str> {
        self.metrics_address.as_deref()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_ansi: false,
            metrics_address: None,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Handle to the installed recorder.
#[derive(Clone)]
pub struct TelemetryGuard {
    metrics: Arc<PrometheusHandle>,
}

impl TelemetryGuard {
    /// Current counters in Prometheus text format.
    pub fn render_metrics(&self) -> String {
        self.metrics.render()
    }
}

/// Installs the subscriber and the recorder. Safe to call more than once:
/// later calls reuse what the first one installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|err| TelemetryError::InvalidLogFilter(err.to_string()))?;
    let listener = config.metrics_address().map(parse_listener).transpose()?;

    SUBSCRIBER.get_or_try_init(|| {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(config.log_ansi())
                    .with_target(true),
            )
            .try_init()
            .map_err(|err| TelemetryError::Tracing(err.to_string()))
    })?;

    let metrics = RECORDER
        .get_or_try_init(|| {
            let builder = match listener {
                Some(socket) => PrometheusBuilder::new().with_http_listener(socket),
                None => PrometheusBuilder::new(),
            };
            builder
                .install_recorder()
                .map(Arc::new)
                .map_err(|err| TelemetryError::Metrics(err.to_string()))
        })?
        .clone();

    Ok(TelemetryGuard { metrics })
}

fn parse_listener(address: &str) -> Result<SocketAddr, TelemetryError> {
    address
        .parse()
        .map_err(|err: std::net::AddrParseError| {
            TelemetryError::InvalidMetricsAddress(address.to_string(), err.to_string())
        })
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidLogFilter(String),
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),
    #[error("invalid metrics address `{0}`: {1}")]
    InvalidMetricsAddress(String, String),
    #[error("failed to install metrics recorder: {0}")]
    Metrics(String),
}
