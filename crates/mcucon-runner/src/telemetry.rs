//! Logging and metrics setup.

use tracing_subscriber::EnvFilter;

use crate::config::MetricsConfig;
use crate::error::RunnerResult;

/// Install the tracing subscriber.
///
/// An explicit `level` wins over `RUST_LOG`; with neither, `info` is used.
pub fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Describe console metrics and start the exporter if one is configured.
///
/// Must be called inside a tokio runtime when the exporter is enabled.
pub fn install_metrics(config: &MetricsConfig) -> RunnerResult<()> {
    #[cfg(feature = "prometheus")]
    if let Some(listen) = &config.prometheus_listen {
        use crate::error::RunnerError;

        let addr: std::net::SocketAddr = listen
            .parse()
            .map_err(|e| RunnerError::Metrics(format!("invalid prometheus_listen {listen:?}: {e}")))?;
        mcucon_metrics::install_prometheus(addr).map_err(|e| RunnerError::Metrics(e.to_string()))?;
        tracing::info!(addr = %addr, "Prometheus exporter listening");
    }

    #[cfg(not(feature = "prometheus"))]
    if config.prometheus_listen.is_some() {
        tracing::warn!("prometheus_listen is set but the prometheus feature is disabled");
    }

    mcucon_metrics::describe_metrics();
    Ok(())
}
