use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter used when neither `RUST_LOG` nor `logging.filter` is set.
pub const DEFAULT_FILTER: &str = "market_scanner=info,warn";

/// Initialise the global tracing subscriber.
///
/// Scan results go to a daily-rolling JSON file under `log_dir`; a compact
/// human-readable copy goes to stderr so stdout stays free for the result
/// payload. Returns a [`WorkerGuard`] that **must** be held for the lifetime
/// of the process, dropping it flushes and closes the file writer.
pub fn init_tracing(logging: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.log_dir)
        .with_context(|| format!("failed to create log dir {}", logging.log_dir))?;

    let file_appender = tracing_appender::rolling::daily(&logging.log_dir, &logging.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(resolve_filter(logging)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .json(),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(guard)
}

fn resolve_filter(logging: &LoggingConfig) -> &str {
    logging
        .filter
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(filter: Option<&str>) -> LoggingConfig {
        LoggingConfig {
            log_dir: "logs".into(),
            file_prefix: "scanner.log".into(),
            filter: filter.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_filter_default() {
        assert_eq!(resolve_filter(&logging(None)), DEFAULT_FILTER);
        assert_eq!(resolve_filter(&logging(Some("  "))), DEFAULT_FILTER);
    }

    #[test]
    fn test_resolve_filter_configured() {
        assert_eq!(
            resolve_filter(&logging(Some("market_scanner=debug"))),
            "market_scanner=debug"
        );
    }
}
