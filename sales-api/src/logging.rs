use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::AppError;

pub const SERVICE_NAME: &str = "sales-api";

/// Dependencies that are chatty at `info`; held at `warn` unless `RUST_LOG`
/// says otherwise.
const QUIET_TARGETS: &[&str] = &["sqlx", "tower_http", "hyper"];

/// Installs the global subscriber. `RUST_LOG` overrides `logging.level`.
/// JSON output flattens event fields and keeps the request span (`trace_id`,
/// `method`, `path`) on every line.
pub fn init_logging(config: &LoggingConfig) -> Result<(), AppError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(&config.level))
            .map_err(|e| AppError::Internal(format!("invalid log level {:?}: {e}", config.level)))?,
    };

    let output = if config.format == "json" {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed()
    } else {
        fmt::layer().pretty().with_target(true).boxed()
    };

    registry()
        .with(filter)
        .with(output)
        .try_init()
        .map_err(|e| AppError::Internal(format!("Failed to initialize logging: {e}")))?;

    tracing::info!(
        service = SERVICE_NAME,
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = %config.format,
        "logging initialised"
    );
    Ok(())
}

fn default_directives(level: &str) -> String {
    std::iter::once(level.to_string())
        .chain(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")))
        .collect::<Vec<_>>()
        .join(",")
}
