//! Tracing subscriber setup
//!
//! `RUST_LOG` controls filtering (default `info,tower_http=debug`); the
//! output format comes from the server configuration.

use nq_core::LogFormat;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,tower_http=debug";

pub fn init_logging(format: LogFormat) -> Result<(), crate::ServerError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| crate::ServerError::Logging(e.to_string()))
}
