//! Named queries server
//!
//! Serves CRUD endpoints for saved aggregation pipelines under
//! `/api/queries`. Settings come from the environment (a `.env` file is
//! loaded first when present):
//!
//! - `HOST` / `PORT`: listen address, default `0.0.0.0:4000`
//! - `DATABASE_URL`: `memory://` or `file://<path>`
//! - `LOG_FORMAT`: `pretty`, `compact` or `json`
//! - `BODY_LIMIT`: maximum request body in bytes
//! - `CORS_ORIGINS`: comma separated allow list, empty allows any origin

use anyhow::Context;
use nq_core::ServerConfig;
use nq_server::{logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    logging::init_logging(config.log_format)?;

    let store = nq_core::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open store at {}", config.database_url))?;
    tracing::info!(store = %store.kind(), "Connected to document store");

    server::run(&config, store).await?;
    Ok(())
}
