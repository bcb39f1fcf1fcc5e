//! HTTP layer of the named queries service
//!
//! - `rest`: router and handlers for `/api/queries` and `/health`
//! - `error`: mapping of failures to status codes and JSON bodies
//! - `server`: listener lifecycle with graceful shutdown
//! - `logging`: tracing subscriber setup

pub mod error;
pub mod logging;
pub mod rest;
pub mod server;
pub mod state;

use thiserror::Error;

pub use error::ApiError;
pub use rest::{RouterOptions, create_router, create_router_with_options};
pub use state::AppState;

/// Startup and serving failures
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] nq_core::QueryError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
