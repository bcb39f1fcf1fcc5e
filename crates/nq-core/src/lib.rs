//! Core of the named queries service
//!
//! This crate provides everything below the HTTP layer:
//! - The named query data model and its display metadata
//! - Write-time validation of request bodies
//! - Filter expressions for listings
//! - The document store trait and its memory/file backends
//! - Environment-based configuration

pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod store;
pub mod validation;

pub use config::{ConfigError, LogFormat, ServerConfig};
pub use error::{QueryError, QueryResult};
pub use filter::{ListParams, QueryFilter};
pub use model::{NamedQuery, NamedQueryDraft, QueryPatch, QuerySummary};
pub use store::{
    FileStore, MemoryStore, QueryStore, SharedQueryStore, StoreKind, StoreLocation, connect,
};
pub use validation::{validate_new, validate_patch};
