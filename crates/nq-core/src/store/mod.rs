//! Document store for named queries
//!
//! The route layer only sees the [`QueryStore`] trait. Two backends are
//! provided, both built on the same indexed collection:
//!
//! - `memory://` keeps the collection in process memory
//! - `file://<path>` also writes the collection to a JSON file after every
//!   mutation and reloads it on connect
//!
//! # Example
//! ```ignore
//! let store = connect("file://data/named-queries.json").await?;
//! let created = store.insert(draft).await?;
//! ```

mod collection;
mod persistence;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};
use crate::filter::QueryFilter;
use crate::model::{NamedQuery, NamedQueryDraft, QueryPatch, now_millis};
use collection::Collection;
use persistence::{JsonFile, Persistence, Volatile};

/// Name of the collection holding named queries
pub const COLLECTION_NAME: &str = "namedqueries";

/// Store backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    File,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Parsed store connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl FromStr for StoreLocation {
    type Err = QueryError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let url = url.trim();
        if url == "memory" || url.starts_with("memory:") {
            return Ok(Self::Memory);
        }
        if let Some(path) = url
            .strip_prefix("file://")
            .or_else(|| url.strip_prefix("file:"))
        {
            if path.is_empty() {
                return Err(QueryError::store("file connection string needs a path"));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        Err(QueryError::store(format!(
            "unsupported connection string '{}', expected memory:// or file://<path>",
            url
        )))
    }
}

/// Named query store
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Backend type
    fn kind(&self) -> StoreKind;

    /// Make sure the name/tags/categories indexes exist and hold
    async fn ensure_indexes(&self) -> QueryResult<()>;

    /// Records matching the filter, newest first
    async fn find(&self, filter: &QueryFilter) -> QueryResult<Vec<NamedQuery>>;

    /// Record with the given id
    async fn find_by_id(&self, id: &str) -> QueryResult<Option<NamedQuery>>;

    /// Store a new record, assigning id and timestamps
    async fn insert(&self, draft: NamedQueryDraft) -> QueryResult<NamedQuery>;

    /// Merge the patch into the record; `None` when the id is unknown
    async fn update(&self, id: &str, patch: QueryPatch) -> QueryResult<Option<NamedQuery>>;

    /// Remove the record; `None` when the id is unknown
    async fn delete(&self, id: &str) -> QueryResult<Option<NamedQuery>>;

    /// Number of stored records
    async fn count(&self) -> QueryResult<usize>;

    /// Check the store is usable
    async fn ping(&self) -> QueryResult<()>;

    /// Flush and disconnect
    async fn close(&self) -> QueryResult<()>;
}

/// Shared store handle injected into the HTTP layer
pub type SharedQueryStore = Arc<dyn QueryStore>;

/// Collection-backed store with pluggable persistence
pub struct DocumentStore<P> {
    kind: StoreKind,
    collection: RwLock<Collection>,
    persistence: P,
    connected: AtomicBool,
}

/// Process-local store
pub type MemoryStore = DocumentStore<Volatile>;

/// Store persisted to a JSON file
pub type FileStore = DocumentStore<JsonFile>;

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            kind: StoreKind::Memory,
            collection: RwLock::new(Collection::new()),
            persistence: Volatile,
            connected: AtomicBool::new(true),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore {
    /// Open the file store, loading any previously saved collection
    pub async fn open(path: impl Into<PathBuf>) -> QueryResult<Self> {
        let persistence = JsonFile::new(path, COLLECTION_NAME);
        let collection = persistence.load().await?;
        info!(
            "Opened file store at {:?} with {} documents",
            persistence.path(),
            collection.len()
        );
        Ok(Self {
            kind: StoreKind::File,
            collection: RwLock::new(collection),
            persistence,
            connected: AtomicBool::new(true),
        })
    }
}

impl<P: Persistence> DocumentStore<P> {
    fn check_connected(&self) -> QueryResult<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(QueryError::store("Not connected"))
        }
    }
}

#[async_trait]
impl<P: Persistence> QueryStore for DocumentStore<P> {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    async fn ensure_indexes(&self) -> QueryResult<()> {
        self.check_connected()?;
        let mut collection = self.collection.write().await;
        collection.rebuild_indexes()?;
        info!(
            "Indexes ready on {}: name (unique), tags, categories",
            COLLECTION_NAME
        );
        Ok(())
    }

    async fn find(&self, filter: &QueryFilter) -> QueryResult<Vec<NamedQuery>> {
        self.check_connected()?;
        let collection = self.collection.read().await;
        let found = collection.find(filter);
        debug!(
            "find {} matched {} documents",
            filter.to_document(),
            found.len()
        );
        Ok(found)
    }

    async fn find_by_id(&self, id: &str) -> QueryResult<Option<NamedQuery>> {
        self.check_connected()?;
        Ok(self.collection.read().await.get(id).cloned())
    }

    async fn insert(&self, draft: NamedQueryDraft) -> QueryResult<NamedQuery> {
        self.check_connected()?;
        let mut collection = self.collection.write().await;
        let record = collection.insert(Uuid::new_v4().to_string(), draft, now_millis())?;
        if let Err(e) = self.persistence.save(&collection).await {
            collection.remove(&record.id);
            return Err(e);
        }
        debug!("Inserted query {} ({})", record.id, record.name);
        Ok(record)
    }

    async fn update(&self, id: &str, patch: QueryPatch) -> QueryResult<Option<NamedQuery>> {
        self.check_connected()?;
        let mut collection = self.collection.write().await;
        let Some(previous) = collection.get(id).cloned() else {
            return Ok(None);
        };
        let updated = collection.update(id, patch, now_millis())?;
        if let Err(e) = self.persistence.save(&collection).await {
            collection.replace(previous);
            return Err(e);
        }
        debug!("Updated query {}", id);
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> QueryResult<Option<NamedQuery>> {
        self.check_connected()?;
        let mut collection = self.collection.write().await;
        let Some((seq, removed)) = collection.take(id) else {
            return Ok(None);
        };
        if let Err(e) = self.persistence.save(&collection).await {
            collection.restore(seq, removed);
            return Err(e);
        }
        debug!("Deleted query {}", id);
        Ok(Some(removed))
    }

    async fn count(&self) -> QueryResult<usize> {
        self.check_connected()?;
        Ok(self.collection.read().await.len())
    }

    async fn ping(&self) -> QueryResult<()> {
        self.check_connected()
    }

    async fn close(&self) -> QueryResult<()> {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let collection = self.collection.read().await;
        self.persistence.save(&collection).await?;
        info!("Closed {} store", self.kind);
        Ok(())
    }
}

/// Connect to the store named by `url` and ensure its indexes
pub async fn connect(url: &str) -> QueryResult<SharedQueryStore> {
    let store: SharedQueryStore = match url.parse::<StoreLocation>()? {
        StoreLocation::Memory => Arc::new(MemoryStore::new()),
        StoreLocation::File(path) => Arc::new(FileStore::open(path).await?),
    };
    store.ensure_indexes().await?;
    info!("Connected to {} store", store.kind());
    Ok(store)
}
