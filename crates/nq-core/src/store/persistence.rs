//! Where a collection lives between process restarts

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::collection::Collection;
use crate::error::QueryResult;
use crate::model::NamedQuery;

/// On-disk layout of a persisted collection
#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    collection: String,
    documents: Vec<NamedQuery>,
}

#[async_trait]
pub trait Persistence: Send + Sync {
    /// Load the stored collection, empty when nothing was saved yet
    async fn load(&self) -> QueryResult<Collection>;

    /// Save the whole collection
    async fn save(&self, collection: &Collection) -> QueryResult<()>;
}

/// Nothing outlives the process
pub struct Volatile;

#[async_trait]
impl Persistence for Volatile {
    async fn load(&self) -> QueryResult<Collection> {
        Ok(Collection::new())
    }

    async fn save(&self, _collection: &Collection) -> QueryResult<()> {
        Ok(())
    }
}

/// Collection stored as one JSON document file
pub struct JsonFile {
    path: PathBuf,
    collection_name: String,
}

impl JsonFile {
    pub(crate) fn new(path: impl Into<PathBuf>, collection_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            collection_name: collection_name.into(),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl Persistence for JsonFile {
    async fn load(&self) -> QueryResult<Collection> {
        if !fs::try_exists(&self.path).await? {
            debug!("No collection file at {:?}, starting empty", self.path);
            return Ok(Collection::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        let file: CollectionFile = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} documents from {:?}",
            file.documents.len(),
            self.path
        );
        Collection::from_records(file.documents)
    }

    /// Writes to a sibling temp file first and renames it over the target
    async fn save(&self, collection: &Collection) -> QueryResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = CollectionFile {
            collection: self.collection_name.clone(),
            documents: collection.records().cloned().collect(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        let temp = self.temp_path();
        fs::write(&temp, content).await?;
        fs::rename(&temp, &self.path).await?;
        debug!("Saved {} documents to {:?}", collection.len(), self.path);
        Ok(())
    }
}
