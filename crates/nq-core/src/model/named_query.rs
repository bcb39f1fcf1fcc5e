//! Named query records
//!
//! - NamedQuery: a stored record with id and timestamps
//! - NamedQueryDraft: a validated record that has not been stored yet
//! - QueryPatch: validated field changes for an existing record
//! - QuerySummary: reduced projection used by listings

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::metadata::{DefaultView, QueryMetadata};

/// One opaque pipeline stage, stored verbatim
pub type PipelineStage = serde_json::Map<String, Value>;

/// Current time truncated to the store's millisecond precision
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A stored named query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedQuery {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub pipeline: Vec<PipelineStage>,
    #[serde(default)]
    pub metadata: QueryMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NamedQuery {
    /// Build a stored record from a draft, stamping both timestamps with `now`
    pub fn from_draft(id: impl Into<String>, draft: NamedQueryDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: draft.name,
            description: draft.description,
            tags: draft.tags,
            categories: draft.categories,
            pipeline: draft.pipeline,
            metadata: draft.metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether any of `values` appears in `tags`
    pub fn has_any_tag(&self, values: &[String]) -> bool {
        self.tags.iter().any(|tag| values.contains(tag))
    }

    /// Whether any of `values` appears in `categories`
    pub fn has_any_category(&self, values: &[String]) -> bool {
        self.categories
            .iter()
            .any(|category| values.contains(category))
    }
}

/// A validated named query that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NamedQueryDraft {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub pipeline: Vec<PipelineStage>,
    pub metadata: QueryMetadata,
}

impl NamedQueryDraft {
    /// Create a draft with empty tags, categories and metadata
    pub fn new(name: impl Into<String>, pipeline: Vec<PipelineStage>) -> Self {
        Self {
            name: name.into(),
            description: None,
            tags: Vec::new(),
            categories: Vec::new(),
            pipeline,
            metadata: QueryMetadata::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: QueryMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Validated changes to apply to an existing record.
///
/// `None` leaves a field untouched. `description: Some(None)` clears the
/// description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub pipeline: Option<Vec<PipelineStage>>,
    pub metadata: Option<QueryMetadata>,
}

impl QueryPatch {
    /// True when the patch changes no field
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.categories.is_none()
            && self.pipeline.is_none()
            && self.metadata.is_none()
    }

    /// Merge the provided fields into `record` and refresh `updated_at`
    pub fn apply_to(self, record: &mut NamedQuery, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(tags) = self.tags {
            record.tags = tags;
        }
        if let Some(categories) = self.categories {
            record.categories = categories;
        }
        if let Some(pipeline) = self.pipeline {
            record.pipeline = pipeline;
        }
        if let Some(metadata) = self.metadata {
            record.metadata = metadata;
        }
        record.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryVisualization {
    pub default_view: DefaultView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    pub visualization: SummaryVisualization,
}

/// Listing projection of a named query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub metadata: SummaryMetadata,
    pub created_at: DateTime<Utc>,
}

impl From<&NamedQuery> for QuerySummary {
    fn from(query: &NamedQuery) -> Self {
        Self {
            id: query.id.clone(),
            name: query.name.clone(),
            description: query.description.clone(),
            tags: query.tags.clone(),
            categories: query.categories.clone(),
            metadata: SummaryMetadata {
                visualization: SummaryVisualization {
                    default_view: query.metadata.visualization.default_view,
                },
            },
            created_at: query.created_at,
        }
    }
}
