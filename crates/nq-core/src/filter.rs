//! Filter expressions for listing named queries
//!
//! [`ListParams`] holds the optional request parameters; [`QueryFilter`] is
//! the store-level expression built from them. Conditions are combined with
//! AND, an empty filter matches every record.

use regex::{Regex, RegexBuilder};
use serde_json::{Value, json};

use crate::error::{QueryError, QueryResult};
use crate::model::NamedQuery;

/// Optional listing parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

/// Indexed list fields that can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Tags,
    Categories,
}

impl ListField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tags => "tags",
            Self::Categories => "categories",
        }
    }
}

/// Case-insensitive literal substring search
#[derive(Debug, Clone)]
pub struct TextSearch {
    text: String,
    pattern: Regex,
}

impl TextSearch {
    pub fn new(text: impl Into<String>) -> QueryResult<Self> {
        let text = text.into();
        let pattern = RegexBuilder::new(&regex::escape(&text))
            .case_insensitive(true)
            .build()
            .map_err(|e| QueryError::store(format!("invalid search pattern: {}", e)))?;
        Ok(Self { text, pattern })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.pattern.is_match(haystack)
    }
}

/// One condition of a filter expression
#[derive(Debug, Clone)]
pub enum Condition {
    /// The list field contains at least one of the values
    AnyOf { field: ListField, values: Vec<String> },
    /// `name` or `description` contains the text
    Search(TextSearch),
}

impl Condition {
    pub fn matches(&self, query: &NamedQuery) -> bool {
        match self {
            Self::AnyOf {
                field: ListField::Tags,
                values,
            } => query.has_any_tag(values),
            Self::AnyOf {
                field: ListField::Categories,
                values,
            } => query.has_any_category(values),
            Self::Search(search) => {
                search.is_match(&query.name)
                    || query
                        .description
                        .as_deref()
                        .is_some_and(|description| search.is_match(description))
            }
        }
    }
}

/// Conjunction of conditions
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    conditions: Vec<Condition>,
}

impl QueryFilter {
    /// Filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Build the filter for a listing request.
    ///
    /// Empty strings are treated as absent parameters.
    pub fn from_params(params: &ListParams) -> QueryResult<Self> {
        let mut filter = Self::all();

        let tags = non_empty(&params.tags);
        if !tags.is_empty() {
            filter = filter.and(Condition::AnyOf {
                field: ListField::Tags,
                values: tags,
            });
        }

        let categories = non_empty(&params.categories);
        if !categories.is_empty() {
            filter = filter.and(Condition::AnyOf {
                field: ListField::Categories,
                values: categories,
            });
        }

        if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
            filter = filter.and(Condition::Search(TextSearch::new(search)?));
        }

        Ok(filter)
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, query: &NamedQuery) -> bool {
        self.conditions.iter().all(|condition| condition.matches(query))
    }

    /// Render as a Mongo-style filter document
    pub fn to_document(&self) -> Value {
        let mut document = serde_json::Map::new();
        for condition in &self.conditions {
            match condition {
                Condition::AnyOf { field, values } => {
                    document.insert(field.as_str().to_string(), json!({ "$in": values }));
                }
                Condition::Search(search) => {
                    let pattern = regex::escape(search.text());
                    document.insert(
                        "$or".to_string(),
                        json!([
                            { "name": { "$regex": pattern, "$options": "i" } },
                            { "description": { "$regex": pattern, "$options": "i" } }
                        ]),
                    );
                }
            }
        }
        Value::Object(document)
    }
}

fn non_empty(values: &[String]) -> Vec<String> {
    values.iter().filter(|v| !v.is_empty()).cloned().collect()
}
