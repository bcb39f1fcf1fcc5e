//! Write-time validation of named query bodies
//!
//! Request bodies arrive as raw JSON. Every known top-level field is checked
//! by the same per-field rule for both creates and updates, so a patch merged
//! into a valid record always yields a valid record. Unknown fields and the
//! store-managed fields (`_id`, `createdAt`, `updatedAt`) are dropped.
//!
//! All problems found in one body are reported together as a single
//! [`QueryError::Validation`].

use serde_json::{Map, Value};
use std::fmt;

use crate::error::{QueryError, QueryResult};
use crate::model::{NamedQueryDraft, PipelineStage, QueryMetadata, QueryPatch};

/// Problems found while validating one body
#[derive(Debug, Default)]
struct Violations {
    entries: Vec<(String, String)>,
}

impl Violations {
    fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.entries.push((field.into(), message.into()));
    }

    /// Keep the value on success, record the failure otherwise
    fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    fn into_result(self) -> QueryResult<()> {
        if self.entries.is_empty() {
            Ok(())
        } else {
            Err(QueryError::validation(self.to_string()))
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn into_object(body: Value) -> QueryResult<Map<String, Value>> {
    match body {
        Value::Object(object) => Ok(object),
        other => Err(QueryError::validation(format!(
            "request body must be an object, got {}",
            type_name(&other)
        ))),
    }
}

fn parse_name(value: Value) -> Result<String, String> {
    match value {
        Value::Null => Err("Field is required".to_string()),
        Value::String(name) if name.is_empty() => Err("Field is required".to_string()),
        Value::String(name) => Ok(name),
        // scalars are cast to their string form
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(format!("Expected string, got {}", type_name(&other))),
    }
}

fn parse_description(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(description) => Ok(Some(description)),
        other => Err(format!("Expected string, got {}", type_name(&other))),
    }
}

/// A single string is accepted as a one-element list.
fn parse_string_list(value: Value) -> Result<Vec<String>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(item) => Ok(vec![item]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(item) => Ok(item),
                other => Err(format!(
                    "item {} expected string, got {}",
                    index,
                    type_name(&other)
                )),
            })
            .collect(),
        other => Err(format!("Expected array, got {}", type_name(&other))),
    }
}

/// Stages are opaque objects; a single object is accepted as a one-stage
/// pipeline. An empty pipeline is allowed.
fn parse_pipeline(value: Value) -> Result<Vec<PipelineStage>, String> {
    match value {
        Value::Null => Err("Field is required".to_string()),
        Value::Object(stage) => Ok(vec![stage]),
        Value::Array(stages) => stages
            .into_iter()
            .enumerate()
            .map(|(index, stage)| match stage {
                Value::Object(stage) => Ok(stage),
                other => Err(format!(
                    "stage {} expected object, got {}",
                    index,
                    type_name(&other)
                )),
            })
            .collect(),
        other => Err(format!("Expected array, got {}", type_name(&other))),
    }
}

fn parse_metadata(value: Value) -> Result<QueryMetadata, String> {
    if value.is_null() {
        return Ok(QueryMetadata::default());
    }

    let metadata: QueryMetadata = serde_json::from_value(value).map_err(|e| e.to_string())?;

    if let Some(index) = metadata.columns.iter().position(|c| c.name.is_empty()) {
        return Err(format!("columns.{}.name: Field is required", index));
    }
    if let Some(index) = metadata.filters.iter().position(|f| f.field.is_empty()) {
        return Err(format!("filters.{}.field: Field is required", index));
    }

    Ok(metadata)
}

/// Parse every known field present in `object` into a patch
fn parse_fields(object: Map<String, Value>, violations: &mut Violations) -> QueryPatch {
    let mut patch = QueryPatch::default();

    for (key, value) in object {
        match key.as_str() {
            "name" => patch.name = violations.check("name", parse_name(value)),
            "description" => {
                patch.description = violations.check("description", parse_description(value))
            }
            "tags" => patch.tags = violations.check("tags", parse_string_list(value)),
            "categories" => {
                patch.categories = violations.check("categories", parse_string_list(value))
            }
            "pipeline" => patch.pipeline = violations.check("pipeline", parse_pipeline(value)),
            "metadata" => patch.metadata = violations.check("metadata", parse_metadata(value)),
            _ => {}
        }
    }

    patch
}

/// Validate a create body and normalize it into a draft
pub fn validate_new(body: Value) -> QueryResult<NamedQueryDraft> {
    let object = into_object(body)?;
    let mut violations = Violations::default();

    let has_name = object.contains_key("name");
    let has_pipeline = object.contains_key("pipeline");
    let patch = parse_fields(object, &mut violations);

    if !has_name {
        violations.add("name", "Field is required");
    }
    if !has_pipeline {
        violations.add("pipeline", "Field is required");
    }
    violations.into_result()?;

    match (patch.name, patch.pipeline) {
        (Some(name), Some(pipeline)) => Ok(NamedQueryDraft {
            name,
            description: patch.description.flatten(),
            tags: patch.tags.unwrap_or_default(),
            categories: patch.categories.unwrap_or_default(),
            pipeline,
            metadata: patch.metadata.unwrap_or_default(),
        }),
        _ => Err(QueryError::validation("name and pipeline are required")),
    }
}

/// Validate an update body into a patch.
///
/// Fields that are absent stay untouched; `name` and `pipeline` may be
/// changed but never removed.
pub fn validate_patch(body: Value) -> QueryResult<QueryPatch> {
    let object = into_object(body)?;
    let mut violations = Violations::default();
    let patch = parse_fields(object, &mut violations);
    violations.into_result()?;
    Ok(patch)
}
