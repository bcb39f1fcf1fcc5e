use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, RawQuery, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use nq_core::{NamedQuery, QueryError, QueryFilter, QuerySummary, validate_new, validate_patch};

use super::params::parse_list_params;
use crate::error::ApiError;
use crate::state::AppState;

pub const DELETED_MESSAGE: &str = "Query deleted successfully";

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub data: Vec<QuerySummary>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/queries
pub async fn list_queries(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> Result<Json<ListResponse>, ApiError> {
    let params = parse_list_params(raw.as_deref());
    let filter = QueryFilter::from_params(&params)?;

    let data: Vec<QuerySummary> = state
        .store
        .find(&filter)
        .await?
        .iter()
        .map(QuerySummary::from)
        .collect();

    Ok(Json(ListResponse {
        count: data.len(),
        data,
    }))
}

/// GET /api/queries/:id
pub async fn get_query(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NamedQuery>, ApiError> {
    match state.store.find_by_id(&id).await? {
        Some(query) => Ok(Json(query)),
        None => Err(QueryError::not_found(id).into()),
    }
}

/// POST /api/queries
pub async fn create_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<NamedQuery>), ApiError> {
    let Json(body) = payload?;
    let draft = validate_new(body)?;
    let created = state.store.insert(draft).await?;
    tracing::info!(id = %created.id, name = %created.name, "created query");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/queries/:id
pub async fn update_query(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<NamedQuery>, ApiError> {
    let Json(body) = payload?;
    let patch = match validate_patch(body) {
        Ok(patch) => patch,
        // an unknown id is reported as such even when the body is invalid
        Err(err) => match state.store.find_by_id(&id).await? {
            Some(_) => return Err(err.into()),
            None => return Err(QueryError::not_found(id).into()),
        },
    };
    match state.store.update(&id, patch).await? {
        Some(updated) => {
            tracing::info!(id = %updated.id, "updated query");
            Ok(Json(updated))
        }
        None => Err(QueryError::not_found(id).into()),
    }
}

/// DELETE /api/queries/:id
pub async fn delete_query(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.store.delete(&id).await? {
        Some(deleted) => {
            tracing::info!(id = %deleted.id, name = %deleted.name, "deleted query");
            Ok(Json(MessageResponse {
                message: DELETED_MESSAGE.to_string(),
            }))
        }
        None => Err(QueryError::not_found(id).into()),
    }
}
