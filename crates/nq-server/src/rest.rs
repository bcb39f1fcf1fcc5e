use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS},
    },
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use nq_core::ServerConfig;

use crate::state::AppState;

#[path = "rest/params.rs"]
mod params;
#[path = "rest/queries.rs"]
pub mod queries;
use queries::{create_query, delete_query, get_query, list_queries, update_query};

/// Router settings taken from the server configuration
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub body_limit: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        let config = ServerConfig::default();
        Self::from(&config)
    }
}

impl From<&ServerConfig> for RouterOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            body_limit: config.body_limit,
            cors_allowed_origins: config.cors_origins.clone(),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    create_router_with_options(state, &RouterOptions::default())
}

pub fn create_router_with_options(state: Arc<AppState>, options: &RouterOptions) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/queries", get(list_queries).post(create_query))
        .route(
            "/api/queries/:id",
            get(get_query).put(update_query).delete(delete_query),
        )
        .layer(DefaultBodyLimit::max(options.body_limit))
        .layer(build_cors_layer(&options.cors_allowed_origins))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(cors_allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE]);

    if cors_allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let mut parsed = Vec::new();
    for origin in cors_allowed_origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => parsed.push(value),
            Err(err) => tracing::warn!("ignoring invalid CORS origin '{origin}': {err}"),
        }
    }
    layer.allow_origin(parsed)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// GET /health, answered without touching the store
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use mockall::mock;
    use nq_core::{
        NamedQuery, NamedQueryDraft, QueryError, QueryFilter, QueryPatch, QueryResult, QueryStore,
        StoreKind,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    mock! {
        pub Store {}

        #[async_trait]
        impl QueryStore for Store {
            fn kind(&self) -> StoreKind;
            async fn ensure_indexes(&self) -> QueryResult<()>;
            async fn find(&self, filter: &QueryFilter) -> QueryResult<Vec<NamedQuery>>;
            async fn find_by_id(&self, id: &str) -> QueryResult<Option<NamedQuery>>;
            async fn insert(&self, draft: NamedQueryDraft) -> QueryResult<NamedQuery>;
            async fn update(&self, id: &str, patch: QueryPatch) -> QueryResult<Option<NamedQuery>>;
            async fn delete(&self, id: &str) -> QueryResult<Option<NamedQuery>>;
            async fn count(&self) -> QueryResult<usize>;
            async fn ping(&self) -> QueryResult<()>;
            async fn close(&self) -> QueryResult<()>;
        }
    }

    fn router_with(store: MockStore) -> Router {
        create_router(Arc::new(AppState::new(Arc::new(store))))
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => builder.body(Body::from(body.to_string())).expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        let response = router.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn list_store_failure_returns_500_with_message() {
        let mut store = MockStore::new();
        store
            .expect_find()
            .times(1)
            .returning(|_| Err(QueryError::store("connection reset")));

        let (status, body) = send(router_with(store), "GET", "/api/queries", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["message"].as_str().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn list_passes_tag_filter_to_store() {
        let mut store = MockStore::new();
        store
            .expect_find()
            .withf(|filter: &QueryFilter| {
                filter.to_document() == serde_json::json!({"tags": {"$in": ["ops"]}})
            })
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let (status, body) = send(router_with(store), "GET", "/api/queries?tags=ops", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn create_does_not_reach_store_when_body_is_invalid() {
        let mut store = MockStore::new();
        store.expect_insert().never();

        let (status, body) = send(
            router_with(store),
            "POST",
            "/api/queries",
            Some(r#"{"pipeline": []}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["message"].as_str().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn update_with_invalid_body_on_unknown_id_returns_404() {
        let mut store = MockStore::new();
        store.expect_find_by_id().times(1).returning(|_| Ok(None));
        store.expect_update().never();

        let (status, body) = send(
            router_with(store),
            "PUT",
            "/api/queries/missing",
            Some(r#"{"pipeline": 42}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Query not found");
    }

    #[tokio::test]
    async fn delete_store_failure_returns_500() {
        let mut store = MockStore::new();
        store
            .expect_delete()
            .times(1)
            .returning(|_| Err(QueryError::store("disk full")));

        let (status, _) = send(router_with(store), "DELETE", "/api/queries/abc", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_does_not_touch_store() {
        let store = MockStore::new();
        let (status, body) = send(router_with(store), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn cors_allow_list_echoes_only_listed_origins() {
        let options = RouterOptions {
            cors_allowed_origins: vec!["http://dashboard.local".to_string()],
            ..RouterOptions::default()
        };
        let router =
            create_router_with_options(Arc::new(AppState::new(Arc::new(MockStore::new()))), &options);

        let request = |origin: &str| {
            Request::builder()
                .method("GET")
                .uri("/health")
                .header("origin", origin)
                .body(Body::empty())
                .expect("request")
        };

        let allowed = router
            .clone()
            .oneshot(request("http://dashboard.local"))
            .await
            .expect("response");
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(
            allowed.headers()["access-control-allow-origin"],
            "http://dashboard.local"
        );

        let denied = router
            .oneshot(request("http://evil.example"))
            .await
            .expect("response");
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }
}
