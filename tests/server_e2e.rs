//! End-to-end tests: configuration, file-backed store and a live listener.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

use nq_core::{ServerConfig, StoreKind};
use nq_server::rest::create_router;
use nq_server::server;
use nq_server::state::AppState;

fn file_config(dir: &TempDir) -> ServerConfig {
    let url = format!("file://{}", dir.path().join("namedqueries.json").display());
    let vars = HashMap::from([
        ("HOST".to_string(), "127.0.0.1".to_string()),
        ("DATABASE_URL".to_string(), url),
    ]);
    ServerConfig::from_vars(vars).expect("config")
}

async fn send(router: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let req = match body {
        Some(val) => builder.body(Body::from(val.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn file_store_keeps_queries_across_restarts() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);

    let store = nq_core::connect(&config.database_url).await.unwrap();
    assert_eq!(store.kind(), StoreKind::File);
    let router = create_router(Arc::new(AppState::new(store.clone())));

    let (status, created) = send(
        &router,
        Method::POST,
        "/api/queries",
        Some(json!({
            "name": "Open tickets",
            "tags": ["support"],
            "pipeline": [{"$match": {"state": "open"}}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    store.close().await.unwrap();

    let reopened = nq_core::connect(&config.database_url).await.unwrap();
    let router = create_router(Arc::new(AppState::new(reopened)));

    let (status, list) = send(&router, Method::GET, "/api/queries?tags=support", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);
    assert_eq!(list["data"][0]["_id"], created["_id"]);

    let uri = format!("/api/queries/{}", created["_id"].as_str().unwrap());
    let (status, fetched) = send(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn live_server_answers_and_closes_store_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);
    let store = nq_core::connect(&config.database_url).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_store = store.clone();
    let handle = tokio::spawn(async move {
        server::serve(listener, &config, server_store, async {
            let _ = shutdown_rx.await;
        })
        .await
    });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"), "unexpected response: {response}");
    assert!(response.contains(r#""status":"OK""#));

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert!(store.ping().await.is_err(), "store must be closed after shutdown");
}

#[test]
fn invalid_database_url_is_a_config_error() {
    let vars = HashMap::from([("DATABASE_URL".to_string(), "mongodb://localhost".to_string())]);
    assert!(ServerConfig::from_vars(vars).is_err());
}
