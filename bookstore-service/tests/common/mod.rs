#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bookstore_service::config::BookstoreConfig;
use bookstore_service::services::{BookStore, InMemoryBookStore, UpdateOutcome};
use bookstore_service::startup::{build_router, AppState, Application};
use mongodb::bson::{oid::ObjectId, Document};
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tower::ServiceExt;

/// Configuration for tests: in-memory store, loopback, random port.
pub fn test_config() -> BookstoreConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("ENVIRONMENT", "dev"),
        ("STORE_BACKEND", "memory"),
        ("LOG_LEVEL", "debug"),
    ]);

    let common = CoreConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
    };

    BookstoreConfig::from_lookup(common, move |key: &str| {
        vars.get(key).map(|v| v.to_string())
    })
    .expect("Failed to build test configuration")
}

pub fn memory_router() -> Router {
    router_with(Arc::new(InMemoryBookStore::new()))
}

pub fn router_with(store: Arc<dyn BookStore>) -> Router {
    build_router(AppState::new(test_config(), store))
}

/// A store whose every call fails the way an unreachable database does.
pub struct FailingStore;

fn unreachable_db() -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("connection refused"))
}

#[async_trait]
impl BookStore for FailingStore {
    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        Err(unreachable_db())
    }

    async fn find_by_id(&self, _id: ObjectId) -> Result<Option<Document>, AppError> {
        Err(unreachable_db())
    }

    async fn insert(&self, _book: Document) -> Result<ObjectId, AppError> {
        Err(unreachable_db())
    }

    async fn update_fields(
        &self,
        _id: ObjectId,
        _fields: Document,
    ) -> Result<UpdateOutcome, AppError> {
        Err(unreachable_db())
    }

    async fn delete_by_id(&self, _id: ObjectId) -> Result<u64, AppError> {
        Err(unreachable_db())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(unreachable_db())
    }
}

/// Send one request through the router and decode the JSON response.
/// Non-JSON bodies decode to `Value::Null`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("Failed to build request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<dyn BookStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store: Arc<dyn BookStore> = Arc::new(InMemoryBookStore::new());

        let app = Application::build_with_store(test_config(), store.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            store,
        }
    }
}
